use std::env;

#[derive(Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub database_url: String,
    pub cache_enabled: bool,
    /// Per-destination send deadline in seconds.
    pub send_timeout_secs: u64,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let listen_addr =
            env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:5555".to_string());

        let cache_enabled = env::var("CACHE_ENABLED")
            .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "off"))
            .unwrap_or(true);

        let send_timeout_secs = env::var("SEND_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        Ok(ServerConfig {
            listen_addr,
            database_url,
            cache_enabled,
            send_timeout_secs,
        })
    }
}
