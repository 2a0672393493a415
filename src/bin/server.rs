use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use pushgate::cache::CacheManager;
use pushgate::notifications::service::DispatchService;
use pushgate::server::config::ServerConfig;
use pushgate::version;
use pushgate::web::{self, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv::dotenv().ok();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    let http_addr: SocketAddr = config.listen_addr.parse()?;

    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    let cache = Arc::new(if config.cache_enabled {
        CacheManager::new()
    } else {
        CacheManager::disabled()
    });
    if !cache.is_enabled() {
        warn!("caching disabled; auth and stats lookups go straight to the store");
    }

    let dispatch = Arc::new(DispatchService::new(
        db_pool.clone(),
        cache.clone(),
        Duration::from_secs(config.send_timeout_secs),
    ));

    let state = Arc::new(AppState {
        db_pool,
        cache,
        dispatch,
        config: Arc::new(config),
    });

    info!(version = version::VERSION, "pushgate starting");
    web::run_http_server(state, http_addr).await?;
    Ok(())
}
