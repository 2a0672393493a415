use axum::{
    Router,
    http::Method,
    middleware as axum_middleware,
    routing::{get, post, put},
};
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::cache::CacheManager;
use crate::notifications::service::DispatchService;
use crate::server::config::ServerConfig;

pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;

use routes::{account_routes, api_routes, destination_routes, template_routes};

/// Application state shared by every handler: store handle, cache handle,
/// dispatcher, and configuration, injected at construction.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub cache: Arc<CacheManager>,
    pub dispatch: Arc<DispatchService>,
    pub config: Arc<ServerConfig>,
}

async fn health_check_handler() -> &'static str {
    "OK"
}

pub fn build_router(state: Arc<AppState>) -> Router {
    // The dispatch endpoints authenticate in-handler because of the
    // token-in-body compatibility path; everything else goes through the
    // auth middleware layer.
    let protected = Router::new()
        .route("/api/token/generate", post(account_routes::generate_token))
        .route("/api/token/revoke", post(account_routes::revoke_token))
        .route("/api/template/{id}", get(api_routes::get_template_meta))
        .route("/api/copy_template/{id}", post(api_routes::copy_template))
        .route("/api/recent_logs", get(api_routes::recent_logs))
        .route("/api/stats", get(api_routes::stats))
        .route(
            "/api/destinations",
            get(destination_routes::list_destinations).post(destination_routes::create_destination),
        )
        .route(
            "/api/destinations/{id}",
            put(destination_routes::update_destination)
                .delete(destination_routes::delete_destination),
        )
        .route(
            "/api/destinations/{id}/test",
            post(destination_routes::test_destination),
        )
        .route(
            "/api/templates",
            get(template_routes::list_templates).post(template_routes::create_template),
        )
        .route(
            "/api/templates/{id}",
            put(template_routes::update_template).delete(template_routes::delete_template),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check_handler))
        .route("/api/auth/register", post(account_routes::register))
        .route("/api/send", post(api_routes::send))
        .route("/api/send_template", post(api_routes::send_template))
        .merge(protected)
        .with_state(state)
        .layer(cors)
}

pub async fn run_http_server(
    state: Arc<AppState>,
    http_addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app_router = build_router(state);

    info!("HTTP server listening on {http_addr}");
    let listener = tokio::net::TcpListener::bind(http_addr).await?;
    axum::serve(listener, app_router).await?;
    Ok(())
}
