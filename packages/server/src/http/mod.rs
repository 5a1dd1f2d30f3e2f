//! HTTP surface
//!
//! # Architecture
//!
//! - `node_endpoints`: node CRUD and re-parenting routes under `/api/v1`
//! - `rate_limiter`: per-client fixed-window limit, applied to every route
//! - `http_error`: the shared JSON error body and status mapping
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin orgtree-server
//! ```

use axum::{
    http::{HeaderValue, Method},
    middleware, Router,
};
use orgtree_core::cache::InMemoryCacheStore;
use orgtree_core::db::SqliteHierarchyStore;
use orgtree_core::{ColorPool, ForestCache, NodeService};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

mod http_error;
mod node_endpoints;
mod rate_limiter;

pub use http_error::HttpError;
pub use node_endpoints::{Envelope, NodeData, NodesData};
pub use rate_limiter::RateLimiter;

/// Application state shared across all endpoints
///
/// `NodeService` is cheap to clone and holds no locks, so handlers call it
/// directly and concurrent requests interleave freely.
#[derive(Clone)]
pub struct AppState {
    pub node_service: NodeService,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(node_service: NodeService, rate_limiter: RateLimiter) -> Self {
        Self {
            node_service,
            rate_limiter: Arc::new(rate_limiter),
        }
    }

    /// Open the store at the configured path and wire up the engine
    pub async fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let store = SqliteHierarchyStore::open(config.database_path.clone()).await?;
        let cache = ForestCache::with_ttl(Arc::new(InMemoryCacheStore::new()), config.cache_ttl);
        let node_service = NodeService::new(Arc::new(store), cache, Arc::new(ColorPool::default()));

        Ok(Self::new(
            node_service,
            RateLimiter::new(config.rate_limit_max, config.rate_limit_window),
        ))
    }
}

/// Create the application router
///
/// Layers run outside-in: tracing, CORS, then the rate limiter, so refused
/// requests are still traced and still carry CORS headers.
pub fn create_router(state: AppState, cors_origin: Option<HeaderValue>) -> Router {
    Router::new()
        .nest("/api/v1", node_endpoints::routes())
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limiter::enforce,
        ))
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> HttpError {
    HttpError::not_found()
}

/// CORS layer
///
/// Any origin unless `CORS_ALLOW_ORIGIN` names a single one.
fn cors_layer(origin: Option<HeaderValue>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
        .allow_credentials(false);

    match origin {
        Some(origin) => layer.allow_origin(origin),
        None => layer.allow_origin(Any),
    }
}

/// Start the HTTP server and serve until Ctrl-C
///
/// # Errors
///
/// Returns error if the store cannot be opened or the server fails to bind.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config).await?;
    let app = create_router(state, config.cors_allow_origin.clone());

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("OrgTree server listening on http://{}", addr);
    match &config.cors_allow_origin {
        Some(origin) => tracing::info!("CORS enabled for {:?}", origin),
        None => tracing::info!("CORS enabled for any origin"),
    }

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("OrgTree server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
