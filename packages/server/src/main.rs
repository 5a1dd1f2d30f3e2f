//! OrgTree server binary
//!
//! # Usage
//!
//! ```bash
//! # Default settings (127.0.0.1:3001, ~/.orgtree/database/orgtree.db)
//! cargo run --bin orgtree-server
//!
//! # Custom port and database
//! ORGTREE_PORT=3002 ORGTREE_DB_PATH=/tmp/org.db cargo run --bin orgtree-server
//! ```
//!
//! # Environment Variables
//!
//! - `ORGTREE_BIND`, `ORGTREE_PORT`: listen address (default 127.0.0.1:3001)
//! - `ORGTREE_DB_PATH`: libsql database file
//! - `ORGTREE_CACHE_TTL_SECS`: forest snapshot lifetime (default 3600)
//! - `ORGTREE_RATE_LIMIT_MAX`, `ORGTREE_RATE_LIMIT_WINDOW_SECS`: per-IP limit (default 100 per 600s)
//! - `CORS_ALLOW_ORIGIN`: single allowed origin (default any)
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")

use orgtree_server::{http, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!("Database: {}", config.database_path.display());
    tracing::info!(
        "Rate limit: {} requests per {}s per client",
        config.rate_limit_max,
        config.rate_limit_window.as_secs()
    );

    http::start_server(config).await
}
