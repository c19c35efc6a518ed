//! ClawSearch-RS: a private meta-search API gateway
//!
//! This is the main entry point for the application.

use anyhow::Result;
use clawsearch::{
    config,
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    info!("Starting ClawSearch-RS v{}", clawsearch::VERSION);

    // Load configuration
    let settings = config::load()?;
    info!(
        "Upstream {} with {} known engines, cache TTL {}s, auth {}",
        settings.upstream.base_url,
        settings.upstream.engines.len(),
        settings.cache.ttl,
        if settings.auth.api_keys.is_empty() {
            "disabled"
        } else {
            "enabled"
        }
    );

    let addr = SocketAddr::new(
        settings.server.bind_address.parse()?,
        settings.server.port,
    );

    // Create application state
    let state = AppState::new(settings)?;
    let app = create_router(state);

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
