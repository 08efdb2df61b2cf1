//! SearXNG-Gateway: a failover and caching HTTP wrapper for SearXNG
//!
//! This is the main entry point for the application.

use anyhow::{Context, Result};
use searxng_gateway::{
    config,
    network::BackendClient,
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let (settings, source) = config::load()?;

    // Initialize logging
    let default_level = if settings.general.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    info!("Starting SearXNG-Gateway v{}", searxng_gateway::VERSION);
    match source {
        Some(path) => info!("Loaded settings from: {}", path.display()),
        None => info!("No settings file found, using defaults"),
    }
    for endpoint in &settings.backend.endpoints {
        info!("Backend endpoint: {}", endpoint.url);
    }

    // Initialize HTTP client
    let client = BackendClient::with_settings(&settings.backend)?;

    let addr = SocketAddr::new(
        settings
            .server
            .bind_address
            .parse()
            .with_context(|| format!("invalid bind address: {}", settings.server.bind_address))?,
        settings.server.port,
    );

    let state = AppState::new(settings, client);
    info!("Result cache: {}", state.cache_mode());
    let app = create_router(state);

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
