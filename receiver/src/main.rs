//! GrantSync Web Server - webhook receiver.
//!
//! This binary provides a thin, fast web server that:
//! - Receives webhook deliveries from the sync provider
//! - Verifies HMAC signatures over the raw request body
//! - Processes each delta batch with per-item failure isolation
//! - Mirrors resource changes into the main application's event cache

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use grantsync::process::BatchProcessor;
use grantsync::store::HttpEventStore;
use grantsync::web::{router, AppState};
use grantsync::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        webhook_secret_configured = config.webhook_secret.is_some(),
        main_app_url = %config.main_app_url,
        cache_ttl_hours = config.cache_ttl_hours,
        environment = %config.environment,
        "config_loaded"
    );

    // Create the event cache client
    let store = HttpEventStore::new(
        config.main_app_url.clone(),
        config.internal_api_key.clone(),
        Duration::from_millis(config.request_timeout_ms),
    )
    .context("Failed to create event cache client")?;

    let processor = BatchProcessor::new(Arc::new(store), config.cache_ttl_hours);

    // Create application state
    let state = AppState::new(config.clone(), processor);

    // Build the router; panics escaping a handler surface as 500s
    let app = router(state)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http());

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
