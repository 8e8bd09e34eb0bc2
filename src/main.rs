//! Pump Timer - per-device motor countdowns over HTTP
//!
//! This is the main entry point for the pump-timer server.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use pump_timer::{
    api::create_router,
    config::Config,
    services::{Backends, HttpNotifier, LogNotifier, MemoryStore, Notifier},
    state::AppState,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("pump_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting pump-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, namespace={}",
          config.host, config.port, config.topic_namespace);

    let notifier: Arc<dyn Notifier> = match &config.notify_url {
        Some(url) => {
            let notifier = HttpNotifier::new(url.clone(), config.notify_timeout())?;
            info!("Notifications go to {}", notifier.url());
            Arc::new(notifier)
        }
        None => {
            info!("No notify URL configured, notifications are only logged");
            Arc::new(LogNotifier)
        }
    };
    let backends = Backends::new(Arc::new(MemoryStore::new()), notifier, config.topic_namespace.as_str());

    // Create application state
    let state = Arc::new(AppState::new(config.port, config.host.clone(), backends));

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET    /devices                - List devices");
    info!("  POST   /devices                - Register a device");
    info!("  GET    /devices/:key           - Read a device");
    info!("  PATCH  /devices/:key           - Partial update, arms the timer");
    info!("  DELETE /devices/:key           - Delete a device and its timer");
    info!("  POST   /devices/:key/heartbeat - Record a heartbeat");
    info!("  GET    /devices/:key/timer     - Live countdown state");
    info!("  GET    /status                 - Server status");
    info!("  GET    /health                 - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.shutdown();
    info!("Server shutdown complete");
    Ok(())
}
