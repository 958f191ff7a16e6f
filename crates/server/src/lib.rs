//! Batepapo chat server library
//!
//! Participants register a display name, exchange messages and are swept
//! out after a period of silence.

pub mod clock;
pub mod config;
pub mod ctx;
pub mod error;
pub mod handlers;
pub mod messages;
pub mod models;
pub mod presence;
pub mod reaper;
pub mod router;
pub mod store;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use clock::{Clock, SystemClock};
use config::{AppState, ServerConfig};
use reaper::Reaper;
use store::{ChatStore, MemoryStore, SqliteStore};

pub use error::{ChatError, Result};

/// Open the store selected by `config`.
pub async fn open_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn ChatStore>> {
    if config.uses_memory_store() {
        info!("Using in-memory store; data is lost on exit");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let store = SqliteStore::connect(&config.database_url).await?;
    Ok(Arc::new(store))
}

pub async fn run() -> anyhow::Result<()> {
    // Loads `.env` first so RUST_LOG can come from it too.
    let config = ServerConfig::load(None);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("batepapo=info,tower_http=info"));
    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        // Already set, ignore
    }

    info!("=== Batepapo Server ===");
    info!(
        "Store: {} | stale after {:?} | sweep every {:?}",
        config.database_url, config.stale_after, config.sweep_interval
    );

    let store = open_store(&config).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reaper = Reaper::new(store.clone(), clock.clone(), config.stale_after)
        .spawn(config.sweep_interval, shutdown_rx);

    let state = AppState::new(store.clone(), clock);
    let app = router::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server is running on http://{}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    let _ = shutdown_tx.send(true);
    if let Err(e) = reaper.await {
        warn!("Reaper task ended abnormally: {}", e);
    }
    store.close().await;
    info!("Server stopped");

    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
