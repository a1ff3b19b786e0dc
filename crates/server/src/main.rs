use std::sync::Arc;

use quizsift_core::{BatchCoordinator, HttpFetcher};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod outbox;
mod routes;

use config::ServerConfig;
use routes::AppState;

const DEFAULT_LOG_FILTER: &str = "quizsift_server=info,quizsift_core=info,tower_http=info";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .init();

    let config = ServerConfig::from_env()?;
    let fetcher = HttpFetcher::new(config.fetch.clone())?;
    let coordinator = BatchCoordinator::new(Arc::new(fetcher), config.coordinator_config());
    let app = routes::router(AppState::new(coordinator));

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "quizsift server listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
    tracing::info!("shutting down");
}
