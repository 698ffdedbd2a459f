use std::sync::Arc;

use clap::Parser;

use sinklab::clock::SystemClock;
use sinklab::config::ServerConfig;
use sinklab::http::{self, AppState};
use sinklab::logging;
use sinklab::store::MemoryDocumentStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    logging::init(&config.log_filter)?;

    let store = Arc::new(MemoryDocumentStore::new());
    let state = AppState::new(store, Arc::new(SystemClock::new()));

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        max_body_bytes = config.max_body_bytes,
        "starting sinklab HTTP server"
    );

    http::serve(listener, state, &config, shutdown_signal()).await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable; running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
