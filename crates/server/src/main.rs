//! sqlexport server entry point.
//!
//! Loads configuration, connects and verifies the Redis and PostgreSQL
//! collaborators, then serves the export API over HTTP. Any failure before
//! the listener is up aborts startup.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlexport_client::{PgExecutor, RedisKv};
use sqlexport_core::{AppConfig, ChunkedStore, SnapshotWriter};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod error;
mod export;
mod handler;
#[cfg(test)]
mod testing;

use export::{ExportSettings, Exporter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    tracing::info!(env = %config.env, addr = %config.listen_addr, "Starting sqlexport server");

    let kv = RedisKv::connect(&config.redis_url)
        .await
        .context("failed to connect to Redis")?;
    kv.ping().await.context("failed to ping Redis")?;

    let executor =
        PgExecutor::connect(&config.postgres_url, config.postgres_pool_size).context("failed to create PostgreSQL pool")?;
    executor.ping().await.context("failed to ping PostgreSQL")?;

    let exporter = Exporter::new(
        ChunkedStore::with_chunk_size(Arc::new(kv), config.chunk_size),
        Arc::new(executor),
        SnapshotWriter::new(&config.snapshot_dir),
        ExportSettings::from(&config),
    );
    let app = handler::router(Arc::new(exporter), config.request_timeout());

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!("Listening on {}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("sqlexport server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
