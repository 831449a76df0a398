//! Florida Birds API server entry point.
//!
//! Loads configuration from the environment, opens the observation store
//! once (running migrations for `PostgreSQL`), and serves the HTTP API
//! until `Ctrl-C` or `SIGTERM`. The connection pool is closed explicitly
//! after the server drains.

use std::sync::Arc;

use anyhow::Context;
use birdwatch_api::{ApiConfig, AppState, LogFormat, StoreBackend, shutdown_signal, start_server};
use birdwatch_db::{MemoryStore, PostgresConfig, PostgresPool};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the store cannot be
/// opened, or the server fails to bind or serve.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env().context("invalid configuration")?;

    init_tracing(config.log_format);

    info!(
        backend = ?config.backend,
        host = config.server.host,
        port = config.server.port,
        "birdwatch-api starting"
    );

    match config.backend {
        StoreBackend::Postgres => {
            let pg_config = PostgresConfig::new(&config.database_url)
                .with_max_connections(config.max_connections);
            let pool = PostgresPool::connect(&pg_config)
                .await
                .context("failed to connect to PostgreSQL")?;
            pool.run_migrations()
                .await
                .context("failed to run migrations")?;

            let state = AppState::new(Arc::new(pool.observations())).with_cors(config.cors);
            let served = start_server(&config.server, Arc::new(state), shutdown_signal()).await;

            pool.close().await;
            info!("Connection pool closed");
            served?;
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store; observations will not survive a restart");
            let state = AppState::new(Arc::new(MemoryStore::new())).with_cors(config.cors);
            start_server(&config.server, Arc::new(state), shutdown_signal()).await?;
        }
    }

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
