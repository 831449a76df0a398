//! Bulk loader for the Florida Birds observation service.
//!
//! Replaces the contents of the observations table with a fixed seed set:
//! connect, migrate, delete everything, insert the seeds, disconnect.
//! Exits 0 on success and 1 on any failure.
//!
//! The database is taken from `DATABASE_URL`, falling back to the
//! service default.

mod seed;

use std::process::ExitCode;

use anyhow::Context;
use birdwatch_db::{DEFAULT_DATABASE_URL, ObservationStore, PostgresPool};
use birdwatch_types::NewObservation;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = format!("{e:#}"), "Seed import failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let seeds = seed::seed_observations()?;

    let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_owned());
    let pool = PostgresPool::connect_url(&url)
        .await
        .context("failed to connect to PostgreSQL")?;
    info!("Connected to PostgreSQL");

    let outcome = replace_all(&pool, seeds).await;

    pool.close().await;
    info!("Connection pool closed");
    outcome
}

async fn replace_all(pool: &PostgresPool, seeds: Vec<NewObservation>) -> anyhow::Result<()> {
    pool.run_migrations()
        .await
        .context("failed to run migrations")?;

    let store = pool.observations();

    let removed = store
        .delete_all()
        .await
        .context("failed to clear observations")?;
    info!(removed, "Existing observations deleted");

    let inserted = store
        .insert_many(seeds)
        .await
        .context("failed to insert seed observations")?;
    info!(count = inserted.len(), "Seed observations imported");

    Ok(())
}
