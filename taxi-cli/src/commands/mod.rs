//! Command implementations for the taxi CLI

pub mod create_driver;
pub mod migrate;
pub mod serve;

pub use create_driver::run_create_driver;
pub use migrate::run_migrate;
pub use serve::run_serve;

use anyhow::{Context, Result};
use taxi_server::db::{create_pool, PgPool};
use taxi_server::AppConfig;

/// Connect to the configured PostgreSQL database.
pub(crate) async fn connect(config: &AppConfig) -> Result<PgPool> {
    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL not set. Set via --database-url, DATABASE_URL env, .env or the config file")?;

    create_pool(database_url, config.max_connections)
        .await
        .context("Failed to create database pool")
}
