//! Schema setup command

use anyhow::{Context, Result};
use taxi_server::db::migrations;
use taxi_server::AppConfig;

/// Create or bring up to date every table the service uses.
pub async fn run_migrate(config: &AppConfig) -> Result<()> {
    let pool = super::connect(config).await?;
    migrations::run(&pool)
        .await
        .context("Failed to run migrations")?;

    println!("Database schema is up to date");
    Ok(())
}
