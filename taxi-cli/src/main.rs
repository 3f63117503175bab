//! taxi CLI - run and administer the taxi fleet service
//!
//! - `serve`: HTTP server over PostgreSQL or an in-memory store
//! - `migrate`: create the database schema
//! - `create-driver`: add a driver account (drivers are the service's users)

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use taxi_server::AppConfig;

mod commands;
mod tracing_setup;

use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "taxi",
    author,
    version,
    about = "Taxi fleet registry: manufacturers, cars and their drivers"
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// TOML config file
    #[arg(long, short = 'c', global = true, env = "TAXI_CONFIG")]
    config: Option<PathBuf>,

    /// Database URL (overrides config/environment)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve(commands::serve::ServeArgs),
    /// Create or update the database schema
    Migrate,
    /// Create a driver account
    CreateDriver(commands::create_driver::CreateDriverArgs),
}

impl Cli {
    /// Config file, then environment, then flags.
    fn app_config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load(self.config.as_deref()).context("Failed to load config")?;
        if let Some(url) = &self.database_url {
            config.database_url = Some(url.clone());
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    tracing_setup::init(&TracingConfig { debug: cli.debug }).ok();

    let config = cli.app_config()?;
    match cli.command {
        Commands::Serve(args) => commands::run_serve(args, config).await?,
        Commands::Migrate => commands::run_migrate(&config).await?,
        Commands::CreateDriver(args) => commands::run_create_driver(args, &config).await?,
    }
    Ok(())
}
