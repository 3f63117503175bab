//! HTTP server command

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use taxi_server::db::{migrations, DriverRepository, Store};
use taxi_server::models::DriverForm;
use taxi_server::{run_server, AppConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default: 127.0.0.1:8000)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Keep all data in process memory; nothing survives a restart
    #[arg(long)]
    pub in_memory: bool,

    /// With --in-memory, create a `demo` driver with this password
    #[arg(long, requires = "in_memory")]
    pub demo_password: Option<String>,
}

impl ServeArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        config.cors_permissive |= self.cors_permissive;
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs, mut config: AppConfig) -> Result<()> {
    args.apply(&mut config);

    let store = if args.in_memory {
        tracing::warn!("Using in-memory store - data is lost on shutdown");
        let store = Store::in_memory();
        if let Some(password) = args.demo_password {
            seed_demo_driver(&store, password).await?;
        }
        store
    } else {
        let pool = super::connect(&config).await?;
        migrations::run(&pool)
            .await
            .context("Failed to run migrations")?;
        Store::postgres(pool)
    };

    tracing::info!("Starting taxi server on {}", config.bind_addr);

    // Run server (blocks until shutdown)
    run_server(store, &config).await.context("Server error")?;

    Ok(())
}

async fn seed_demo_driver(store: &Store, password: String) -> Result<()> {
    let form = DriverForm {
        username: "demo".into(),
        password,
        first_name: "Demo".into(),
        last_name: "Driver".into(),
        license_number: "DEM00000".into(),
        ..DriverForm::default()
    };
    let new_driver = form
        .validate()
        .map_err(|errors| anyhow::anyhow!("invalid demo driver:\n{}", errors))?;
    store
        .drivers
        .create(&new_driver)
        .await
        .context("Failed to create demo driver")?;
    tracing::info!("Demo driver `demo` created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = ServeArgs::parse_from(["serve", "--bind", "0.0.0.0:9000", "--cors-permissive"]);
        let mut config = AppConfig::default();
        args.apply(&mut config);
        assert_eq!(config.bind_addr, "0.0.0.0:9000".parse::<SocketAddr>().unwrap());
        assert!(config.cors_permissive);
    }

    #[test]
    fn missing_bind_keeps_config() {
        let args = ServeArgs::parse_from(["serve"]);
        let mut config = AppConfig::default();
        let before = config.bind_addr;
        args.apply(&mut config);
        assert_eq!(config.bind_addr, before);
    }

    #[test]
    fn demo_password_needs_in_memory() {
        assert!(ServeArgs::try_parse_from(["serve", "--demo-password", "pw"]).is_err());
        assert!(
            ServeArgs::try_parse_from(["serve", "--in-memory", "--demo-password", "pw"]).is_ok()
        );
    }
}
