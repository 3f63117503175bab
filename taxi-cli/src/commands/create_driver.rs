//! Driver account creation
//!
//! Drivers have no create view; accounts are added here, the way an
//! operator would add staff users.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use taxi_server::db::{DbError, DriverRepository, Store};
use taxi_server::models::DriverForm;
use taxi_server::AppConfig;

/// Arguments for the create-driver command
#[derive(Parser, Debug)]
pub struct CreateDriverArgs {
    /// Login name (letters, digits and @/./+/-/_)
    #[arg(long)]
    pub username: String,

    /// Account password
    #[arg(long, env = "TAXI_DRIVER_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Driving license number, unique per driver
    #[arg(long)]
    pub license_number: String,

    #[arg(long, default_value = "")]
    pub first_name: String,

    #[arg(long, default_value = "")]
    pub last_name: String,

    #[arg(long, default_value = "")]
    pub email: String,
}

impl From<CreateDriverArgs> for DriverForm {
    fn from(args: CreateDriverArgs) -> Self {
        Self {
            username: args.username,
            password: args.password,
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            license_number: args.license_number,
        }
    }
}

pub async fn run_create_driver(args: CreateDriverArgs, config: &AppConfig) -> Result<()> {
    let new_driver = DriverForm::from(args)
        .validate()
        .map_err(|errors| anyhow!("invalid driver:\n{}", errors))?;

    let store = Store::postgres(super::connect(config).await?);
    let driver = match store.drivers.create(&new_driver).await {
        Ok(driver) => driver,
        Err(DbError::Conflict { field, .. }) => {
            return Err(anyhow!("a driver with this {} already exists", field.replace('_', " ")))
        }
        Err(e) => return Err(e).context("Failed to create driver"),
    };

    tracing::info!(driver_id = driver.id, "driver created");
    println!("Created driver {} (id {})", driver.username, driver.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_become_form() {
        let args = CreateDriverArgs::parse_from([
            "create-driver",
            "--username",
            "ann",
            "--password",
            "pw",
            "--license-number",
            "ANN12345",
        ]);
        let form = DriverForm::from(args);
        assert_eq!(form.username, "ann");
        assert_eq!(form.license_number, "ANN12345");
        assert!(form.email.is_empty());
        assert!(form.validate().is_ok());
    }
}
