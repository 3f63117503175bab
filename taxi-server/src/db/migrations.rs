//! Schema setup for the fleet tables
//!
//! Idempotent: every statement is `IF NOT EXISTS`, so this runs on each
//! startup and from `taxi migrate`.

use sqlx::PgPool;

const STATEMENTS: &[(&str, &str)] = &[
    ("pgcrypto", "CREATE EXTENSION IF NOT EXISTS pgcrypto"),
    (
        "manufacturers",
        r#"
        CREATE TABLE IF NOT EXISTS manufacturers (
            id BIGSERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            country VARCHAR(255) NOT NULL,
            CONSTRAINT manufacturers_name_key UNIQUE (name)
        )
        "#,
    ),
    (
        "drivers",
        r#"
        CREATE TABLE IF NOT EXISTS drivers (
            id BIGSERIAL PRIMARY KEY,
            username VARCHAR(150) NOT NULL,
            password_hash TEXT NOT NULL,
            first_name VARCHAR(150) NOT NULL DEFAULT '',
            last_name VARCHAR(150) NOT NULL DEFAULT '',
            email VARCHAR(254) NOT NULL DEFAULT '',
            license_number VARCHAR(255) NOT NULL,
            date_joined TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT drivers_username_key UNIQUE (username),
            CONSTRAINT drivers_license_number_key UNIQUE (license_number)
        )
        "#,
    ),
    (
        "cars",
        r#"
        CREATE TABLE IF NOT EXISTS cars (
            id BIGSERIAL PRIMARY KEY,
            model VARCHAR(255) NOT NULL,
            manufacturer_id BIGINT NOT NULL,
            CONSTRAINT cars_manufacturer_id_fkey FOREIGN KEY (manufacturer_id)
                REFERENCES manufacturers(id) ON DELETE CASCADE
        )
        "#,
    ),
    (
        "cars_drivers",
        r#"
        CREATE TABLE IF NOT EXISTS cars_drivers (
            car_id BIGINT NOT NULL REFERENCES cars(id) ON DELETE CASCADE,
            driver_id BIGINT NOT NULL,
            PRIMARY KEY (car_id, driver_id),
            CONSTRAINT cars_drivers_driver_id_fkey FOREIGN KEY (driver_id)
                REFERENCES drivers(id) ON DELETE CASCADE
        )
        "#,
    ),
    (
        "sessions",
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            key VARCHAR(64) PRIMARY KEY,
            data TEXT NOT NULL,
            expires_at TIMESTAMPTZ NOT NULL
        )
        "#,
    ),
    (
        "indexes",
        r#"
        CREATE INDEX IF NOT EXISTS idx_cars_manufacturer ON cars(manufacturer_id);
        CREATE INDEX IF NOT EXISTS idx_cars_drivers_driver ON cars_drivers(driver_id);
        CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at)
        "#,
    ),
];

/// Create all tables and indexes.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running migrations...");

    for (name, sql) in STATEMENTS {
        tracing::debug!(step = name, "migration");
        sqlx::raw_sql(sql).execute(pool).await?;
    }

    tracing::info!("Migrations complete");
    Ok(())
}
