//! taxi-server: fleet registry for a taxi service
//!
//! Manufacturers, cars and the drivers assigned to them, served over
//! HTTP behind a session login. Storage is PostgreSQL, or an in-memory
//! store for tests and demos.

pub mod config;
pub mod db;
pub mod http;
pub mod models;

pub use config::{AppConfig, ConfigError};
pub use db::{create_pool, DbError, Store};
pub use http::{build_router, run_server, AppState};
