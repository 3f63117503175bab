//! Database layer - repository interfaces, PostgreSQL and in-memory backends
//!
//! # Design Principles
//!
//! - Handlers see repository traits only, never a pool
//! - List operations use JOINs - no N+1 queries
//! - Rely on DB constraints, handle conflicts - no check-then-insert
//! - Transactions for multi-step writes (car + driver links)

pub mod memory;
pub mod migrations;
pub mod pool;
pub mod repos;

use std::sync::Arc;

use async_trait::async_trait;

use crate::models::{
    Car, CarDetail, CarInput, CarWithManufacturer, Driver, DriverDetail, DriverSummary,
    Manufacturer, ManufacturerInput, NewDriver, Pagination, Session,
};

pub use memory::MemoryStore;
pub use pool::create_pool;
pub use sqlx::PgPool;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("{resource} with this {field} already exists")]
    Conflict {
        resource: &'static str,
        field: &'static str,
    },

    #[error("{field} references missing record {id}")]
    InvalidReference { field: &'static str, id: i64 },

    #[error("corrupt session data: {0}")]
    Session(#[from] serde_json::Error),
}

impl DbError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

#[async_trait]
pub trait ManufacturerRepository: Send + Sync {
    async fn count(&self) -> Result<i64, DbError>;

    /// One page, ordered by name.
    async fn list(&self, page: Pagination) -> Result<Vec<Manufacturer>, DbError>;

    /// Every manufacturer, ordered by name (form choices).
    async fn all(&self) -> Result<Vec<Manufacturer>, DbError>;

    async fn get(&self, id: i64) -> Result<Manufacturer, DbError>;

    async fn create(&self, input: &ManufacturerInput) -> Result<Manufacturer, DbError>;

    async fn update(&self, id: i64, input: &ManufacturerInput) -> Result<Manufacturer, DbError>;

    /// Delete a manufacturer and, by cascade, its cars.
    async fn delete(&self, id: i64) -> Result<(), DbError>;
}

#[async_trait]
pub trait CarRepository: Send + Sync {
    async fn count(&self) -> Result<i64, DbError>;

    /// One page with manufacturers joined, ordered by id.
    async fn list(&self, page: Pagination) -> Result<Vec<CarWithManufacturer>, DbError>;

    async fn get(&self, id: i64) -> Result<CarDetail, DbError>;

    async fn create(&self, input: &CarInput) -> Result<Car, DbError>;

    /// Replace the car's fields and its full driver set.
    async fn update(&self, id: i64, input: &CarInput) -> Result<Car, DbError>;

    async fn delete(&self, id: i64) -> Result<(), DbError>;
}

#[async_trait]
pub trait DriverRepository: Send + Sync {
    async fn count(&self) -> Result<i64, DbError>;

    /// One page, ordered by username.
    async fn list(&self, page: Pagination) -> Result<Vec<Driver>, DbError>;

    /// Every driver, ordered by username (form choices).
    async fn all(&self) -> Result<Vec<DriverSummary>, DbError>;

    async fn get(&self, id: i64) -> Result<Driver, DbError>;

    /// Driver with cars and each car's manufacturer.
    async fn detail(&self, id: i64) -> Result<DriverDetail, DbError>;

    async fn create(&self, input: &NewDriver) -> Result<Driver, DbError>;

    /// Check credentials. `None` when the username is unknown or the password is wrong.
    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<Driver>, DbError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Load an unexpired session.
    async fn load(&self, key: &str) -> Result<Option<Session>, DbError>;

    /// Insert or overwrite a session.
    async fn save(&self, session: &Session) -> Result<(), DbError>;

    async fn delete(&self, key: &str) -> Result<(), DbError>;

    /// Remove expired sessions, returning how many were dropped.
    async fn purge_expired(&self) -> Result<u64, DbError>;
}

/// Bundle of repositories handed to the HTTP layer
#[derive(Clone)]
pub struct Store {
    pub manufacturers: Arc<dyn ManufacturerRepository>,
    pub cars: Arc<dyn CarRepository>,
    pub drivers: Arc<dyn DriverRepository>,
    pub sessions: Arc<dyn SessionRepository>,
}

impl Store {
    /// PostgreSQL-backed store sharing one pool.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            manufacturers: Arc::new(repos::PgManufacturerRepo::new(pool.clone())),
            cars: Arc::new(repos::PgCarRepo::new(pool.clone())),
            drivers: Arc::new(repos::PgDriverRepo::new(pool.clone())),
            sessions: Arc::new(repos::PgSessionRepo::new(pool)),
        }
    }

    /// Process-local store for development and tests.
    pub fn in_memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    pub fn from_memory(memory: Arc<MemoryStore>) -> Self {
        Self {
            manufacturers: memory.clone(),
            cars: memory.clone(),
            drivers: memory.clone(),
            sessions: memory,
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}
