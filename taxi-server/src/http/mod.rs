//! HTTP server layer
//!
//! Axum server with:
//! - Session-cookie login on every view except `/health` and the login form
//! - Flash messages carried in the session
//! - JSON view contexts and error responses
//! - CORS (localhost only by default), request tracing, graceful shutdown

pub mod server;
pub mod error;
pub mod extractors;
pub mod page;
pub mod routes;
pub mod session;

pub use server::{build_router, run_server, AppState, ServerError};
pub use error::ApiError;
