//! Home page: fleet totals and the session's visit counter

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::page::{render, Page};
use crate::http::server::AppState;
use crate::http::session::LoginRequired;

#[derive(Debug, Serialize)]
pub struct IndexContext {
    pub num_drivers: i64,
    pub num_cars: i64,
    pub num_manufacturers: i64,
    pub num_visits: u64,
}

/// GET / - counts of every table plus this session's visit number.
///
/// The counter is read, incremented and written back without a lock;
/// concurrent requests on one session may share a number.
async fn index(
    State(state): State<Arc<AppState>>,
    mut auth: LoginRequired,
) -> Result<Json<Page<IndexContext>>, ApiError> {
    let num_drivers = state.store.drivers.count().await?;
    let num_cars = state.store.cars.count().await?;
    let num_manufacturers = state.store.manufacturers.count().await?;

    let num_visits = auth.session_mut().record_visit();

    let context = IndexContext {
        num_drivers,
        num_cars,
        num_manufacturers,
        num_visits,
    };
    render(&state, auth, context).await
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(index))
}
