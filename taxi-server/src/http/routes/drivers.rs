//! Driver views: list and detail. Accounts are created from the CLI.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::extractors::RecordId;
use crate::http::page::{render, resolve_page, Page};
use crate::http::server::AppState;
use crate::http::session::LoginRequired;
use crate::models::{Driver, DriverDetail, PageInfo, Paginated, PaginationParams};

#[derive(Debug, Serialize)]
pub struct DriverListContext {
    pub driver_list: Vec<Driver>,
    pub is_paginated: bool,
    pub page_obj: PageInfo,
}

impl From<Paginated<Driver>> for DriverListContext {
    fn from(page: Paginated<Driver>) -> Self {
        Self {
            is_paginated: page.is_paginated(),
            page_obj: page.page_info(),
            driver_list: page.items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DriverDetailContext {
    pub driver: DriverDetail,
}

/// GET /drivers
async fn list_drivers(
    State(state): State<Arc<AppState>>,
    auth: LoginRequired,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Page<DriverListContext>>, ApiError> {
    let total = state.store.drivers.count().await?;
    let page = resolve_page(&params, total)?;
    let items = state.store.drivers.list(page).await?;

    render(&state, auth, DriverListContext::from(Paginated::new(items, total, page))).await
}

/// GET /drivers/{id} - the driver with every car they drive
async fn driver_detail(
    State(state): State<Arc<AppState>>,
    auth: LoginRequired,
    RecordId(id): RecordId,
) -> Result<Json<Page<DriverDetailContext>>, ApiError> {
    let driver = state.store.drivers.detail(id).await?;
    render(&state, auth, DriverDetailContext { driver }).await
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", get(list_drivers))
        .route("/drivers/{id}", get(driver_detail))
}
