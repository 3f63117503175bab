//! Manufacturer views: list, create, update, delete

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::extractors::{FormJson, RecordId};
use crate::http::page::{redirect_with_message, render, resolve_page, Page, Saved, SuccessMessage};
use crate::http::server::AppState;
use crate::http::session::LoginRequired;
use crate::models::{Manufacturer, ManufacturerForm, PageInfo, Paginated, PaginationParams};

const LIST_PATH: &str = "/manufacturers";

#[derive(Debug, Serialize)]
pub struct ManufacturerListContext {
    pub manufacturer_list: Vec<Manufacturer>,
    pub is_paginated: bool,
    pub page_obj: PageInfo,
}

impl From<Paginated<Manufacturer>> for ManufacturerListContext {
    fn from(page: Paginated<Manufacturer>) -> Self {
        Self {
            is_paginated: page.is_paginated(),
            page_obj: page.page_info(),
            manufacturer_list: page.items,
        }
    }
}

/// Create and update share one form; `object` is set on update.
#[derive(Debug, Serialize)]
pub struct ManufacturerFormContext {
    pub fields: &'static [&'static str],
    pub form: ManufacturerForm,
    pub object: Option<Manufacturer>,
}

impl ManufacturerFormContext {
    fn new(form: ManufacturerForm, object: Option<Manufacturer>) -> Self {
        Self {
            fields: ManufacturerForm::FIELDS,
            form,
            object,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ManufacturerDeleteContext {
    pub object: Manufacturer,
}

/// GET /manufacturers - five per page, ordered by name
async fn list_manufacturers(
    State(state): State<Arc<AppState>>,
    auth: LoginRequired,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Page<ManufacturerListContext>>, ApiError> {
    let total = state.store.manufacturers.count().await?;
    let page = resolve_page(&params, total)?;
    let items = state.store.manufacturers.list(page).await?;

    render(&state, auth, ManufacturerListContext::from(Paginated::new(items, total, page))).await
}

/// GET /manufacturers/create
async fn create_form(
    State(state): State<Arc<AppState>>,
    auth: LoginRequired,
) -> Result<Json<Page<ManufacturerFormContext>>, ApiError> {
    render(&state, auth, ManufacturerFormContext::new(ManufacturerForm::default(), None)).await
}

/// POST /manufacturers/create
async fn create_manufacturer(
    State(state): State<Arc<AppState>>,
    auth: LoginRequired,
    FormJson(form): FormJson<ManufacturerForm>,
) -> Result<Redirect, ApiError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Err(ApiError::invalid_form(&ManufacturerFormContext::new(form, None), errors))
        }
    };

    let manufacturer = match state.store.manufacturers.create(&input).await {
        Ok(m) => m,
        Err(e) => return Err(ApiError::from_write(&ManufacturerFormContext::new(form, None), e)),
    };
    tracing::info!(manufacturer_id = manufacturer.id, "manufacturer created");

    redirect_with_message(&state, auth, manufacturer.saved_message(Saved::Created), LIST_PATH).await
}

/// GET /manufacturers/{id}/update
async fn update_form(
    State(state): State<Arc<AppState>>,
    auth: LoginRequired,
    RecordId(id): RecordId,
) -> Result<Json<Page<ManufacturerFormContext>>, ApiError> {
    let manufacturer = state.store.manufacturers.get(id).await?;
    let form = ManufacturerForm::from(&manufacturer);
    render(&state, auth, ManufacturerFormContext::new(form, Some(manufacturer))).await
}

/// POST /manufacturers/{id}/update
async fn update_manufacturer(
    State(state): State<Arc<AppState>>,
    auth: LoginRequired,
    RecordId(id): RecordId,
    FormJson(form): FormJson<ManufacturerForm>,
) -> Result<Redirect, ApiError> {
    let existing = state.store.manufacturers.get(id).await?;
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let context = ManufacturerFormContext::new(form, Some(existing));
            return Err(ApiError::invalid_form(&context, errors));
        }
    };

    let manufacturer = match state.store.manufacturers.update(id, &input).await {
        Ok(m) => m,
        Err(e) => {
            let context = ManufacturerFormContext::new(form, Some(existing));
            return Err(ApiError::from_write(&context, e));
        }
    };
    tracing::info!(manufacturer_id = id, "manufacturer updated");

    redirect_with_message(&state, auth, manufacturer.saved_message(Saved::Updated), LIST_PATH).await
}

/// GET /manufacturers/{id}/delete - confirmation
async fn delete_confirm(
    State(state): State<Arc<AppState>>,
    auth: LoginRequired,
    RecordId(id): RecordId,
) -> Result<Json<Page<ManufacturerDeleteContext>>, ApiError> {
    let object = state.store.manufacturers.get(id).await?;
    render(&state, auth, ManufacturerDeleteContext { object }).await
}

/// POST /manufacturers/{id}/delete - removes the manufacturer and its cars
async fn delete_manufacturer(
    State(state): State<Arc<AppState>>,
    auth: LoginRequired,
    RecordId(id): RecordId,
) -> Result<Redirect, ApiError> {
    state.store.manufacturers.delete(id).await?;
    tracing::info!(manufacturer_id = id, "manufacturer deleted");

    redirect_with_message(&state, auth, Manufacturer::DELETED.to_owned(), LIST_PATH).await
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(LIST_PATH, get(list_manufacturers))
        .route("/manufacturers/create", get(create_form).post(create_manufacturer))
        .route("/manufacturers/{id}/update", get(update_form).post(update_manufacturer))
        .route("/manufacturers/{id}/delete", get(delete_confirm).post(delete_manufacturer))
}
