//! Car views: list, detail, create, update, delete

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
use crate::models::{
    Car, CarDetail, CarForm, CarWithManufacturer, DriverSummary, Manufacturer, PageInfo,
    Paginated, PaginationParams,
};

const LIST_PATH: &str = "/cars";

#[derive(Debug, Serialize)]
pub struct CarListContext {
    pub car_list: Vec<CarWithManufacturer>,
    pub is_paginated: bool,
    pub page_obj: PageInfo,
}

impl From<Paginated<CarWithManufacturer>> for CarListContext {
    fn from(page: Paginated<CarWithManufacturer>) -> Self {
        Self {
            is_paginated: page.is_paginated(),
            page_obj: page.page_info(),
            car_list: page.items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CarDetailContext {
    pub car: CarDetail,
}

/// Selectable values for the manufacturer and drivers fields
#[derive(Debug, Serialize)]
pub struct CarChoices {
    pub manufacturers: Vec<Manufacturer>,
    pub drivers: Vec<DriverSummary>,
}

#[derive(Debug, Serialize)]
pub struct CarFormContext {
    pub fields: &'static [&'static str],
    pub form: CarForm,
    pub choices: CarChoices,
    pub object: Option<CarDetail>,
}

#[derive(Debug, Serialize)]
pub struct CarDeleteContext {
    pub object: CarDetail,
}

async fn form_context(
    state: &AppState,
    form: CarForm,
    object: Option<CarDetail>,
) -> Result<CarFormContext, ApiError> {
    let choices = CarChoices {
        manufacturers: state.store.manufacturers.all().await?,
        drivers: state.store.drivers.all().await?,
    };
    Ok(CarFormContext {
        fields: CarForm::FIELDS,
        form,
        choices,
        object,
    })
}

/// GET /cars - five per page, in insertion order
async fn list_cars(
    State(state): State<Arc<AppState>>,
    auth: LoginRequired,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Page<CarListContext>>, ApiError> {
    let total = state.store.cars.count().await?;
    let page = resolve_page(&params, total)?;
    let items = state.store.cars.list(page).await?;

    render(&state, auth, CarListContext::from(Paginated::new(items, total, page))).await
}

/// GET /cars/{id}
async fn car_detail(
    State(state): State<Arc<AppState>>,
    auth: LoginRequired,
    RecordId(id): RecordId,
) -> Result<Json<Page<CarDetailContext>>, ApiError> {
    let car = state.store.cars.get(id).await?;
    render(&state, auth, CarDetailContext { car }).await
}

/// GET /cars/create
async fn create_form(
    State(state): State<Arc<AppState>>,
    auth: LoginRequired,
) -> Result<Json<Page<CarFormContext>>, ApiError> {
    let context = form_context(&state, CarForm::default(), None).await?;
    render(&state, auth, context).await
}

/// POST /cars/create
async fn create_car(
    State(state): State<Arc<AppState>>,
    auth: LoginRequired,
    FormJson(form): FormJson<CarForm>,
) -> Result<Redirect, ApiError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let context = form_context(&state, form, None).await?;
            return Err(ApiError::invalid_form(&context, errors));
        }
    };

    let car: Car = match state.store.cars.create(&input).await {
        Ok(car) => car,
        Err(e) => {
            let context = form_context(&state, form, None).await?;
            return Err(ApiError::from_write(&context, e));
        }
    };
    tracing::info!(car_id = car.id, drivers = input.driver_ids.len(), "car created");

    redirect_with_message(&state, auth, car.saved_message(Saved::Created), LIST_PATH).await
}

/// GET /cars/{id}/update
async fn update_form(
    State(state): State<Arc<AppState>>,
    auth: LoginRequired,
    RecordId(id): RecordId,
) -> Result<Json<Page<CarFormContext>>, ApiError> {
    let car = state.store.cars.get(id).await?;
    let form = CarForm::from(&car);
    let context = form_context(&state, form, Some(car)).await?;
    render(&state, auth, context).await
}

/// POST /cars/{id}/update - replaces the driver set with the submitted one
async fn update_car(
    State(state): State<Arc<AppState>>,
    auth: LoginRequired,
    RecordId(id): RecordId,
    FormJson(form): FormJson<CarForm>,
) -> Result<Redirect, ApiError> {
    let existing = state.store.cars.get(id).await?;
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let context = form_context(&state, form, Some(existing)).await?;
            return Err(ApiError::invalid_form(&context, errors));
        }
    };

    let car = match state.store.cars.update(id, &input).await {
        Ok(car) => car,
        Err(e) => {
            let context = form_context(&state, form, Some(existing)).await?;
            return Err(ApiError::from_write(&context, e));
        }
    };
    tracing::info!(car_id = id, drivers = input.driver_ids.len(), "car updated");

    redirect_with_message(&state, auth, car.saved_message(Saved::Updated), LIST_PATH).await
}

/// GET /cars/{id}/delete
async fn delete_confirm(
    State(state): State<Arc<AppState>>,
    auth: LoginRequired,
    RecordId(id): RecordId,
) -> Result<Json<Page<CarDeleteContext>>, ApiError> {
    let object = state.store.cars.get(id).await?;
    render(&state, auth, CarDeleteContext { object }).await
}

/// POST /cars/{id}/delete
async fn delete_car(
    State(state): State<Arc<AppState>>,
    auth: LoginRequired,
    RecordId(id): RecordId,
) -> Result<Redirect, ApiError> {
    state.store.cars.delete(id).await?;
    tracing::info!(car_id = id, "car deleted");

    redirect_with_message(&state, auth, Car::DELETED.to_owned(), LIST_PATH).await
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(LIST_PATH, get(list_cars))
        .route("/cars/create", get(create_form).post(create_car))
        .route("/cars/{id}", get(car_detail))
        .route("/cars/{id}/update", get(update_form).post(update_car))
        .route("/cars/{id}/delete", get(delete_confirm).post(delete_car))
}
