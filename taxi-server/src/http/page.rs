//! Page rendering and flash messages
//!
//! Every gated GET view returns its context wrapped in a `Page`, which
//! drains pending flash messages from the session. Successful form
//! submissions queue a message and redirect.

use axum::response::Redirect;
use axum::Json;
use serde::Serialize;

use super::error::ApiError;
use super::server::AppState;
use super::session::LoginRequired;
use crate::models::{Car, Manufacturer, PageRequest, Pagination, PaginationParams, PAGE_SIZE};

/// View context plus the per-request globals a template would see
#[derive(Debug, Serialize)]
pub struct Page<T> {
    #[serde(flatten)]
    pub context: T,
    pub messages: Vec<String>,
    pub user: String,
}

/// Finish a GET view: consume flash messages and save the session.
pub async fn render<T: Serialize>(
    state: &AppState,
    mut auth: LoginRequired,
    context: T,
) -> Result<Json<Page<T>>, ApiError> {
    let messages = if auth.session().messages.is_empty() {
        Vec::new()
    } else {
        auth.session_mut().take_messages()
    };
    auth.save(state).await?;

    Ok(Json(Page {
        context,
        messages,
        user: auth.user.username,
    }))
}

/// Finish a successful POST: queue `message`, then redirect to `to`.
pub async fn redirect_with_message(
    state: &AppState,
    mut auth: LoginRequired,
    message: String,
    to: &str,
) -> Result<Redirect, ApiError> {
    auth.session_mut().push_message(message);
    auth.save(state).await?;
    Ok(Redirect::to(to))
}

/// Resolve `?page=` against a row count at the list page size.
pub fn resolve_page(params: &PaginationParams, total: i64) -> Result<Pagination, ApiError> {
    let request = PageRequest::parse(params.page.as_deref())?;
    Ok(Pagination::resolve(request, PAGE_SIZE, total)?)
}

/// What happened to a saved record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Saved {
    Created,
    Updated,
}

impl Saved {
    fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }
}

/// Records that name themselves in success messages
pub trait SuccessMessage {
    /// Shown after delete, when the record is gone.
    const DELETED: &'static str;

    fn label(&self) -> &str;

    fn saved_message(&self, saved: Saved) -> String {
        format!("{} has been successfully {}", self.label(), saved.as_str())
    }
}

impl SuccessMessage for Manufacturer {
    const DELETED: &'static str = "Manufacturer has been deleted!";

    fn label(&self) -> &str {
        &self.name
    }
}

impl SuccessMessage for Car {
    const DELETED: &'static str = "Car has been deleted!";

    fn label(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manufacturer_messages() {
        let m = Manufacturer {
            id: 1,
            name: "Toyota".into(),
            country: "Japan".into(),
        };
        assert_eq!(
            m.saved_message(Saved::Created),
            "Toyota has been successfully created"
        );
        assert_eq!(
            m.saved_message(Saved::Updated),
            "Toyota has been successfully updated"
        );
        assert_eq!(Manufacturer::DELETED, "Manufacturer has been deleted!");
    }

    #[test]
    fn car_messages_use_model() {
        let car = Car {
            id: 1,
            model: "Corolla".into(),
            manufacturer_id: 1,
        };
        assert_eq!(
            car.saved_message(Saved::Created),
            "Corolla has been successfully created"
        );
        assert_eq!(Car::DELETED, "Car has been deleted!");
    }

    #[test]
    fn resolve_page_maps_errors_to_not_found() {
        let params = PaginationParams {
            page: Some("abc".into()),
        };
        assert!(matches!(
            resolve_page(&params, 10),
            Err(ApiError::NotFound { .. })
        ));
        let params = PaginationParams {
            page: Some("2".into()),
        };
        assert_eq!(resolve_page(&params, 10).unwrap().page, 2);
    }
}
