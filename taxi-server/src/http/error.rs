//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes.
//! The login gate is an error too: it becomes a redirect.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::db::DbError;
use crate::models::{FormErrors, InvalidPage, ValidationError};

/// Where unauthenticated requests are sent
pub const LOGIN_PATH: &str = "/accounts/login";

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// No valid session; redirect to login, then back to `next`
    LoginRequired { next: String },

    /// Form failed validation (400), re-rendered with its context
    Form { context: Value, errors: FormErrors },

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Database error (500, logged)
    Database(DbError),

    /// Internal error (500)
    Internal { message: String },
}

impl ApiError {
    /// Form re-render with field errors.
    pub fn invalid_form<C: Serialize>(context: &C, errors: FormErrors) -> Self {
        match serde_json::to_value(context) {
            Ok(context) => Self::Form { context, errors },
            Err(e) => Self::Internal {
                message: format!("failed to serialize form context: {}", e),
            },
        }
    }

    /// Map a failed write to form errors where the database rejected the input.
    pub fn from_write<C: Serialize>(context: &C, err: DbError) -> Self {
        match rejected_field(err) {
            Ok(field_error) => Self::invalid_form(context, FormErrors::from(field_error)),
            Err(other) => Self::from(other),
        }
    }

    fn login_redirect(next: &str) -> Redirect {
        Redirect::to(&format!("{}?next={}", LOGIN_PATH, urlencoding::encode(next)))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::LoginRequired { next } => {
                tracing::debug!(next = %next, "login required");
                return Self::login_redirect(next).into_response();
            }
            Self::Form { context, errors } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "validation_error",
                    "form": context,
                    "errors": errors
                }),
            ),
            Self::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "message": format!("{} '{}' not found", resource, id)
                }),
            ),
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Constraint rejections expressed as the field error a form shows.
fn rejected_field(err: DbError) -> Result<ValidationError, DbError> {
    match err {
        DbError::Conflict { resource, field } => Ok(ValidationError::Duplicate {
            field,
            entity: resource,
        }),
        DbError::InvalidReference { field, id } => Ok(ValidationError::InvalidChoice {
            field,
            value: id.to_string(),
        }),
        other => Err(other),
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            other => match rejected_field(other) {
                Ok(field_error) => Self::Form {
                    context: Value::Null,
                    errors: FormErrors::from(field_error),
                },
                Err(other) => Self::Database(other),
            },
        }
    }
}

impl From<InvalidPage> for ApiError {
    fn from(e: InvalidPage) -> Self {
        Self::NotFound {
            resource: "page",
            id: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::header::LOCATION;

    #[tokio::test]
    async fn form_error_is_400_with_field_errors() {
        let errors = FormErrors::from(ValidationError::Empty { field: "name" });
        let err = ApiError::invalid_form(&json!({"name": ""}), errors);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["errors"]["name"][0], "This field is required.");
        assert_eq!(body["form"]["name"], "");
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let err = ApiError::from(DbError::not_found("car", 7));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn login_required_redirects_with_next() {
        let err = ApiError::LoginRequired {
            next: "/cars?page=2".into(),
        };
        let response = err.into_response();
        assert!(response.status().is_redirection());
        assert_eq!(
            response.headers()[LOCATION],
            "/accounts/login?next=%2Fcars%3Fpage%3D2"
        );
    }

    #[tokio::test]
    async fn conflict_becomes_field_error() {
        let err = ApiError::from_write(
            &json!({}),
            DbError::Conflict {
                resource: "Manufacturer",
                field: "name",
            },
        );
        match err {
            ApiError::Form { errors, .. } => {
                assert_eq!(
                    errors.get("name"),
                    Some(&["Manufacturer with this name already exists.".to_owned()][..])
                );
            }
            other => panic!("expected form error, got {:?}", other),
        }
    }

    #[test]
    fn invalid_page_is_not_found() {
        let err = ApiError::from(InvalidPage::TooSmall(0));
        assert!(matches!(err, ApiError::NotFound { resource: "page", .. }));
    }
}
