//! Login and logout

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::http::error::{ApiError, LOGIN_PATH};
use crate::http::extractors::FormJson;
use crate::http::server::AppState;
use crate::http::session::{expired_session_cookie, session_cookie, session_key};
use crate::models::{FormErrors, Session, SessionData, ValidationError};

const INVALID_LOGIN: &str = "Please enter a correct username and password. Note that both fields may be case-sensitive.";

#[derive(Debug, Default, Deserialize)]
pub struct NextParam {
    pub next: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

/// Login form context; the password is never echoed back
#[derive(Debug, Serialize)]
pub struct LoginContext {
    pub fields: &'static [&'static str],
    pub username: String,
    pub next: String,
}

impl LoginContext {
    fn new(username: String, next: Option<&str>) -> Self {
        Self {
            fields: &["username", "password"],
            username,
            next: safe_next(next).to_owned(),
        }
    }
}

/// Only same-site absolute paths are followed after login. Browsers drop
/// tab and newline from URLs, so control characters are refused outright.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_control) =>
        {
            path
        }
        _ => "/",
    }
}

/// GET /accounts/login
async fn login_form(Query(params): Query<NextParam>) -> Json<LoginContext> {
    Json(LoginContext::new(String::new(), params.next.as_deref()))
}

/// POST /accounts/login - start a session and redirect to `next`.
async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    FormJson(form): FormJson<LoginForm>,
) -> Result<Response, ApiError> {
    let context = LoginContext::new(form.username.trim().to_owned(), form.next.as_deref());

    let mut errors = FormErrors::new();
    if context.username.is_empty() {
        errors.push(ValidationError::Empty { field: "username" });
    }
    if form.password.is_empty() {
        errors.push(ValidationError::Empty { field: "password" });
    }
    if !errors.is_empty() {
        return Err(ApiError::invalid_form(&context, errors));
    }

    let Some(driver) = state
        .store
        .drivers
        .authenticate(&context.username, &form.password)
        .await?
    else {
        tracing::warn!(username = %context.username, "failed login");
        let mut errors = FormErrors::new();
        errors.non_field(INVALID_LOGIN);
        return Err(ApiError::invalid_form(&context, errors));
    };

    let redirect = Redirect::to(&context.next);

    // A fresh key on every login; any previous session is dropped.
    if let Some(old) = session_key(&headers) {
        state.store.sessions.delete(&old).await?;
    }
    let session = Session::start(SessionData::for_user(driver.id), state.session_ttl);
    state.store.sessions.save(&session).await?;
    tracing::info!(driver_id = driver.id, "driver logged in");

    let cookie = session_cookie(&session, state.session_ttl.num_seconds(), state.secure_cookies);
    Ok(([(SET_COOKIE, cookie)], redirect).into_response())
}

/// POST /accounts/logout - end the session and go back to login.
async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Response, ApiError> {
    if let Some(key) = session_key(&headers) {
        state.store.sessions.delete(&key).await?;
    }
    Ok(([(SET_COOKIE, expired_session_cookie())], Redirect::to(LOGIN_PATH)).into_response())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(LOGIN_PATH, get(login_form).post(login))
        .route("/accounts/logout", post(logout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_must_be_local() {
        assert_eq!(safe_next(Some("/cars?page=2")), "/cars?page=2");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(Some("/\\evil")), "/");
        assert_eq!(safe_next(None), "/");
    }

    #[test]
    fn next_with_control_characters_is_dropped() {
        assert_eq!(safe_next(Some("/\t/evil.example")), "/");
        assert_eq!(safe_next(Some("/\nx")), "/");
        assert_eq!(safe_next(Some("/cars\r\n")), "/");
        assert_eq!(safe_next(Some("/drivers?page=2")), "/drivers?page=2");
    }

    #[tokio::test]
    async fn login_form_echoes_next() {
        let Json(context) = login_form(Query(NextParam {
            next: Some("/drivers".into()),
        }))
        .await;
        assert_eq!(context.next, "/drivers");
        assert_eq!(context.fields, ["username", "password"]);
    }
}
