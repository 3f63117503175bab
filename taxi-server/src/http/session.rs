//! Session cookie handling and the login gate
//!
//! `LoginRequired` is the authorization step every gated handler starts
//! with: it resolves the `sessionid` cookie to a live session and a driver,
//! or rejects with a redirect to the login page.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use super::error::ApiError;
use super::server::AppState;
use crate::db::DbError;
use crate::models::{Driver, Session, SessionData};

/// Cookie carrying the session key
pub const SESSION_COOKIE: &str = "sessionid";

const MAX_KEY_LEN: usize = 64;

/// Session key from the request's `Cookie` headers, if well-formed.
pub fn session_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| {
            !value.is_empty()
                && value.len() <= MAX_KEY_LEN
                && value.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(str::to_owned)
}

/// `Set-Cookie` value binding the browser to `session`.
pub fn session_cookie(session: &Session, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, session.key, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that expires the session cookie.
pub fn expired_session_cookie() -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE)
}

/// Authenticated request: live session plus the logged-in driver
#[derive(Debug)]
pub struct LoginRequired {
    pub user: Driver,
    session: Session,
    dirty: bool,
}

impl LoginRequired {
    pub fn session(&self) -> &SessionData {
        &self.session.data
    }

    /// Mutable session data; marks the session for saving.
    pub fn session_mut(&mut self) -> &mut SessionData {
        self.dirty = true;
        &mut self.session.data
    }

    /// Persist session changes, if any were made.
    pub async fn save(&mut self, state: &AppState) -> Result<(), ApiError> {
        if self.dirty {
            state.store.sessions.save(&self.session).await?;
            self.dirty = false;
        }
        Ok(())
    }
}

impl FromRequestParts<Arc<AppState>> for LoginRequired {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let next = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_owned())
            .unwrap_or_else(|| "/".to_owned());
        let reject = || ApiError::LoginRequired { next: next.clone() };

        let key = session_key(&parts.headers).ok_or_else(reject)?;
        let session = state.store.sessions.load(&key).await?.ok_or_else(reject)?;
        let user_id = session.data.user_id.ok_or_else(reject)?;

        let user = match state.store.drivers.get(user_id).await {
            Ok(user) => user,
            // account deleted while logged in
            Err(DbError::NotFound { .. }) => return Err(reject()),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            user,
            session,
            dirty: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn finds_session_among_other_cookies() {
        let h = headers("theme=dark; sessionid=abc123; lang=en");
        assert_eq!(session_key(&h).as_deref(), Some("abc123"));
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(session_key(&headers("sessionid=")).is_none());
        assert!(session_key(&headers("sessionid=../etc")).is_none());
        assert!(session_key(&headers(&format!("sessionid={}", "a".repeat(65)))).is_none());
        assert!(session_key(&HeaderMap::new()).is_none());
    }

    #[test]
    fn cookie_attributes() {
        let session = Session::start(SessionData::default(), chrono::Duration::seconds(60));
        let cookie = session_cookie(&session, 60, true);
        assert!(cookie.starts_with(&format!("sessionid={};", session.key)));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=60"));
        assert!(cookie.ends_with("; Secure"));
        assert!(expired_session_cookie().contains("Max-Age=0"));
    }
}
