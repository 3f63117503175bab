//! Per-visitor session state

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Contents of a session, stored as JSON
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionData {
    /// Logged-in driver
    pub user_id: Option<i64>,
    /// Dashboard visit counter
    pub num_visits: u64,
    /// Flash messages waiting for the next rendered page
    pub messages: Vec<String>,
}

impl SessionData {
    pub fn for_user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    /// Increment the visit counter and return the new value.
    pub fn record_visit(&mut self) -> u64 {
        self.num_visits = self.num_visits.saturating_add(1);
        self.num_visits
    }

    pub fn push_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Drain pending flash messages.
    pub fn take_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }
}

/// A stored session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub key: String,
    pub data: SessionData,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Start a fresh session with a random key.
    pub fn start(data: SessionData, ttl: Duration) -> Self {
        Self {
            key: new_session_key(),
            data,
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Random opaque session key (32 lowercase hex chars)
pub fn new_session_key() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visit_counter_starts_at_one() {
        let mut data = SessionData::default();
        assert_eq!(data.record_visit(), 1);
        assert_eq!(data.record_visit(), 2);
        assert_eq!(data.num_visits, 2);
    }

    #[test]
    fn messages_are_drained_once() {
        let mut data = SessionData::default();
        data.push_message("Toyota has been successfully created");
        assert_eq!(data.take_messages().len(), 1);
        assert!(data.take_messages().is_empty());
    }

    #[test]
    fn missing_keys_default() {
        let data: SessionData = serde_json::from_str(r#"{"user_id": 4}"#).unwrap();
        assert_eq!(data.user_id, Some(4));
        assert_eq!(data.num_visits, 0);
    }

    #[test]
    fn session_keys_are_unique_hex() {
        let a = new_session_key();
        let b = new_session_key();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn expiry() {
        let session = Session::start(SessionData::default(), Duration::seconds(10));
        assert!(!session.is_expired(Utc::now()));
        assert!(session.is_expired(Utc::now() + Duration::seconds(11)));
    }
}
