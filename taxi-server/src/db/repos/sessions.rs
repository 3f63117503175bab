//! Session repository
//!
//! Session data is stored as serialized JSON text.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::db::{DbError, SessionRepository};
use crate::models::{Session, SessionData};

/// Session repository
#[derive(Debug, Clone)]
pub struct PgSessionRepo {
    pool: PgPool,
}

impl PgSessionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepo {
    async fn load(&self, key: &str) -> Result<Option<Session>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT key, data, expires_at
            FROM sessions
            WHERE key = $1 AND expires_at > NOW()
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.get("data");
        let data: SessionData = serde_json::from_str(&raw)?;
        let expires_at: DateTime<Utc> = row.get("expires_at");

        Ok(Some(Session {
            key: row.get("key"),
            data,
            expires_at,
        }))
    }

    async fn save(&self, session: &Session) -> Result<(), DbError> {
        let data = serde_json::to_string(&session.data)?;
        sqlx::query(
            r#"
            INSERT INTO sessions (key, data, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO UPDATE
            SET data = EXCLUDED.data, expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(&session.key)
        .bind(data)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), DbError> {
        sqlx::query("DELETE FROM sessions WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn repo() -> PgSessionRepo {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url, 2).await.expect("pool");
        crate::db::migrations::run(&pool).await.expect("migrations");
        PgSessionRepo::new(pool)
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn save_and_load_round_trip() {
        let repo = repo().await;
        let mut session = Session::start(SessionData::for_user(1), Duration::minutes(5));
        session.data.record_visit();
        repo.save(&session).await.unwrap();

        let loaded = repo.load(&session.key).await.unwrap().unwrap();
        assert_eq!(loaded.data.num_visits, 1);

        repo.delete(&session.key).await.unwrap();
        assert!(repo.load(&session.key).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn expired_sessions_are_invisible() {
        let repo = repo().await;
        let session = Session::start(SessionData::for_user(1), Duration::seconds(-1));
        repo.save(&session).await.unwrap();
        assert!(repo.load(&session.key).await.unwrap().is_none());
        assert!(repo.purge_expired().await.unwrap() >= 1);
    }
}
