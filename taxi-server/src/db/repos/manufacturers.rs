//! Manufacturer repository

use async_trait::async_trait;
use sqlx::PgPool;

use super::{limit_offset, map_write_error};
use crate::db::{DbError, ManufacturerRepository};
use crate::models::{Manufacturer, ManufacturerInput, Pagination};

/// Manufacturer repository
#[derive(Debug, Clone)]
pub struct PgManufacturerRepo {
    pool: PgPool,
}

impl PgManufacturerRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ManufacturerRepository for PgManufacturerRepo {
    async fn count(&self) -> Result<i64, DbError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM manufacturers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list(&self, page: Pagination) -> Result<Vec<Manufacturer>, DbError> {
        let (limit, offset) = limit_offset(page);
        let rows = sqlx::query_as::<_, Manufacturer>(
            r#"
            SELECT id, name, country
            FROM manufacturers
            ORDER BY name, id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn all(&self) -> Result<Vec<Manufacturer>, DbError> {
        let rows = sqlx::query_as::<_, Manufacturer>(
            "SELECT id, name, country FROM manufacturers ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get(&self, id: i64) -> Result<Manufacturer, DbError> {
        sqlx::query_as::<_, Manufacturer>(
            "SELECT id, name, country FROM manufacturers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("manufacturer", id))
    }

    async fn create(&self, input: &ManufacturerInput) -> Result<Manufacturer, DbError> {
        sqlx::query_as::<_, Manufacturer>(
            r#"
            INSERT INTO manufacturers (name, country)
            VALUES ($1, $2)
            RETURNING id, name, country
            "#,
        )
        .bind(&input.name)
        .bind(&input.country)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, 0))
    }

    async fn update(&self, id: i64, input: &ManufacturerInput) -> Result<Manufacturer, DbError> {
        sqlx::query_as::<_, Manufacturer>(
            r#"
            UPDATE manufacturers
            SET name = $2, country = $3
            WHERE id = $1
            RETURNING id, name, country
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.country)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, 0))?
        .ok_or_else(|| DbError::not_found("manufacturer", id))
    }

    async fn delete(&self, id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM manufacturers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("manufacturer", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Integration tests - run with DATABASE_URL set
    // cargo test -p taxi-server -- --ignored

    async fn repo() -> PgManufacturerRepo {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url, 2).await.expect("pool");
        crate::db::migrations::run(&pool).await.expect("migrations");
        PgManufacturerRepo::new(pool)
    }

    fn unique_name(prefix: &str) -> String {
        format!("{}-{}", prefix, crate::models::session::new_session_key())
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_update_delete() {
        let repo = repo().await;
        let input = ManufacturerInput {
            name: unique_name("Lada"),
            country: "Russia".into(),
        };
        let created = repo.create(&input).await.unwrap();
        assert_eq!(repo.get(created.id).await.unwrap(), created);

        let renamed = ManufacturerInput {
            name: unique_name("AvtoVAZ"),
            country: "Russia".into(),
        };
        let updated = repo.update(created.id, &renamed).await.unwrap();
        assert_eq!(updated.name, renamed.name);

        repo.delete(created.id).await.unwrap();
        assert!(matches!(
            repo.get(created.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn duplicate_name_is_conflict() {
        let repo = repo().await;
        let input = ManufacturerInput {
            name: unique_name("Skoda"),
            country: "Czechia".into(),
        };
        let created = repo.create(&input).await.unwrap();
        let err = repo.create(&input).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { field: "name", .. }));
        repo.delete(created.id).await.unwrap();
    }
}
