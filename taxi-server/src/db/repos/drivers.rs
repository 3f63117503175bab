//! Driver repository
//!
//! Passwords are hashed and checked inside Postgres with pgcrypto
//! (`crypt` + `gen_salt('bf')`); plaintext is only ever a bind parameter.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::{limit_offset, map_write_error};
use crate::db::{DbError, DriverRepository};
use crate::models::{CarWithManufacturer, Driver, DriverDetail, DriverSummary, Manufacturer, NewDriver, Pagination};

const DRIVER_COLUMNS: &str =
    "id, username, first_name, last_name, email, license_number, date_joined";

/// Driver repository
#[derive(Debug, Clone)]
pub struct PgDriverRepo {
    pool: PgPool,
}

impl PgDriverRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DriverRepository for PgDriverRepo {
    async fn count(&self) -> Result<i64, DbError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM drivers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list(&self, page: Pagination) -> Result<Vec<Driver>, DbError> {
        let (limit, offset) = limit_offset(page);
        let sql = format!(
            "SELECT {DRIVER_COLUMNS} FROM drivers ORDER BY username LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, Driver>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn all(&self) -> Result<Vec<DriverSummary>, DbError> {
        let rows = sqlx::query_as::<_, DriverSummary>(
            r#"
            SELECT id, username, first_name, last_name, license_number
            FROM drivers
            ORDER BY username
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get(&self, id: i64) -> Result<Driver, DbError> {
        let sql = format!("SELECT {DRIVER_COLUMNS} FROM drivers WHERE id = $1");
        sqlx::query_as::<_, Driver>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("driver", id))
    }

    async fn detail(&self, id: i64) -> Result<DriverDetail, DbError> {
        let driver = self.get(id).await?;

        // cars and their manufacturers in one JOIN
        let rows = sqlx::query(
            r#"
            SELECT
                c.id,
                c.model,
                m.id AS manufacturer_id,
                m.name AS manufacturer_name,
                m.country AS manufacturer_country
            FROM cars_drivers cd
            JOIN cars c ON c.id = cd.car_id
            JOIN manufacturers m ON m.id = c.manufacturer_id
            WHERE cd.driver_id = $1
            ORDER BY c.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let cars = rows
            .iter()
            .map(|r| CarWithManufacturer {
                id: r.get("id"),
                model: r.get("model"),
                manufacturer: Manufacturer {
                    id: r.get("manufacturer_id"),
                    name: r.get("manufacturer_name"),
                    country: r.get("manufacturer_country"),
                },
            })
            .collect();

        Ok(DriverDetail { driver, cars })
    }

    async fn create(&self, input: &NewDriver) -> Result<Driver, DbError> {
        let sql = format!(
            r#"
            INSERT INTO drivers (username, password_hash, first_name, last_name, email, license_number)
            VALUES ($1, crypt($2, gen_salt('bf')), $3, $4, $5, $6)
            RETURNING {DRIVER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Driver>(&sql)
            .bind(&input.username)
            .bind(&input.password)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .bind(&input.license_number)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, 0))
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<Driver>, DbError> {
        let sql = format!(
            r#"
            SELECT {DRIVER_COLUMNS}
            FROM drivers
            WHERE username = $1 AND password_hash = crypt($2, password_hash)
            "#
        );
        let driver = sqlx::query_as::<_, Driver>(&sql)
            .bind(username)
            .bind(password)
            .fetch_optional(&self.pool)
            .await?;
        Ok(driver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repo() -> PgDriverRepo {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url, 2).await.expect("pool");
        crate::db::migrations::run(&pool).await.expect("migrations");
        PgDriverRepo::new(pool)
    }

    fn new_driver(tag: &str) -> NewDriver {
        NewDriver {
            username: format!("u{tag}"),
            password: "correct horse".into(),
            first_name: "Test".into(),
            last_name: "Driver".into(),
            email: String::new(),
            license_number: format!("LIC{tag}"),
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn authenticate_checks_password() {
        let repo = repo().await;
        let tag = crate::models::session::new_session_key();
        let driver = repo.create(&new_driver(&tag)).await.unwrap();

        let ok = repo.authenticate(&driver.username, "correct horse").await.unwrap();
        assert_eq!(ok.map(|d| d.id), Some(driver.id));

        let bad = repo.authenticate(&driver.username, "wrong").await.unwrap();
        assert!(bad.is_none());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn license_number_is_unique() {
        let repo = repo().await;
        let tag = crate::models::session::new_session_key();
        repo.create(&new_driver(&tag)).await.unwrap();

        let mut other = new_driver(&tag);
        other.username = format!("other{tag}");
        let err = repo.create(&other).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Conflict {
                field: "license_number",
                ..
            }
        ));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn detail_carries_each_car_manufacturer() {
        use crate::db::repos::{PgCarRepo, PgManufacturerRepo};
        use crate::db::{CarRepository, ManufacturerRepository};
        use crate::models::{CarInput, ManufacturerInput};

        let repo = repo().await;
        let tag = crate::models::session::new_session_key();
        let driver = repo.create(&new_driver(&tag)).await.unwrap();
        let makers = PgManufacturerRepo::new(repo.pool.clone());
        let cars = PgCarRepo::new(repo.pool.clone());

        let mut made = Vec::new();
        for name in ["Kia", "Seat"] {
            let manufacturer = makers
                .create(&ManufacturerInput {
                    name: format!("{name}-{tag}"),
                    country: "Korea".into(),
                })
                .await
                .unwrap();
            cars.create(&CarInput {
                model: format!("{name} model"),
                manufacturer_id: manufacturer.id,
                driver_ids: vec![driver.id],
            })
            .await
            .unwrap();
            made.push(manufacturer);
        }

        let detail = repo.detail(driver.id).await.unwrap();
        assert_eq!(detail.driver.id, driver.id);
        assert_eq!(detail.cars.len(), 2);
        for (car, manufacturer) in detail.cars.iter().zip(&made) {
            assert_eq!(car.manufacturer, *manufacturer);
        }

        for manufacturer in made {
            makers.delete(manufacturer.id).await.unwrap();
        }
    }
}
