//! Car repository
//!
//! - list: JOIN manufacturers (one query per page)
//! - create/update: car row and driver links in one transaction

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Row};

use super::{limit_offset, map_write_error};
use crate::db::{CarRepository, DbError};
use crate::models::{Car, CarDetail, CarInput, CarWithManufacturer, DriverSummary, Manufacturer, Pagination};

/// Car repository
#[derive(Debug, Clone)]
pub struct PgCarRepo {
    pool: PgPool,
}

impl PgCarRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn car_with_manufacturer(row: &sqlx::postgres::PgRow) -> CarWithManufacturer {
    CarWithManufacturer {
        id: row.get("id"),
        model: row.get("model"),
        manufacturer: Manufacturer {
            id: row.get("manufacturer_id"),
            name: row.get("manufacturer_name"),
            country: row.get("manufacturer_country"),
        },
    }
}

/// Replace the driver set of `car_id`, rejecting unknown driver ids.
async fn replace_drivers(conn: &mut PgConnection, car_id: i64, driver_ids: &[i64]) -> Result<(), DbError> {
    if !driver_ids.is_empty() {
        let found: Vec<i64> = sqlx::query_scalar("SELECT id FROM drivers WHERE id = ANY($1)")
            .bind(driver_ids)
            .fetch_all(&mut *conn)
            .await?;
        if let Some(missing) = driver_ids.iter().find(|id| !found.contains(id)) {
            return Err(DbError::InvalidReference {
                field: "drivers",
                id: *missing,
            });
        }
    }

    sqlx::query("DELETE FROM cars_drivers WHERE car_id = $1")
        .bind(car_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO cars_drivers (car_id, driver_id)
        SELECT $1, UNNEST($2::BIGINT[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(car_id)
    .bind(driver_ids)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[async_trait]
impl CarRepository for PgCarRepo {
    async fn count(&self) -> Result<i64, DbError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cars")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list(&self, page: Pagination) -> Result<Vec<CarWithManufacturer>, DbError> {
        let (limit, offset) = limit_offset(page);
        let rows = sqlx::query(
            r#"
            SELECT
                c.id,
                c.model,
                m.id AS manufacturer_id,
                m.name AS manufacturer_name,
                m.country AS manufacturer_country
            FROM cars c
            JOIN manufacturers m ON m.id = c.manufacturer_id
            ORDER BY c.id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(car_with_manufacturer).collect())
    }

    async fn get(&self, id: i64) -> Result<CarDetail, DbError> {
        let row = sqlx::query(
            r#"
            SELECT
                c.id,
                c.model,
                m.id AS manufacturer_id,
                m.name AS manufacturer_name,
                m.country AS manufacturer_country
            FROM cars c
            JOIN manufacturers m ON m.id = c.manufacturer_id
            WHERE c.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("car", id))?;
        let car = car_with_manufacturer(&row);

        let drivers = sqlx::query_as::<_, DriverSummary>(
            r#"
            SELECT d.id, d.username, d.first_name, d.last_name, d.license_number
            FROM cars_drivers cd
            JOIN drivers d ON d.id = cd.driver_id
            WHERE cd.car_id = $1
            ORDER BY d.username
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(CarDetail {
            id: car.id,
            model: car.model,
            manufacturer: car.manufacturer,
            drivers,
        })
    }

    async fn create(&self, input: &CarInput) -> Result<Car, DbError> {
        let mut tx = self.pool.begin().await?;

        let car: Car = sqlx::query_as(
            r#"
            INSERT INTO cars (model, manufacturer_id)
            VALUES ($1, $2)
            RETURNING id, model, manufacturer_id
            "#,
        )
        .bind(&input.model)
        .bind(input.manufacturer_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, input.manufacturer_id))?;

        replace_drivers(&mut tx, car.id, &input.driver_ids).await?;

        tx.commit().await?;
        Ok(car)
    }

    async fn update(&self, id: i64, input: &CarInput) -> Result<Car, DbError> {
        let mut tx = self.pool.begin().await?;

        let car: Car = sqlx::query_as(
            r#"
            UPDATE cars
            SET model = $2, manufacturer_id = $3
            WHERE id = $1
            RETURNING id, model, manufacturer_id
            "#,
        )
        .bind(id)
        .bind(&input.model)
        .bind(input.manufacturer_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, input.manufacturer_id))?
        .ok_or_else(|| DbError::not_found("car", id))?;

        replace_drivers(&mut tx, car.id, &input.driver_ids).await?;

        tx.commit().await?;
        Ok(car)
    }

    async fn delete(&self, id: i64) -> Result<(), DbError> {
        // cars_drivers rows go with the car (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM cars WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("car", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repos::{PgDriverRepo, PgManufacturerRepo};
    use crate::db::{DriverRepository, ManufacturerRepository};
    use crate::models::{ManufacturerInput, NewDriver};

    async fn pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url, 2).await.expect("pool");
        crate::db::migrations::run(&pool).await.expect("migrations");
        pool
    }

    fn suffix() -> String {
        crate::models::session::new_session_key()
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn delete_removes_driver_links() {
        let pool = pool().await;
        let tag = suffix();
        let manufacturer = PgManufacturerRepo::new(pool.clone())
            .create(&ManufacturerInput {
                name: format!("Volvo-{tag}"),
                country: "Sweden".into(),
            })
            .await
            .unwrap();
        let driver = PgDriverRepo::new(pool.clone())
            .create(&NewDriver {
                username: format!("d{tag}"),
                password: "pw".into(),
                first_name: String::new(),
                last_name: String::new(),
                email: String::new(),
                license_number: format!("L{tag}"),
            })
            .await
            .unwrap();

        let cars = PgCarRepo::new(pool.clone());
        let car = cars
            .create(&CarInput {
                model: "XC90".into(),
                manufacturer_id: manufacturer.id,
                driver_ids: vec![driver.id],
            })
            .await
            .unwrap();
        assert_eq!(cars.get(car.id).await.unwrap().drivers.len(), 1);

        cars.delete(car.id).await.unwrap();
        let detail = PgDriverRepo::new(pool.clone()).detail(driver.id).await.unwrap();
        assert!(detail.cars.is_empty());

        PgManufacturerRepo::new(pool).delete(manufacturer.id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn unknown_manufacturer_is_invalid_reference() {
        let cars = PgCarRepo::new(pool().await);
        let err = cars
            .create(&CarInput {
                model: "Ghost".into(),
                manufacturer_id: i64::MAX,
                driver_ids: vec![],
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::InvalidReference {
                field: "manufacturer",
                ..
            }
        ));
    }
}
