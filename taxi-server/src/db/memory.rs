//! In-memory store
//!
//! Implements every repository trait over plain maps behind one async
//! mutex. Mirrors the Postgres constraints: unique names, license numbers
//! and usernames, foreign keys, and cascading deletes.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{CarRepository, DbError, DriverRepository, ManufacturerRepository, SessionRepository};
use crate::models::{
    Car, CarDetail, CarInput, CarWithManufacturer, Driver, DriverDetail, DriverSummary,
    Manufacturer, ManufacturerInput, NewDriver, Pagination, Session,
};

/// Driver row plus credentials. A salted blake3 digest is enough for tests
/// and demos; it is not a password hash for production credentials.
struct StoredDriver {
    driver: Driver,
    salt: [u8; 16],
    password_hash: blake3::Hash,
}

fn hash_password(salt: &[u8; 16], password: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize()
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    manufacturers: BTreeMap<i64, Manufacturer>,
    cars: BTreeMap<i64, Car>,
    /// (car_id, driver_id)
    car_drivers: BTreeSet<(i64, i64)>,
    drivers: BTreeMap<i64, StoredDriver>,
    sessions: HashMap<String, Session>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn manufacturer(&self, id: i64) -> Result<&Manufacturer, DbError> {
        self.manufacturers
            .get(&id)
            .ok_or_else(|| DbError::not_found("manufacturer", id))
    }

    fn check_manufacturer_name(&self, name: &str, except: Option<i64>) -> Result<(), DbError> {
        if self
            .manufacturers
            .values()
            .any(|m| m.name == name && Some(m.id) != except)
        {
            return Err(DbError::Conflict {
                resource: "Manufacturer",
                field: "name",
            });
        }
        Ok(())
    }

    fn check_car_references(&self, input: &CarInput) -> Result<(), DbError> {
        if !self.manufacturers.contains_key(&input.manufacturer_id) {
            return Err(DbError::InvalidReference {
                field: "manufacturer",
                id: input.manufacturer_id,
            });
        }
        if let Some(missing) = input
            .driver_ids
            .iter()
            .find(|id| !self.drivers.contains_key(id))
        {
            return Err(DbError::InvalidReference {
                field: "drivers",
                id: *missing,
            });
        }
        Ok(())
    }

    fn set_drivers(&mut self, car_id: i64, driver_ids: &[i64]) {
        self.car_drivers.retain(|(car, _)| *car != car_id);
        self.car_drivers
            .extend(driver_ids.iter().map(|driver| (car_id, *driver)));
    }

    fn remove_car(&mut self, car_id: i64) -> bool {
        self.car_drivers.retain(|(car, _)| *car != car_id);
        self.cars.remove(&car_id).is_some()
    }

    fn car_with_manufacturer(&self, car: &Car) -> Result<CarWithManufacturer, DbError> {
        Ok(CarWithManufacturer {
            id: car.id,
            model: car.model.clone(),
            manufacturer: self.manufacturer(car.manufacturer_id)?.clone(),
        })
    }

    fn sorted_drivers(&self) -> Vec<&Driver> {
        let mut drivers: Vec<&Driver> = self.drivers.values().map(|s| &s.driver).collect();
        drivers.sort_by(|a, b| a.username.cmp(&b.username));
        drivers
    }

    fn sorted_manufacturers(&self) -> Vec<&Manufacturer> {
        let mut manufacturers: Vec<&Manufacturer> = self.manufacturers.values().collect();
        manufacturers.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        manufacturers
    }
}

fn page_of<T: Clone>(items: impl Iterator<Item = T>, page: Pagination) -> Vec<T> {
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    items.skip(offset).take(page.limit() as usize).collect()
}

fn count_of(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

/// Process-local store implementing all repositories
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ManufacturerRepository for MemoryStore {
    async fn count(&self) -> Result<i64, DbError> {
        Ok(count_of(self.tables.lock().await.manufacturers.len()))
    }

    async fn list(&self, page: Pagination) -> Result<Vec<Manufacturer>, DbError> {
        let tables = self.tables.lock().await;
        Ok(page_of(tables.sorted_manufacturers().into_iter().cloned(), page))
    }

    async fn all(&self) -> Result<Vec<Manufacturer>, DbError> {
        let tables = self.tables.lock().await;
        Ok(tables.sorted_manufacturers().into_iter().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Manufacturer, DbError> {
        self.tables.lock().await.manufacturer(id).cloned()
    }

    async fn create(&self, input: &ManufacturerInput) -> Result<Manufacturer, DbError> {
        let mut tables = self.tables.lock().await;
        tables.check_manufacturer_name(&input.name, None)?;
        let manufacturer = Manufacturer {
            id: tables.next_id(),
            name: input.name.clone(),
            country: input.country.clone(),
        };
        tables
            .manufacturers
            .insert(manufacturer.id, manufacturer.clone());
        Ok(manufacturer)
    }

    async fn update(&self, id: i64, input: &ManufacturerInput) -> Result<Manufacturer, DbError> {
        let mut tables = self.tables.lock().await;
        tables.manufacturer(id)?;
        tables.check_manufacturer_name(&input.name, Some(id))?;
        let manufacturer = Manufacturer {
            id,
            name: input.name.clone(),
            country: input.country.clone(),
        };
        tables.manufacturers.insert(id, manufacturer.clone());
        Ok(manufacturer)
    }

    async fn delete(&self, id: i64) -> Result<(), DbError> {
        let mut tables = self.tables.lock().await;
        if tables.manufacturers.remove(&id).is_none() {
            return Err(DbError::not_found("manufacturer", id));
        }
        let orphaned: Vec<i64> = tables
            .cars
            .values()
            .filter(|c| c.manufacturer_id == id)
            .map(|c| c.id)
            .collect();
        for car_id in orphaned {
            tables.remove_car(car_id);
        }
        Ok(())
    }
}

#[async_trait]
impl CarRepository for MemoryStore {
    async fn count(&self) -> Result<i64, DbError> {
        Ok(count_of(self.tables.lock().await.cars.len()))
    }

    async fn list(&self, page: Pagination) -> Result<Vec<CarWithManufacturer>, DbError> {
        let tables = self.tables.lock().await;
        page_of(tables.cars.values(), page)
            .into_iter()
            .map(|car| tables.car_with_manufacturer(car))
            .collect()
    }

    async fn get(&self, id: i64) -> Result<CarDetail, DbError> {
        let tables = self.tables.lock().await;
        let car = tables
            .cars
            .get(&id)
            .ok_or_else(|| DbError::not_found("car", id))?;
        let mut drivers: Vec<DriverSummary> = tables
            .car_drivers
            .iter()
            .filter(|(car_id, _)| *car_id == id)
            .filter_map(|(_, driver_id)| tables.drivers.get(driver_id))
            .map(|s| DriverSummary::from(&s.driver))
            .collect();
        drivers.sort_by(|a, b| a.username.cmp(&b.username));

        Ok(CarDetail {
            id: car.id,
            model: car.model.clone(),
            manufacturer: tables.manufacturer(car.manufacturer_id)?.clone(),
            drivers,
        })
    }

    async fn create(&self, input: &CarInput) -> Result<Car, DbError> {
        let mut tables = self.tables.lock().await;
        tables.check_car_references(input)?;
        let car = Car {
            id: tables.next_id(),
            model: input.model.clone(),
            manufacturer_id: input.manufacturer_id,
        };
        tables.cars.insert(car.id, car.clone());
        tables.set_drivers(car.id, &input.driver_ids);
        Ok(car)
    }

    async fn update(&self, id: i64, input: &CarInput) -> Result<Car, DbError> {
        let mut tables = self.tables.lock().await;
        if !tables.cars.contains_key(&id) {
            return Err(DbError::not_found("car", id));
        }
        tables.check_car_references(input)?;
        let car = Car {
            id,
            model: input.model.clone(),
            manufacturer_id: input.manufacturer_id,
        };
        tables.cars.insert(id, car.clone());
        tables.set_drivers(id, &input.driver_ids);
        Ok(car)
    }

    async fn delete(&self, id: i64) -> Result<(), DbError> {
        if self.tables.lock().await.remove_car(id) {
            Ok(())
        } else {
            Err(DbError::not_found("car", id))
        }
    }
}

#[async_trait]
impl DriverRepository for MemoryStore {
    async fn count(&self) -> Result<i64, DbError> {
        Ok(count_of(self.tables.lock().await.drivers.len()))
    }

    async fn list(&self, page: Pagination) -> Result<Vec<Driver>, DbError> {
        let tables = self.tables.lock().await;
        Ok(page_of(tables.sorted_drivers().into_iter().cloned(), page))
    }

    async fn all(&self) -> Result<Vec<DriverSummary>, DbError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .sorted_drivers()
            .into_iter()
            .map(DriverSummary::from)
            .collect())
    }

    async fn get(&self, id: i64) -> Result<Driver, DbError> {
        self.tables
            .lock()
            .await
            .drivers
            .get(&id)
            .map(|s| s.driver.clone())
            .ok_or_else(|| DbError::not_found("driver", id))
    }

    async fn detail(&self, id: i64) -> Result<DriverDetail, DbError> {
        let tables = self.tables.lock().await;
        let driver = tables
            .drivers
            .get(&id)
            .map(|s| s.driver.clone())
            .ok_or_else(|| DbError::not_found("driver", id))?;
        let cars = tables
            .car_drivers
            .iter()
            .filter(|(_, driver_id)| *driver_id == id)
            .filter_map(|(car_id, _)| tables.cars.get(car_id))
            .map(|car| tables.car_with_manufacturer(car))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DriverDetail { driver, cars })
    }

    async fn create(&self, input: &NewDriver) -> Result<Driver, DbError> {
        let mut tables = self.tables.lock().await;
        for stored in tables.drivers.values() {
            if stored.driver.username == input.username {
                return Err(DbError::Conflict {
                    resource: "Driver",
                    field: "username",
                });
            }
            if stored.driver.license_number == input.license_number {
                return Err(DbError::Conflict {
                    resource: "Driver",
                    field: "license_number",
                });
            }
        }

        let driver = Driver {
            id: tables.next_id(),
            username: input.username.clone(),
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            email: input.email.clone(),
            license_number: input.license_number.clone(),
            date_joined: Utc::now(),
        };
        let salt: [u8; 16] = rand::random();
        let password_hash = hash_password(&salt, &input.password);
        tables.drivers.insert(
            driver.id,
            StoredDriver {
                driver: driver.clone(),
                salt,
                password_hash,
            },
        );
        Ok(driver)
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<Driver>, DbError> {
        let tables = self.tables.lock().await;
        let found = tables
            .drivers
            .values()
            .find(|s| s.driver.username == username)
            // blake3::Hash equality is constant-time
            .filter(|s| hash_password(&s.salt, password) == s.password_hash)
            .map(|s| s.driver.clone());
        Ok(found)
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<Session>, DbError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .sessions
            .get(key)
            .filter(|s| !s.is_expired(Utc::now()))
            .cloned())
    }

    async fn save(&self, session: &Session) -> Result<(), DbError> {
        self.tables
            .lock()
            .await
            .sessions
            .insert(session.key.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), DbError> {
        self.tables.lock().await.sessions.remove(key);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, DbError> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| !s.is_expired(now));
        Ok((before - tables.sessions.len()) as u64)
    }
}
