//! Car records and form

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use super::driver::DriverSummary;
use super::manufacturer::Manufacturer;
use super::validation::{required_text, FormErrors, ValidationError};

const MAX_MODEL_LEN: usize = 255;

/// Car row as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Car {
    pub id: i64,
    pub model: String,
    pub manufacturer_id: i64,
}

/// Car with its manufacturer loaded, for list display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarWithManufacturer {
    pub id: i64,
    pub model: String,
    pub manufacturer: Manufacturer,
}

/// Car with manufacturer and assigned drivers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarDetail {
    pub id: i64,
    pub model: String,
    pub manufacturer: Manufacturer,
    pub drivers: Vec<DriverSummary>,
}

/// Submitted car form. `manufacturer` and `drivers` hold primary keys as
/// submitted (numbers or numeric strings) and are checked in `validate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarForm {
    pub model: String,
    pub manufacturer: Value,
    pub drivers: Value,
}

impl From<&CarDetail> for CarForm {
    fn from(car: &CarDetail) -> Self {
        Self {
            model: car.model.clone(),
            manufacturer: Value::from(car.manufacturer.id),
            drivers: car.drivers.iter().map(|d| Value::from(d.id)).collect(),
        }
    }
}

/// Primary key from a submitted choice.
fn choice_id(field: &'static str, value: &Value) -> Result<i64, ValidationError> {
    let id = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    id.filter(|id| *id > 0)
        .ok_or_else(|| ValidationError::InvalidChoice {
            field,
            value: match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        })
}

fn parse_manufacturer(value: &Value) -> Result<i64, ValidationError> {
    match value {
        Value::Null => Err(ValidationError::Empty { field: "manufacturer" }),
        Value::String(s) if s.trim().is_empty() => {
            Err(ValidationError::Empty { field: "manufacturer" })
        }
        other => choice_id("manufacturer", other),
    }
}

fn parse_drivers(value: &Value) -> Result<Vec<i64>, ValidationError> {
    let mut ids = match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .map(|item| choice_id("drivers", item))
            .collect::<Result<Vec<_>, _>>()?,
        _ => {
            return Err(ValidationError::InvalidFormat {
                field: "drivers",
                reason: "Enter a list of values.",
            })
        }
    };
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

/// Validated car fields. Reference existence is checked on write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarInput {
    pub model: String,
    pub manufacturer_id: i64,
    pub driver_ids: Vec<i64>,
}

impl CarForm {
    pub const FIELDS: &'static [&'static str] = &["model", "manufacturer", "drivers"];

    pub fn validate(&self) -> Result<CarInput, FormErrors> {
        let mut errors = FormErrors::new();
        let model = errors.check(required_text("model", &self.model, MAX_MODEL_LEN));
        let manufacturer_id = errors.check(parse_manufacturer(&self.manufacturer));
        let driver_ids = errors.check(parse_drivers(&self.drivers));

        match (model, manufacturer_id, driver_ids) {
            (Some(model), Some(manufacturer_id), Some(driver_ids)) => Ok(CarInput {
                model,
                manufacturer_id,
                driver_ids,
            }),
            _ => Err(errors),
        }
    }
}
