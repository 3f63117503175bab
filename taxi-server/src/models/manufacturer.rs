//! Manufacturer records and form

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::validation::{required_text, FormErrors};

const MAX_NAME_LEN: usize = 255;
const MAX_COUNTRY_LEN: usize = 255;

/// Manufacturer record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Manufacturer {
    pub id: i64,
    pub name: String,
    pub country: String,
}

/// Submitted manufacturer form (all model fields)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManufacturerForm {
    pub name: String,
    pub country: String,
}

impl From<&Manufacturer> for ManufacturerForm {
    fn from(m: &Manufacturer) -> Self {
        Self {
            name: m.name.clone(),
            country: m.country.clone(),
        }
    }
}

/// Validated manufacturer fields, ready to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManufacturerInput {
    pub name: String,
    pub country: String,
}

impl ManufacturerForm {
    pub const FIELDS: &'static [&'static str] = &["name", "country"];

    pub fn validate(&self) -> Result<ManufacturerInput, FormErrors> {
        let mut errors = FormErrors::new();
        let name = errors.check(required_text("name", &self.name, MAX_NAME_LEN));
        let country = errors.check(required_text("country", &self.country, MAX_COUNTRY_LEN));

        match (name, country) {
            (Some(name), Some(country)) => Ok(ManufacturerInput { name, country }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_form() {
        let form = ManufacturerForm {
            name: " Toyota ".into(),
            country: "Japan".into(),
        };
        let input = form.validate().unwrap();
        assert_eq!(input.name, "Toyota");
        assert_eq!(input.country, "Japan");
    }

    #[test]
    fn missing_fields_reported_together() {
        let errors = ManufacturerForm::default().validate().unwrap_err();
        assert!(errors.get("name").is_some());
        assert!(errors.get("country").is_some());
    }

    #[test]
    fn missing_keys_deserialize_as_blank() {
        let form: ManufacturerForm = serde_json::from_str(r#"{"name": "Fiat"}"#).unwrap();
        assert_eq!(form.country, "");
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.get("country"),
            Some(&["This field is required.".to_owned()][..])
        );
    }

    #[test]
    fn name_too_long() {
        let form = ManufacturerForm {
            name: "x".repeat(256),
            country: "Italy".into(),
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.get("name").is_some());
    }
}
