//! Driver accounts
//!
//! A driver is the login identity of the service. The password hash never
//! leaves the repository layer.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::car::CarWithManufacturer;
use super::validation::{optional_text, required_text, FormErrors, ValidationError};

const MAX_USERNAME_LEN: usize = 150;
const MAX_NAME_LEN: usize = 150;
const MAX_EMAIL_LEN: usize = 254;
const MAX_LICENSE_LEN: usize = 255;

/// Letters, digits and @/./+/-/_ only
static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("invalid username regex"));

/// Driver record, without credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Driver {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub license_number: String,
    pub date_joined: DateTime<Utc>,
}

/// Compact driver reference, embedded in car contexts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DriverSummary {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
}

impl From<&Driver> for DriverSummary {
    fn from(d: &Driver) -> Self {
        Self {
            id: d.id,
            username: d.username.clone(),
            first_name: d.first_name.clone(),
            last_name: d.last_name.clone(),
            license_number: d.license_number.clone(),
        }
    }
}

/// Driver with cars and each car's manufacturer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverDetail {
    #[serde(flatten)]
    pub driver: Driver,
    pub cars: Vec<CarWithManufacturer>,
}

/// Validated fields for a new driver account
#[derive(Clone, PartialEq, Eq)]
pub struct NewDriver {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub license_number: String,
}

// Keeps the password out of logs.
impl std::fmt::Debug for NewDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewDriver")
            .field("username", &self.username)
            .field("license_number", &self.license_number)
            .finish_non_exhaustive()
    }
}

/// Raw account fields, as given on the command line
#[derive(Debug, Clone, Default)]
pub struct DriverForm {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub license_number: String,
}

impl DriverForm {
    pub fn validate(&self) -> Result<NewDriver, FormErrors> {
        let mut errors = FormErrors::new();

        let username = errors.check(
            required_text("username", &self.username, MAX_USERNAME_LEN).and_then(|u| {
                if USERNAME_RE.is_match(&u) {
                    Ok(u)
                } else {
                    Err(ValidationError::InvalidFormat {
                        field: "username",
                        reason: "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
                    })
                }
            }),
        );
        let password = if self.password.is_empty() {
            errors.push(ValidationError::Empty { field: "password" });
            None
        } else {
            Some(self.password.clone())
        };
        let first_name = errors.check(optional_text("first_name", &self.first_name, MAX_NAME_LEN));
        let last_name = errors.check(optional_text("last_name", &self.last_name, MAX_NAME_LEN));
        let email = errors.check(optional_text("email", &self.email, MAX_EMAIL_LEN));
        let license_number =
            errors.check(required_text("license_number", &self.license_number, MAX_LICENSE_LEN));

        match (username, password, first_name, last_name, email, license_number) {
            (
                Some(username),
                Some(password),
                Some(first_name),
                Some(last_name),
                Some(email),
                Some(license_number),
            ) => Ok(NewDriver {
                username,
                password,
                first_name,
                last_name,
                email,
                license_number,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> DriverForm {
        DriverForm {
            username: "ivan".into(),
            password: "s3cret".into(),
            license_number: "ABC12345".into(),
            ..DriverForm::default()
        }
    }

    #[test]
    fn valid_driver() {
        let driver = form().validate().unwrap();
        assert_eq!(driver.username, "ivan");
        assert_eq!(driver.email, "");
    }

    #[test]
    fn rejects_username_with_spaces() {
        let mut f = form();
        f.username = "ivan petrov".into();
        let errors = f.validate().unwrap_err();
        assert!(errors.get("username").is_some());
    }

    #[test]
    fn license_number_required() {
        let mut f = form();
        f.license_number = " ".into();
        let errors = f.validate().unwrap_err();
        assert!(errors.get("license_number").is_some());
    }

    #[test]
    fn debug_hides_password() {
        let driver = form().validate().unwrap();
        assert!(!format!("{:?}", driver).contains("s3cret"));
    }
}
