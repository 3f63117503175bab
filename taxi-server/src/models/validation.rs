//! Validation error types and field helpers

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Validation error for a single form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field is missing or blank
    Empty { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// String doesn't match required format (e.g., username charset)
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Referenced record does not exist
    InvalidChoice { field: &'static str, value: String },

    /// Unique constraint would be violated
    Duplicate { field: &'static str, entity: &'static str },
}

impl ValidationError {
    /// Name of the offending form field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Empty { field }
            | Self::TooLong { field, .. }
            | Self::InvalidFormat { field, .. }
            | Self::InvalidChoice { field, .. }
            | Self::Duplicate { field, .. } => field,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { .. } => write!(f, "This field is required."),
            Self::TooLong { max, .. } => {
                write!(f, "Ensure this value has at most {} characters.", max)
            }
            Self::InvalidFormat { reason, .. } => write!(f, "{}", reason),
            Self::InvalidChoice { value, .. } => write!(
                f,
                "Select a valid choice. {} is not one of the available choices.",
                value
            ),
            Self::Duplicate { field, entity } => {
                write!(f, "{} with this {} already exists.", entity, field.replace('_', " "))
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Field-keyed collection of validation errors, shaped for form re-rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: ValidationError) {
        self.0.entry(err.field()).or_default().push(err.to_string());
    }

    /// Record the error side of `result`, passing the value through.
    pub fn check<T>(&mut self, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.push(err);
                None
            }
        }
    }

    /// Form-wide error not tied to a single field.
    pub fn non_field(&mut self, message: impl Into<String>) {
        self.0.entry("__all__").or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

/// One `field: message` pair per line
impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    writeln!(f)?;
                }
                first = false;
                write!(f, "{}: {}", field, message)?;
            }
        }
        Ok(())
    }
}

impl From<ValidationError> for FormErrors {
    fn from(err: ValidationError) -> Self {
        let mut errors = Self::new();
        errors.push(err);
        errors
    }
}

/// Trimmed, non-blank string of at most `max` characters.
pub fn required_text(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    bounded(field, value, max)
}

/// Trimmed string of at most `max` characters; blank is allowed.
pub fn optional_text(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    bounded(field, value.trim(), max)
}

fn bounded(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(value.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::TooLong {
            field: "name",
            max: 255,
        };
        assert_eq!(
            err.to_string(),
            "Ensure this value has at most 255 characters."
        );

        let err = ValidationError::Duplicate {
            field: "license_number",
            entity: "Driver",
        };
        assert_eq!(err.to_string(), "Driver with this license number already exists.");
    }

    #[test]
    fn required_text_trims_and_rejects_blank() {
        assert_eq!(required_text("name", "  Toyota ", 255).unwrap(), "Toyota");
        assert_eq!(
            required_text("name", "   ", 255).unwrap_err(),
            ValidationError::Empty { field: "name" }
        );
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let name = "é".repeat(10);
        assert!(required_text("name", &name, 10).is_ok());
        assert!(required_text("name", &name, 9).is_err());
    }

    #[test]
    fn form_errors_group_by_field() {
        let mut errors = FormErrors::new();
        errors.push(ValidationError::Empty { field: "name" });
        errors.push(ValidationError::TooLong { field: "name", max: 3 });
        errors.push(ValidationError::Empty { field: "country" });

        assert_eq!(errors.get("name").map(<[String]>::len), Some(2));
        assert_eq!(errors.get("country").map(<[String]>::len), Some(1));
        assert!(errors.get("model").is_none());
    }

    #[test]
    fn form_errors_display_one_per_line() {
        let mut errors = FormErrors::new();
        errors.push(ValidationError::Empty { field: "username" });
        errors.non_field("bad login");
        assert_eq!(
            errors.to_string(),
            "__all__: bad login\nusername: This field is required."
        );
    }
}
