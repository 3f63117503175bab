//! PostgreSQL repository implementations
//!
//! Each repository follows these patterns:
//! - Uses JOINs for eager loading (no N+1)
//! - Maps named constraint violations to `DbError::Conflict`/`InvalidReference`
//! - Uses transactions for multi-step operations

pub mod manufacturers;
pub mod cars;
pub mod drivers;
pub mod sessions;

pub use manufacturers::PgManufacturerRepo;
pub use cars::PgCarRepo;
pub use drivers::PgDriverRepo;
pub use sessions::PgSessionRepo;

use super::DbError;

/// Constraint names from `migrations.rs` and what they mean to a form.
enum Constraint {
    Unique {
        resource: &'static str,
        field: &'static str,
    },
    Reference {
        field: &'static str,
    },
}

fn lookup_constraint(name: &str) -> Option<Constraint> {
    Some(match name {
        "manufacturers_name_key" => Constraint::Unique {
            resource: "Manufacturer",
            field: "name",
        },
        "drivers_username_key" => Constraint::Unique {
            resource: "Driver",
            field: "username",
        },
        "drivers_license_number_key" => Constraint::Unique {
            resource: "Driver",
            field: "license_number",
        },
        "cars_manufacturer_id_fkey" => Constraint::Reference {
            field: "manufacturer",
        },
        "cars_drivers_driver_id_fkey" => Constraint::Reference { field: "drivers" },
        _ => return None,
    })
}

/// Translate a write failure into a domain error.
///
/// `reference_id` is reported for foreign key violations, since Postgres
/// does not say which value was missing.
pub(crate) fn map_write_error(err: sqlx::Error, reference_id: i64) -> DbError {
    if let sqlx::Error::Database(db_err) = &err {
        if let Some(constraint) = db_err.constraint().and_then(lookup_constraint) {
            return match constraint {
                Constraint::Unique { resource, field } => DbError::Conflict { resource, field },
                Constraint::Reference { field } => DbError::InvalidReference {
                    field,
                    id: reference_id,
                },
            };
        }
    }
    DbError::Sqlx(err)
}

/// Convert a pagination window into bind values.
pub(crate) fn limit_offset(page: crate::models::Pagination) -> (i64, i64) {
    (
        i64::from(page.limit()),
        i64::try_from(page.offset()).unwrap_or(i64::MAX),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Pagination;

    #[test]
    fn known_constraints() {
        assert!(matches!(
            lookup_constraint("drivers_license_number_key"),
            Some(Constraint::Unique {
                field: "license_number",
                ..
            })
        ));
        assert!(matches!(
            lookup_constraint("cars_manufacturer_id_fkey"),
            Some(Constraint::Reference {
                field: "manufacturer"
            })
        ));
        assert!(lookup_constraint("something_else").is_none());
    }

    #[test]
    fn non_database_errors_pass_through() {
        let err = map_write_error(sqlx::Error::RowNotFound, 1);
        assert!(matches!(err, DbError::Sqlx(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn limit_offset_binds() {
        assert_eq!(limit_offset(Pagination::new(3, 5)), (5, 10));
    }
}
