//! Domain models with validation at construction
//!
//! Submitted forms are validated into input types before they reach a
//! repository. Invalid input returns field errors, not panic.

pub mod validation;
pub mod manufacturer;
pub mod car;
pub mod driver;
pub mod session;
pub mod pagination;

pub use validation::{FormErrors, ValidationError};
pub use manufacturer::{Manufacturer, ManufacturerForm, ManufacturerInput};
pub use car::{Car, CarDetail, CarForm, CarInput, CarWithManufacturer};
pub use driver::{Driver, DriverDetail, DriverForm, DriverSummary, NewDriver};
pub use session::{Session, SessionData};
pub use pagination::{InvalidPage, PageInfo, PageRequest, Paginated, Pagination, PaginationParams, PAGE_SIZE};
