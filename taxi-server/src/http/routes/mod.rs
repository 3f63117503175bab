//! Route handlers organized by resource

pub mod health;
pub mod accounts;
pub mod dashboard;
pub mod manufacturers;
pub mod cars;
pub mod drivers;
