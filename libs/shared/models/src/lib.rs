pub mod catalog;
pub mod error;

pub use catalog::{DurationValue, Patient, PriceValue, Promotion, Service};
pub use error::AppError;
