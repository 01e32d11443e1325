//! Common utilities and types shared across the application.

pub mod error;
pub mod resources;

pub use error::AppError;
