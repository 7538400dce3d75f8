//! Utility module - shared helpers and types
//!
//! - [`AppError`] - application error type with HTTP mapping
//! - [`AppResponse`] - JSON response envelope
//! - logging and time formatting helpers

pub mod error;
pub mod logger;
pub mod result;
pub mod time;

pub use error::{AppError, AppResponse};
pub use result::AppResult;
