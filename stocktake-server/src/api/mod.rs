//! API route modules
//!
//! # Structure
//!
//! - [`health`] - liveness and store ping
//! - [`auth`] - login (session gate)
//! - [`products`] - catalog search, barcode lookup and linking
//! - [`counts`] - the three counting procedures
//! - [`sessions`] - session listings, telemetry, finalize, audit trail
//! - [`reports`] - consolidated/per-session reports and exports

pub mod auth;
pub mod counts;
pub mod health;
pub mod products;
pub mod reports;
pub mod sessions;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};
