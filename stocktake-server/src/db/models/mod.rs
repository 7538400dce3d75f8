//! Data models
//!
//! Persisted row types plus their Create payloads. Record links are
//! `surrealdb::RecordId` in memory and "table:id" strings on the wire
//! (see [`serde_helpers`]).

pub mod counted_item;
pub mod product;
pub mod serde_helpers;
pub mod session;
pub mod user;

// Re-exports
pub use counted_item::*;
pub use product::*;
pub use session::*;
pub use user::*;
