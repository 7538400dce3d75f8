//! Repository Module
//!
//! CRUD and the atomic counting procedures over the embedded SurrealDB
//! store. Handlers never build queries themselves; everything goes through
//! a repository.

pub mod counted_item;
pub mod product;
pub mod session;
pub mod user;

// Re-exports
pub use counted_item::CountedItemRepository;
pub use product::ProductRepository;
pub use session::SessionRepository;
pub use user::UserRepository;

use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Parse a "table:id" string into a RecordId, validating the table name.
pub fn parse_record_id(table: &str, id: &str) -> RepoResult<RecordId> {
    let record: RecordId = id
        .parse()
        .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
    if record.table() != table {
        return Err(RepoError::Validation(format!(
            "Expected a {} ID, got: {}",
            table, id
        )));
    }
    Ok(record)
}

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}
