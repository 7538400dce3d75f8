//! Database Module
//!
//! Embedded SurrealDB: connection handling and schema definition.

pub mod models;
pub mod repository;

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};

use crate::utils::AppError;

const NAMESPACE: &str = "stocktake";
const DATABASE: &str = "main";

/// Tables and indexes, applied idempotently on every startup.
///
/// The unique index on (session, product) is what makes the first-add
/// upsert race-safe; the unique index on user.name backs the idempotent
/// login upsert.
const SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS product SCHEMALESS;
DEFINE INDEX IF NOT EXISTS idx_product_code ON TABLE product COLUMNS code UNIQUE;
DEFINE INDEX IF NOT EXISTS idx_product_barcode ON TABLE product COLUMNS barcode;

DEFINE TABLE IF NOT EXISTS user SCHEMALESS;
DEFINE INDEX IF NOT EXISTS idx_user_name ON TABLE user COLUMNS name UNIQUE;

DEFINE TABLE IF NOT EXISTS counting_session SCHEMALESS;
DEFINE INDEX IF NOT EXISTS idx_session_user_status ON TABLE counting_session COLUMNS user, status;

DEFINE TABLE IF NOT EXISTS counted_item SCHEMALESS;
DEFINE INDEX IF NOT EXISTS idx_item_session_product ON TABLE counted_item COLUMNS session, product UNIQUE;

DEFINE TABLE IF NOT EXISTS count_history SCHEMALESS;
DEFINE INDEX IF NOT EXISTS idx_history_session ON TABLE count_history COLUMNS session;
"#;

/// Database service - owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the RocksDB-backed store at the given path and
    /// apply the schema.
    pub async fn open(db_path: &str) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        Self::finish_init(db, db_path).await
    }

    /// Open an in-memory store (tests).
    pub async fn open_in_memory() -> Result<Self, AppError> {
        let db = Surreal::new::<Mem>(())
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        Self::finish_init(db, "<memory>").await
    }

    async fn finish_init(db: Surreal<Db>, db_path: &str) -> Result<Self, AppError> {
        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        db.query(SCHEMA)
            .await
            .map_err(|e| AppError::database(format!("Failed to apply schema: {e}")))?
            .check()
            .map_err(|e| AppError::database(format!("Schema statement failed: {e}")))?;

        tracing::info!("Database ready at {}", db_path);
        Ok(Self { db })
    }
}
