use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::core::Config;
use crate::db::DbService;
use crate::utils::AppError;

/// Shared server state - one handle for everything the handlers need
///
/// Constructed once at startup and cloned into every request via axum's
/// `State` extractor. `Surreal<Db>` is internally reference-counted, so
/// clones are cheap.
#[derive(Clone, Debug)]
pub struct ServerState {
    /// Server configuration
    pub config: Config,
    /// Embedded database (SurrealDB)
    pub db: Surreal<Db>,
}

impl ServerState {
    pub fn new(config: Config, db: Surreal<Db>) -> Self {
        Self { config, db }
    }

    /// Initialize the server state:
    ///
    /// 1. Ensure the work directory structure exists
    /// 2. Open the embedded database under `work_dir/database/`
    /// 3. Apply the schema (tables + indexes)
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        config
            .ensure_work_dir_structure()
            .map_err(|e| AppError::internal(format!("Failed to create work directory: {e}")))?;

        let db_path = config.database_dir().join("stocktake.db");
        let db_service = DbService::open(&db_path.to_string_lossy()).await?;

        Ok(Self::new(config.clone(), db_service.db))
    }

    /// State backed by the in-memory engine, for tests.
    pub async fn initialize_in_memory(config: &Config) -> Result<Self, AppError> {
        let db_service = DbService::open_in_memory().await?;
        Ok(Self::new(config.clone(), db_service.db))
    }

    /// Get a database handle
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }
}
