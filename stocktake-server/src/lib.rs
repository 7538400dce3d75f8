//! Stocktake Server - inventory counting service
//!
//! Backend for the stock counting application: field counters log in by
//! name, record quantities against an active session, and the master
//! dashboard consolidates every session into exportable reports.
//!
//! # Module structure
//!
//! ```text
//! stocktake-server/src/
//! ├── core/          # Config, state, HTTP server
//! ├── api/           # HTTP routes and handlers
//! ├── db/            # Embedded SurrealDB: models, repositories, schema
//! ├── reports/       # Export document builders (CSV/JSON/XLSX)
//! └── utils/         # Errors, logging, time formatting
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod reports;
pub mod utils;

// Re-export public types
pub use crate::core::{Config, Server, ServerState};
pub use crate::utils::{AppError, AppResult};

// Re-export logger functions
pub use crate::utils::logger::{init_logger, init_logger_with_file};

/// Environment setup shared by the server and the import tool: load
/// `.env` if present, then install the tracing subscriber.
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    init_logger();
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
   _____ __             __   __        __
  / ___// /_____  _____/ /__/ /_____ _/ /_____
  \__ \/ __/ __ \/ ___/ //_/ __/ __ `/ //_/ _ \
 ___/ / /_/ /_/ / /__/ ,< / /_/ /_/ / ,< /  __/
/____/\__/\____/\___/_/|_|\__/\__,_/_/|_|\___/
    "#
    );
}
