//! Core server components
//!
//! - [`Config`] - environment-driven configuration
//! - [`ServerState`] - shared handles (config + database)
//! - [`Server`] - HTTP server assembly and lifecycle

pub mod config;
pub mod server;
pub mod state;

pub use config::Config;
pub use server::Server;
pub use state::ServerState;
