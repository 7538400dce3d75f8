//! Counting Session Model

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

pub const SESSION_STATUS_ACTIVE: &str = "active";
pub const SESSION_STATUS_COMPLETED: &str = "completed";

/// One user's bounded counting pass
///
/// `ended_at` is set iff `status == "completed"`. The login gate keeps at
/// most one active session per user by resuming instead of creating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountingSession {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub user: RecordId,
    pub status: String,
    pub started_at: i64,
    #[serde(default)]
    pub ended_at: Option<i64>,
    #[serde(default)]
    pub total_items_counted: i64,
    #[serde(default)]
    pub total_units_counted: f64,
}

/// Session joined with its owner's name (master listings)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionWithUser {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub user_name: String,
    pub status: String,
    pub started_at: i64,
    #[serde(default)]
    pub ended_at: Option<i64>,
    #[serde(default)]
    pub total_items_counted: i64,
    #[serde(default)]
    pub total_units_counted: f64,
}
