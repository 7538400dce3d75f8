//! Counted Item and Count History Models

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

pub const OPERATION_ADD: &str = "add";
pub const OPERATION_CORRECT: &str = "correct";
pub const OPERATION_REMOVE: &str = "remove";

/// Accumulated quantity for one product within one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountedItem {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub session: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub product: RecordId,
    /// Always >= 0; additions accumulate, corrections overwrite
    pub quantity: f64,
    /// Number of add operations folded into `quantity`
    pub record_count: i64,
    pub last_updated_at: i64,
    #[serde(with = "serde_helpers::record_id")]
    pub last_updated_by: RecordId,
}

/// Counted item joined with product fields and the last updater's name,
/// as listed on the counting screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountedItemDetail {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub product_id: Option<RecordId>,
    pub code: String,
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    pub unit: String,
    pub quantity: f64,
    pub record_count: i64,
    pub last_updated_at: i64,
    pub updated_by: String,
}

/// One audit-trail entry for a counted item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountHistoryEntry {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub operation: String,
    pub quantity_delta: f64,
    pub code: String,
    pub description: String,
    pub user_name: String,
    pub recorded_at: i64,
}
