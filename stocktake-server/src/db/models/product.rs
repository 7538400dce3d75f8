//! Product Model

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Internal code - unique business key
    pub code: String,
    pub description: String,
    /// EAN barcode, unique when present
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: i64,
}

/// Create product payload (catalog import and manual registration)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub code: String,
    pub description: String,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

pub fn default_unit() -> String {
    "UN".to_string()
}

fn default_true() -> bool {
    true
}
