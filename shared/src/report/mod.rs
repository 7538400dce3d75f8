//! Report types and consolidation logic
//!
//! The master dashboard and the per-session report screens both consume
//! these rows. Aggregation is a pure fold over flat joined rows fetched by
//! the server; handlers do the fetching, this module does the math.

mod aggregate;

pub use aggregate::{
    UNCATEGORIZED, category_breakdown, code_ordering, consolidate, counter_analysis,
    general_statistics, session_report, totals,
};

use serde::{Deserialize, Serialize};

/// One counted-item row, already joined with its product and the name of
/// the user whose session produced it. This is the aggregator's input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountedRowFlat {
    pub code: String,
    pub description: String,
    pub category: Option<String>,
    pub barcode: Option<String>,
    pub unit: String,
    pub quantity: f64,
    pub record_count: i64,
    /// Display name of the session owner
    pub counted_by: String,
    pub last_updated_at: i64,
}

/// One consolidated report row per distinct product code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedRow {
    pub code: String,
    pub description: String,
    pub category: Option<String>,
    pub barcode: Option<String>,
    pub unit: String,
    /// Sum of quantities across every contributing session
    pub quantity: f64,
    /// Sum of add operations folded into the quantity
    pub record_count: i64,
    /// Distinct user names that counted this product (sorted)
    pub contributors: Vec<String>,
    pub last_updated_at: i64,
}

/// Summary totals over a consolidated report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedTotals {
    pub unique_items: usize,
    pub total_units: f64,
    pub total_records: i64,
    pub distinct_contributors: usize,
    pub session_count: usize,
}

/// Per-category share of the consolidated quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdownRow {
    pub category: String,
    pub total: f64,
    /// Percentage of the grand total (0 when the grand total is 0)
    pub percent: f64,
}

/// One session as seen by the counter-performance analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub user_name: String,
    pub total_items: i64,
    pub total_units: f64,
    pub started_at: i64,
    /// NONE while the session is still active
    pub ended_at: Option<i64>,
}

/// Per-counter performance row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterAnalysisRow {
    pub name: String,
    pub session_count: i64,
    pub total_items: i64,
    pub total_units: f64,
    pub total_minutes: f64,
    pub avg_items_per_session: f64,
    pub avg_units_per_session: f64,
    pub items_per_minute: f64,
    pub units_per_minute: f64,
}

/// Store-wide counting statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralStatistics {
    pub total_sessions: usize,
    pub total_items: usize,
    pub total_units: f64,
    pub total_counters: usize,
    pub avg_units_per_session: f64,
    pub avg_items_per_counter: f64,
}

/// Totals block of a single-session report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReportTotals {
    pub total_items: usize,
    pub total_units: f64,
    pub total_records: i64,
}
