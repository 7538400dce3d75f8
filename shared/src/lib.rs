//! Shared types for the stocktake system
//!
//! Holds everything that is useful on both sides of the HTTP boundary:
//! the report row/totals types, the pure consolidation logic, and small
//! time utilities. Nothing in this crate performs I/O.

pub mod report;
pub mod util;

// Re-exports
pub use report::{
    CategoryBreakdownRow, ConsolidatedRow, ConsolidatedTotals, CountedRowFlat, CounterAnalysisRow,
    GeneralStatistics, SessionReportTotals, SessionSummary,
};
pub use serde::{Deserialize, Serialize};
