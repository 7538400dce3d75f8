//! Report export documents
//!
//! Builders for the CSV/JSON/XLSX files the counting and master screens
//! download. The aggregation itself lives in `shared::report`; this module
//! only turns already-computed rows into bytes.

pub mod export;
pub mod spreadsheet;

pub use export::{
    build_consolidated_csv, build_consolidated_json, build_counter_analysis_csv,
    build_session_csv, build_session_json, csv_field, decimal_comma,
};
pub use spreadsheet::build_inventory_xlsx;
