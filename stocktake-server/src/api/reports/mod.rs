//! Report API module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/reports", report_routes())
}

fn report_routes() -> Router<ServerState> {
    Router::new()
        .route("/session/{id}", get(handler::session_report))
        .route("/session/{id}/csv", get(handler::session_report_csv))
        .route("/session/{id}/json", get(handler::session_report_json))
        .route("/consolidated", get(handler::consolidated))
        .route("/consolidated/csv", get(handler::consolidated_csv))
        .route("/consolidated/json", get(handler::consolidated_json))
        .route("/consolidated/xlsx", get(handler::consolidated_xlsx))
        .route("/categories", get(handler::categories))
        .route("/counters", get(handler::counters))
        .route("/counters/csv", get(handler::counters_csv))
        .route("/statistics", get(handler::statistics))
}
