//! Report API Handlers
//!
//! Handlers fetch flat joined rows from the repositories, run the pure
//! aggregation from `shared::report`, and either return the result as
//! JSON or hand it to an export builder and stream the file back.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use shared::report::{
    category_breakdown, consolidate, counter_analysis, general_statistics, totals,
};
use shared::{
    CategoryBreakdownRow, ConsolidatedRow, ConsolidatedTotals, CountedRowFlat, CounterAnalysisRow,
    GeneralStatistics, SessionReportTotals,
};

use crate::core::ServerState;
use crate::db::repository::{CountedItemRepository, SessionRepository, UserRepository};
use crate::reports::{
    build_consolidated_csv, build_consolidated_json, build_counter_analysis_csv,
    build_session_csv, build_session_json, build_inventory_xlsx,
};
use crate::utils::{AppError, AppResult, time};

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
const JSON_CONTENT_TYPE: &str = "application/json";
const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Attachment response: content type + download filename + body bytes
fn attachment(
    content_type: &str,
    filename: String,
    body: Vec<u8>,
) -> ([(header::HeaderName, String); 2], Vec<u8>) {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
}

fn filename_token(name: &str) -> String {
    name.trim().replace(char::is_whitespace, "_")
}

// =============================================================================
// Per-session report
// =============================================================================

#[derive(Debug, Serialize)]
pub struct SessionReportResponse {
    pub user_name: String,
    pub rows: Vec<CountedRowFlat>,
    pub totals: SessionReportTotals,
}

async fn load_session_report(
    state: &ServerState,
    session_id: &str,
) -> AppResult<SessionReportResponse> {
    let sessions = SessionRepository::new(state.get_db());
    let session = sessions
        .find_by_id(session_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Session {} not found", session_id)))?;

    let users = UserRepository::new(state.get_db());
    let user_name = users
        .find_by_id(&session.user.to_string())
        .await?
        .map(|u| u.name)
        .unwrap_or_else(|| "Desconhecido".to_string());

    let flat = CountedItemRepository::new(state.get_db())
        .flat_rows_by_session(session_id)
        .await?;
    let (rows, totals) = shared::report::session_report(flat);

    Ok(SessionReportResponse {
        user_name,
        rows,
        totals,
    })
}

/// GET /api/reports/session/{id} - one session's report rows and totals
pub async fn session_report(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<SessionReportResponse>> {
    Ok(Json(load_session_report(&state, &id).await?))
}

/// GET /api/reports/session/{id}/csv - session report CSV download
pub async fn session_report_csv(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let report = load_session_report(&state, &id).await?;
    let now = shared::util::now_millis();
    let csv = build_session_csv(&report.user_name, now, &report.rows, &report.totals);
    let filename = format!(
        "contagem_{}_{}.csv",
        filename_token(&report.user_name),
        time::file_date_stamp(now)
    );
    Ok(attachment(CSV_CONTENT_TYPE, filename, csv.into_bytes()))
}

/// GET /api/reports/session/{id}/json - session report JSON download
pub async fn session_report_json(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let report = load_session_report(&state, &id).await?;
    let now = shared::util::now_millis();
    let doc = build_session_json(&report.user_name, now, &report.rows, &report.totals);
    let body = serde_json::to_vec_pretty(&doc)
        .map_err(|e| AppError::internal(format!("JSON serialization failed: {e}")))?;
    let filename = format!(
        "contagem_{}_{}.json",
        filename_token(&report.user_name),
        time::file_date_stamp(now)
    );
    Ok(attachment(JSON_CONTENT_TYPE, filename, body))
}

// =============================================================================
// Consolidated report
// =============================================================================

/// Optional date bounds for the consolidated report
#[derive(Debug, Deserialize)]
pub struct ConsolidatedQuery {
    /// YYYY-MM-DD, inclusive
    pub start_date: Option<String>,
    /// YYYY-MM-DD, inclusive
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConsolidatedResponse {
    pub rows: Vec<ConsolidatedRow>,
    pub totals: ConsolidatedTotals,
}

async fn load_consolidated(
    state: &ServerState,
    query: &ConsolidatedQuery,
) -> AppResult<ConsolidatedResponse> {
    let from = match query.start_date.as_deref() {
        Some(date) => Some(time::day_start_millis(time::parse_date(date)?)),
        None => None,
    };
    let until = match query.end_date.as_deref() {
        Some(date) => Some(time::day_end_millis(time::parse_date(date)?)),
        None => None,
    };

    let sessions = SessionRepository::new(state.get_db());
    let session_ids = sessions.ids_started_between(from, until).await?;

    let flat = CountedItemRepository::new(state.get_db())
        .flat_rows_by_sessions(&session_ids)
        .await?;

    let rows = consolidate(&flat);
    let totals = totals(&rows, session_ids.len());
    Ok(ConsolidatedResponse { rows, totals })
}

/// GET /api/reports/consolidated - cross-session consolidated report
pub async fn consolidated(
    State(state): State<ServerState>,
    Query(query): Query<ConsolidatedQuery>,
) -> AppResult<Json<ConsolidatedResponse>> {
    Ok(Json(load_consolidated(&state, &query).await?))
}

/// GET /api/reports/consolidated/csv - consolidated CSV download
pub async fn consolidated_csv(
    State(state): State<ServerState>,
    Query(query): Query<ConsolidatedQuery>,
) -> AppResult<impl IntoResponse> {
    let report = load_consolidated(&state, &query).await?;
    let now = shared::util::now_millis();
    let csv = build_consolidated_csv(now, &report.rows, &report.totals);
    let filename = format!("relatorio_consolidado_{}.csv", time::file_date_stamp(now));
    Ok(attachment(CSV_CONTENT_TYPE, filename, csv.into_bytes()))
}

/// GET /api/reports/consolidated/json - consolidated JSON download
pub async fn consolidated_json(
    State(state): State<ServerState>,
    Query(query): Query<ConsolidatedQuery>,
) -> AppResult<impl IntoResponse> {
    let report = load_consolidated(&state, &query).await?;
    let now = shared::util::now_millis();
    let doc = build_consolidated_json(now, &report.rows, &report.totals);
    let body = serde_json::to_vec_pretty(&doc)
        .map_err(|e| AppError::internal(format!("JSON serialization failed: {e}")))?;
    let filename = format!("relatorio_consolidado_{}.json", time::file_date_stamp(now));
    Ok(attachment(JSON_CONTENT_TYPE, filename, body))
}

/// GET /api/reports/consolidated/xlsx - consolidated inventory spreadsheet
pub async fn consolidated_xlsx(
    State(state): State<ServerState>,
    Query(query): Query<ConsolidatedQuery>,
) -> AppResult<impl IntoResponse> {
    let report = load_consolidated(&state, &query).await?;
    let bytes = build_inventory_xlsx(&report.rows)?;
    let now = shared::util::now_millis();
    let filename = format!("inventario_{}.xlsx", time::file_date_stamp(now));
    Ok(attachment(XLSX_CONTENT_TYPE, filename, bytes))
}

// =============================================================================
// Breakdowns and statistics
// =============================================================================

/// GET /api/reports/categories - quantity share per category
pub async fn categories(
    State(state): State<ServerState>,
) -> AppResult<Json<Vec<CategoryBreakdownRow>>> {
    let flat = CountedItemRepository::new(state.get_db())
        .flat_rows_all()
        .await?;
    let rows = consolidate(&flat);
    Ok(Json(category_breakdown(&rows)))
}

/// GET /api/reports/counters - per-counter performance analysis
pub async fn counters(
    State(state): State<ServerState>,
) -> AppResult<Json<Vec<CounterAnalysisRow>>> {
    let sessions = SessionRepository::new(state.get_db()).summaries().await?;
    let analysis = counter_analysis(&sessions, shared::util::now_millis());
    Ok(Json(analysis))
}

/// GET /api/reports/counters/csv - counter analysis CSV download
pub async fn counters_csv(State(state): State<ServerState>) -> AppResult<impl IntoResponse> {
    let sessions = SessionRepository::new(state.get_db()).summaries().await?;
    let now = shared::util::now_millis();
    let analysis = counter_analysis(&sessions, now);
    let csv = build_counter_analysis_csv(now, &analysis);
    let filename = format!("analise_contadores_{}.csv", time::file_date_stamp(now));
    Ok(attachment(CSV_CONTENT_TYPE, filename, csv.into_bytes()))
}

/// GET /api/reports/statistics - store-wide counting statistics
pub async fn statistics(State(state): State<ServerState>) -> AppResult<Json<GeneralStatistics>> {
    let items = CountedItemRepository::new(state.get_db())
        .flat_rows_all()
        .await?;
    let sessions = SessionRepository::new(state.get_db()).summaries().await?;
    Ok(Json(general_statistics(&items, &sessions)))
}
