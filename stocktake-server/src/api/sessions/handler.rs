//! Session API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::models::{CountHistoryEntry, CountedItemDetail, CountingSession, SessionWithUser};
use crate::db::repository::session::SessionFilter;
use crate::db::repository::{CountedItemRepository, SessionRepository, UserRepository};
use crate::utils::{AppError, AppResult, time};

const HISTORY_LIMIT: usize = 100;

/// Query params for the master session listing
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// active | completed | todas (anything else means no filter)
    pub status: Option<String>,
    /// YYYY-MM-DD, inclusive
    pub start_date: Option<String>,
    /// YYYY-MM-DD, inclusive
    pub end_date: Option<String>,
}

/// GET /api/sessions - all sessions with user names (master)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<SessionWithUser>>> {
    let mut filter = SessionFilter::default();

    if let Some(status) = query.status
        && status != "todas"
        && !status.is_empty()
    {
        filter.status = Some(status);
    }
    if let Some(start) = query.start_date.as_deref() {
        filter.started_from = Some(time::day_start_millis(time::parse_date(start)?));
    }
    if let Some(end) = query.end_date.as_deref() {
        filter.started_until = Some(time::day_end_millis(time::parse_date(end)?));
    }

    let repo = SessionRepository::new(state.get_db());
    let sessions = repo.find_all_with_user(filter).await?;
    Ok(Json(sessions))
}

/// Active session row with elapsed time, for the master telemetry panel
#[derive(Debug, Serialize)]
pub struct ActiveSessionRow {
    #[serde(flatten)]
    pub session: SessionWithUser,
    /// Whole minutes since the session started
    pub minutes_active: i64,
}

/// GET /api/sessions/active - currently active sessions
pub async fn list_active(
    State(state): State<ServerState>,
) -> AppResult<Json<Vec<ActiveSessionRow>>> {
    let repo = SessionRepository::new(state.get_db());
    let now = shared::util::now_millis();

    let rows = repo
        .find_active_with_user()
        .await?
        .into_iter()
        .map(|session| {
            let minutes_active =
                shared::util::minutes_between(session.started_at, now).round() as i64;
            ActiveSessionRow {
                session,
                minutes_active,
            }
        })
        .collect();
    Ok(Json(rows))
}

/// Session detail: the session row plus its counted items
#[derive(Debug, Serialize)]
pub struct SessionDetail {
    pub session: CountingSession,
    pub user_name: String,
    pub items: Vec<CountedItemDetail>,
}

/// GET /api/sessions/{id} - one session with its items
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<SessionDetail>> {
    let sessions = SessionRepository::new(state.get_db());
    let session = sessions
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Session {} not found", id)))?;

    let users = UserRepository::new(state.get_db());
    let user_name = users
        .find_by_id(&session.user.to_string())
        .await?
        .map(|u| u.name)
        .unwrap_or_else(|| "Desconhecido".to_string());

    let items = CountedItemRepository::new(state.get_db())
        .find_details_by_session(&id)
        .await?;

    Ok(Json(SessionDetail {
        session,
        user_name,
        items,
    }))
}

/// GET /api/sessions/{id}/items - counted items, most recent first
///
/// The counting screen calls this after every mutation to confirm what
/// the store actually holds.
pub async fn list_items(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<CountedItemDetail>>> {
    let repo = CountedItemRepository::new(state.get_db());
    let items = repo.find_details_by_session(&id).await?;
    Ok(Json(items))
}

/// GET /api/sessions/{id}/history - audit trail (last 100 operations)
pub async fn list_history(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<CountHistoryEntry>>> {
    let repo = CountedItemRepository::new(state.get_db());
    let entries = repo.history_by_session(&id, HISTORY_LIMIT).await?;
    Ok(Json(entries))
}

/// POST /api/sessions/{id}/finalize - complete an active session
pub async fn finalize(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<CountingSession>> {
    let repo = SessionRepository::new(state.get_db());
    let session = repo.finalize(&id).await?;
    tracing::info!(session = %id, "Session finalized");
    Ok(Json(session))
}
