//! Auth API Handlers
//!
//! Login is the session lifecycle gate: a returning user with an active
//! session resumes it, anyone else gets a fresh user+session pair.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::models::CountingSession;
use crate::db::repository::SessionRepository;
use crate::utils::{AppError, AppResult};

const MAX_NAME_LEN: usize = 120;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: String,
    pub session: CountingSession,
    /// True when an existing active session was resumed
    pub resumed: bool,
}

/// POST /api/auth/login - open or resume a counting session
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name cannot be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(AppError::validation(format!(
            "name exceeds {MAX_NAME_LEN} characters"
        )));
    }

    let repo = SessionRepository::new(state.get_db());
    let opened = repo.open_for_user(name).await?;

    let user_id = opened.session.user.to_string();
    Ok(Json(LoginResponse {
        user_id,
        session: opened.session,
        resumed: opened.resumed,
    }))
}
