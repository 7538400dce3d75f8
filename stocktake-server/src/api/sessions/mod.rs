//! Session API module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/sessions", session_routes())
}

fn session_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/active", get(handler::list_active))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/items", get(handler::list_items))
        .route("/{id}/history", get(handler::list_history))
        .route("/{id}/finalize", post(handler::finalize))
}
