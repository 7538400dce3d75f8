//! Counting API module

mod handler;

use axum::{
    Router,
    routing::{post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/counts", count_routes())
}

fn count_routes() -> Router<ServerState> {
    Router::new()
        .route("/add", post(handler::add_quantity))
        .route(
            "/{id}",
            put(handler::correct_quantity).delete(handler::remove_item),
        )
}
