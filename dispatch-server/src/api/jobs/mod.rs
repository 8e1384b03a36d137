//! Dispatch Job API Module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Job router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/jobs", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/offers", get(handler::list_offers))
        .route("/{id}/accept", post(handler::accept))
}
