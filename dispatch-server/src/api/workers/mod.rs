//! Worker API Module

mod handler;

use axum::{Router, routing::put};

use crate::core::ServerState;

/// Worker router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/workers", routes())
}

fn routes() -> Router<ServerState> {
    Router::new().route("/availability", put(handler::set_availability))
}
