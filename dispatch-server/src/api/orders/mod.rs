//! Order API Module
//!
//! Placement, role-filtered listing, the owner status entry point, the
//! customer cancellation path, and the confirmation-code endpoints.

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/orders", post(handler::place).get(handler::list))
        .nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/instructions", put(handler::update_instructions))
        .route("/{id}/sub/{sub_id}/status", put(handler::update_status))
        .route("/{id}/sub/{sub_id}/code", post(handler::issue_code))
        .route("/{id}/sub/{sub_id}/deliver", post(handler::redeem_code))
}
