//! HTTP API
//!
//! Route assembly. Role gates live in the handlers via [`CurrentActor`];
//! everything except `/api/health` requires a bearer token.
//!
//! [`CurrentActor`]: crate::auth::CurrentActor

pub mod health;
pub mod jobs;
pub mod orders;
pub mod workers;
pub mod ws;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

/// Build the application router
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(jobs::router())
        .merge(workers::router())
        .merge(ws::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
