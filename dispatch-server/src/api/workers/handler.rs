//! Worker API Handlers

use axum::{Json, extract::State};
use serde::Deserialize;
use shared::models::ActorRole;

use crate::auth::CurrentActor;
use crate::core::ServerState;
use crate::db::models::Actor;
use crate::db::repository::{ActorRepository, RepoError};
use crate::utils::{AppError, AppResponse, AppResult, ok};

/// Availability request body
#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub is_available: bool,
}

/// Flip the caller's on-shift flag. Turning available triggers the late-join
/// scan so a job created with zero candidates can still be served.
pub async fn set_availability(
    State(state): State<ServerState>,
    actor: CurrentActor,
    Json(payload): Json<AvailabilityRequest>,
) -> AppResult<Json<AppResponse<Actor>>> {
    actor.require_role(ActorRole::Worker)?;

    let repo = ActorRepository::new(state.get_db());
    let updated = repo
        .set_availability(&actor.id, payload.is_available)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(msg) => AppError::not_found(msg),
            other => AppError::database(other.to_string()),
        })?;

    if payload.is_available {
        state.dispatch.on_worker_available(&actor.id).await?;
    }

    Ok(ok(updated))
}
