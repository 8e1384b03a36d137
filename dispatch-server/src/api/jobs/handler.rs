//! Dispatch Job API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::message::JobOfferPayload;
use shared::models::ActorRole;

use crate::auth::CurrentActor;
use crate::core::ServerState;
use crate::db::models::DispatchJob;
use crate::utils::{AppResponse, AppResult, ok};

/// Open offers for the calling worker
pub async fn list_offers(
    State(state): State<ServerState>,
    actor: CurrentActor,
) -> AppResult<Json<AppResponse<Vec<JobOfferPayload>>>> {
    actor.require_role(ActorRole::Worker)?;
    let offers = state.dispatch.list_offers(&actor.id).await?;
    Ok(ok(offers))
}

/// Accept a broadcast job; losers of the race get a 409
pub async fn accept(
    State(state): State<ServerState>,
    actor: CurrentActor,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<DispatchJob>>> {
    actor.require_role(ActorRole::Worker)?;
    let job = state.dispatch.accept(&actor.id, &id).await?;
    Ok(ok(job))
}
