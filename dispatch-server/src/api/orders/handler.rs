//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::models::{ActorRole, SubOrderStatus};

use crate::auth::CurrentActor;
use crate::core::ServerState;
use crate::credential::IssuedCode;
use crate::db::models::Order;
use crate::fulfillment::PlaceOrderRequest;
use crate::utils::{AppResponse, AppResult, ok};

/// Place an order (customer)
pub async fn place(
    State(state): State<ServerState>,
    actor: CurrentActor,
    Json(payload): Json<PlaceOrderRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    actor.require_role(ActorRole::Customer)?;
    let order = state.fulfillment.place_order(&actor.id, payload).await?;
    Ok(ok(order))
}

/// List orders, narrowed to the caller's slice of each
pub async fn list(
    State(state): State<ServerState>,
    actor: CurrentActor,
) -> AppResult<Json<AppResponse<Vec<Order>>>> {
    let orders = state
        .fulfillment
        .list_orders_for(&actor.id, actor.role)
        .await?;
    Ok(ok(orders))
}

/// Get order by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    _actor: CurrentActor,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state.fulfillment.get_order(&id).await?;
    Ok(ok(order))
}

/// Cancel request body
#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Cancel an order (customer, only while pending)
pub async fn cancel(
    State(state): State<ServerState>,
    actor: CurrentActor,
    Path(id): Path<String>,
    Json(payload): Json<CancelRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    actor.require_role(ActorRole::Customer)?;
    let order = state.fulfillment.cancel(&actor.id, &id, payload.reason).await?;
    Ok(ok(order))
}

/// Special instructions request body
#[derive(Debug, Deserialize)]
pub struct InstructionsRequest {
    #[serde(default)]
    pub special_instructions: Option<String>,
}

/// Update free-text delivery instructions (customer)
pub async fn update_instructions(
    State(state): State<ServerState>,
    actor: CurrentActor,
    Path(id): Path<String>,
    Json(payload): Json<InstructionsRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    actor.require_role(ActorRole::Customer)?;
    let order = state
        .fulfillment
        .update_special_instructions(&actor.id, &id, payload.special_instructions)
        .await?;
    Ok(ok(order))
}

/// Status change request body
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: SubOrderStatus,
}

/// Owner-driven status change
pub async fn update_status(
    State(state): State<ServerState>,
    actor: CurrentActor,
    Path((id, sub_id)): Path<(String, String)>,
    Json(payload): Json<StatusRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    actor.require_role(ActorRole::Owner)?;
    let order = state
        .fulfillment
        .request_status_change(&actor.id, &id, &sub_id, payload.status)
        .await?;
    Ok(ok(order))
}

/// Issue or resend the confirmation code (customer)
pub async fn issue_code(
    State(state): State<ServerState>,
    actor: CurrentActor,
    Path((id, sub_id)): Path<(String, String)>,
) -> AppResult<Json<AppResponse<IssuedCode>>> {
    actor.require_role(ActorRole::Customer)?;
    let issued = state
        .credentials
        .issue_or_reissue(&actor.id, &id, &sub_id)
        .await?;
    Ok(ok(issued))
}

/// Redeem request body
#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub code: String,
}

/// Redeem the confirmation code at hand-off (worker)
pub async fn redeem_code(
    State(state): State<ServerState>,
    actor: CurrentActor,
    Path((id, sub_id)): Path<(String, String)>,
    Json(payload): Json<RedeemRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    actor.require_role(ActorRole::Worker)?;
    let order = state.credentials.redeem(&id, &sub_id, &payload.code).await?;
    Ok(ok(order))
}
