//! Live Connection Endpoint
//!
//! `GET /api/ws` upgrades to a WebSocket and registers the caller on the
//! notification bus. One connection per actor, last-write-wins on
//! reconnect; events are serialized as JSON text frames.

use axum::{
    Router,
    extract::State,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::Response,
    routing::get,
};

use crate::auth::CurrentActor;
use crate::core::ServerState;
use crate::notify::{ChannelConnection, Connection};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/ws", get(upgrade))
}

async fn upgrade(
    ws: WebSocketUpgrade,
    actor: CurrentActor,
    State(state): State<ServerState>,
) -> Response {
    ws.on_upgrade(move |socket| drain(socket, state, actor))
}

/// Pump bus events into the socket until either side goes away.
async fn drain(mut socket: WebSocket, state: ServerState, actor: CurrentActor) {
    let (conn, mut rx) = ChannelConnection::new();
    let conn_id = conn.id().to_string();
    state.bus.register_connection(&actor.id, conn);
    tracing::debug!(actor = %actor.id, "WebSocket connected");

    loop {
        tokio::select! {
            event = rx.recv() => {
                // Channel closes when a reconnect replaced this connection
                let Some(event) = event else { break };
                let Ok(text) = serde_json::to_string(&event) else {
                    continue;
                };
                if socket.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Inbound frames are not part of the protocol; ignore
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.bus.unregister_connection(&actor.id, &conn_id);
    tracing::debug!(actor = %actor.id, "WebSocket disconnected");
}
