//! 通知总线核心实现
//!
//! # 架构
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 NotificationBus (trait)              │
//! │  register_connection / unregister_connection         │
//! │  publish_to(actor_id, event)   ◄── fire-and-forget   │
//! └──────────────────────────┬───────────────────────────┘
//!                            │
//!               ┌────────────┴────────────┐
//!               ▼                         ▼
//!      ConnectionRegistry          (其它 pub/sub 实现)
//!      (DashMap, 进程内)
//! ```
//!
//! 每个 actor 至多一条连接；重连采用 last-write-wins。没有连接的
//! actor 事件直接丢弃——不排队、不重试，消费方靠下一次状态查询补齐。

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use shared::message::NotificationEvent;
use thiserror::Error;

use super::connection::Connection;

/// Notification delivery failure. Always swallowed (and logged) by callers:
/// notification must never fail the operation that triggered it.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("actor has no live connection")]
    NotConnected,

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// 通知总线 - actor 到实时连接的映射
#[async_trait]
pub trait NotificationBus: Send + Sync + std::fmt::Debug {
    /// Register a connection for an actor (last-write-wins on reconnect).
    fn register_connection(&self, actor_id: &str, conn: Arc<dyn Connection>);

    /// Remove the actor's connection, but only if it is still the given
    /// instance — a reconnect that already replaced it must survive the
    /// old connection's teardown.
    fn unregister_connection(&self, actor_id: &str, conn_id: &str);

    /// Fire-and-forget delivery to the actor's live connection.
    async fn publish_to(&self, actor_id: &str, event: NotificationEvent)
    -> Result<(), NotifyError>;

    fn is_connected(&self, actor_id: &str) -> bool;
}

/// 进程内连接注册表 (默认实现)
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// actor id -> live connection
    connections: DashMap<String, Arc<dyn Connection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// 当前连接数
    pub fn connected_count(&self) -> usize {
        self.connections.len()
    }
}

#[async_trait]
impl NotificationBus for ConnectionRegistry {
    fn register_connection(&self, actor_id: &str, conn: Arc<dyn Connection>) {
        let replaced = self
            .connections
            .insert(actor_id.to_string(), conn)
            .is_some();
        if replaced {
            tracing::debug!(actor = %actor_id, "Live connection replaced (last-write-wins)");
        } else {
            tracing::debug!(actor = %actor_id, "Live connection registered");
        }
    }

    fn unregister_connection(&self, actor_id: &str, conn_id: &str) {
        let removed = self
            .connections
            .remove_if(actor_id, |_, conn| conn.id() == conn_id)
            .is_some();
        if removed {
            tracing::debug!(actor = %actor_id, "Live connection unregistered");
        }
    }

    async fn publish_to(
        &self,
        actor_id: &str,
        event: NotificationEvent,
    ) -> Result<(), NotifyError> {
        let Some(conn) = self.connections.get(actor_id).map(|c| c.value().clone()) else {
            return Err(NotifyError::NotConnected);
        };
        conn.deliver(&event)
    }

    fn is_connected(&self, actor_id: &str) -> bool {
        self.connections.contains_key(actor_id)
    }
}

/// Best-effort publish: delivery problems are logged, never propagated.
pub async fn notify(bus: &dyn NotificationBus, actor_id: &str, event: NotificationEvent) {
    let kind = event.kind();
    match bus.publish_to(actor_id, event).await {
        Ok(()) => {}
        Err(NotifyError::NotConnected) => {
            tracing::debug!(actor = %actor_id, event = kind, "Actor offline, event dropped");
        }
        Err(NotifyError::Delivery(e)) => {
            tracing::warn!(actor = %actor_id, event = kind, error = %e, "Notification delivery failed");
        }
    }
}
