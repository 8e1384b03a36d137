//! Connection 连接抽象
//!
//! 一条实时连接 = 一个可以无阻塞入队事件的句柄。WebSocket 端点为每个
//! 连接建一个 [`ChannelConnection`]，由后台任务把队列排空到对端；测试
//! 直接持有接收端做断言。

use std::sync::Arc;

use shared::message::NotificationEvent;
use tokio::sync::mpsc;

use super::bus::NotifyError;

/// A single live connection to an actor.
///
/// Implementations must not block in [`deliver`]: the bus is called from
/// request handlers and fire-and-forget semantics require queue-and-return.
///
/// [`deliver`]: Connection::deliver
pub trait Connection: Send + Sync + std::fmt::Debug {
    /// Connection instance id. Used to guard unregister against the
    /// reconnect race: a stale connection may only remove itself.
    fn id(&self) -> &str;

    /// Queue an event for delivery.
    fn deliver(&self, event: &NotificationEvent) -> Result<(), NotifyError>;
}

/// Channel-backed connection (WebSocket drain task / in-process tests)
#[derive(Debug)]
pub struct ChannelConnection {
    id: String,
    tx: mpsc::UnboundedSender<NotificationEvent>,
}

impl ChannelConnection {
    /// Create a connection and the receiver its events drain from.
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<NotificationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = Arc::new(Self {
            id: uuid::Uuid::new_v4().to_string(),
            tx,
        });
        (conn, rx)
    }
}

impl Connection for ChannelConnection {
    fn id(&self) -> &str {
        &self.id
    }

    fn deliver(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        self.tx
            .send(event.clone())
            .map_err(|_| NotifyError::Delivery("connection closed".to_string()))
    }
}
