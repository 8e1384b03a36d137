//! 通知事件类型定义
//!
//! 这些类型在 dispatch-server 和 clients 之间共享，经由每个 actor 的
//! 实时连接推送。投递是 fire-and-forget 的：没有连接的 actor 收不到
//! 事件，依赖下一次状态查询补齐。

pub mod payload;

pub use payload::*;

use serde::{Deserialize, Serialize};

/// Notification event pushed to a single actor's live connection.
///
/// Serialized as `{"event": "...", "data": {...}}` so browser clients can
/// switch on the `event` field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum NotificationEvent {
    /// 新订单（发给店铺负责人）
    NewOrder(NewOrderPayload),
    /// 配送任务广播（发给配送员）
    JobOffer(JobOfferPayload),
    /// 任务已被他人接走（发给其余被广播的配送员）
    JobWithdrawn(JobWithdrawnPayload),
    /// 子订单状态变更（发给顾客，可携带当前交付码）
    StatusChanged(StatusChangedPayload),
}

impl NotificationEvent {
    /// Event name, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NewOrder(_) => "new-order",
            Self::JobOffer(_) => "job-offer",
            Self::JobWithdrawn(_) => "job-withdrawn",
            Self::StatusChanged(_) => "status-changed",
        }
    }
}
