use serde::{Deserialize, Serialize};

use crate::models::{DeliveryAddress, LineItem, OrderType, PaymentMethod, SubOrderStatus};

// ==================== Payloads ====================

/// 新订单载荷 (服务端 -> 店铺负责人)
///
/// 每个参与购物车的店铺负责人收到自己那一份子订单的摘要。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewOrderPayload {
    pub order_id: String,
    pub sub_order_id: String,
    pub shop_id: String,
    pub order_type: OrderType,
    pub payment_method: PaymentMethod,
    pub customer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<DeliveryAddress>,
    pub items: Vec<LineItem>,
    /// Subtotal in currency unit
    pub subtotal: f64,
    /// Placement time (Unix millis)
    pub created_at: i64,
}

/// 配送任务载荷 (服务端 -> 配送员)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobOfferPayload {
    pub job_id: String,
    pub order_id: String,
    pub sub_order_id: String,
    pub shop_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<DeliveryAddress>,
    pub items: Vec<LineItem>,
    /// Subtotal in currency unit
    pub subtotal: f64,
    /// Receipt number, if the receipt snapshot was already frozen
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
}

/// 任务撤回载荷 (服务端 -> 未抢到任务的配送员)
///
/// 接收方应将该任务从本地列表中移除；抢单失败不是错误。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobWithdrawnPayload {
    pub job_id: String,
    pub taken_by: String,
}

/// 状态变更载荷 (服务端 -> 顾客)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusChangedPayload {
    pub order_id: String,
    pub sub_order_id: String,
    pub status: SubOrderStatus,
    /// 在配送窗口内携带当前有效的交付码，便于客户端直接展示
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_expires_at: Option<i64>,
}
