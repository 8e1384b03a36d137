//! Order value objects
//!
//! Status enums and the snapshot types embedded in order documents. The
//! entities themselves (aggregate root + repositories) live in the server.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    #[default]
    Delivery,
    Pickup,
}

/// Payment method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// 货到付款
    #[default]
    Cash,
    /// 在线支付（网关引用在下单前获取）
    Online,
}

/// Sub-order status lifecycle
///
/// ```text
/// pending ─▶ confirmed ─▶ preparing ─▶ out-for-delivery ─▶ delivered
///    │                                       (locked)       (terminal)
///    ├──▶ cancelled (terminal, customer path only)
///    └──▶ rejected  (terminal)
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubOrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    OutForDelivery,
    Delivered,
    Rejected,
    Cancelled,
}

impl SubOrderStatus {
    /// Terminal statuses accept no further mutation at all.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Rejected | Self::Cancelled)
    }

    /// Locked statuses reject any transition except idempotent re-application
    /// of the same status. `OutForDelivery` is locked but not terminal: the
    /// hand-off flow (code redemption) still advances it to `Delivered`.
    pub fn is_locked(self) -> bool {
        matches!(
            self,
            Self::OutForDelivery | Self::Rejected | Self::Delivered | Self::Cancelled
        )
    }

    /// Statuses whose first entry allocates the order number and freezes the
    /// receipt snapshot.
    pub fn is_confirmation_stage(self) -> bool {
        matches!(self, Self::Confirmed | Self::Preparing | Self::OutForDelivery)
    }

    /// Position on the forward path; branch statuses have no rank.
    pub fn rank(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Confirmed => Some(1),
            Self::Preparing => Some(2),
            Self::OutForDelivery => Some(3),
            Self::Delivered => Some(4),
            Self::Rejected | Self::Cancelled => None,
        }
    }
}

impl fmt::Display for SubOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Preparing => write!(f, "preparing"),
            Self::OutForDelivery => write!(f, "out-for-delivery"),
            Self::Delivered => write!(f, "delivered"),
            Self::Rejected => write!(f, "rejected"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Line item snapshot, decoupled from the live catalog.
///
/// Orders must stay readable even if the catalog entry is later edited or
/// deleted, so name/price/quantity are frozen at placement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    /// Catalog item reference (informational only once snapshotted)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    pub name: String,
    /// Price in currency unit
    pub price: f64,
    pub quantity: i32,
}

/// Delivery address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryAddress {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// Monetary shares, derived once at sub-order creation and frozen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct MonetaryShares {
    /// Shop owner share in currency unit
    pub owner_share: f64,
    /// Delivery worker share in currency unit
    pub worker_share: f64,
    /// Platform fee in currency unit
    pub platform_fee: f64,
    /// Payment processing fee in currency unit
    pub payment_fee: f64,
}

/// Receipt snapshot, generated at most once per sub-order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Receipt {
    pub number: String,
    /// Generation time (Unix millis)
    pub generated_at: i64,
    pub items: Vec<LineItem>,
    /// Subtotal in currency unit
    pub subtotal: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locked_statuses() {
        assert!(SubOrderStatus::OutForDelivery.is_locked());
        assert!(SubOrderStatus::Rejected.is_locked());
        assert!(SubOrderStatus::Delivered.is_locked());
        assert!(SubOrderStatus::Cancelled.is_locked());
        assert!(!SubOrderStatus::Pending.is_locked());
        assert!(!SubOrderStatus::Confirmed.is_locked());
        assert!(!SubOrderStatus::Preparing.is_locked());
    }

    #[test]
    fn test_out_for_delivery_is_locked_but_not_terminal() {
        assert!(SubOrderStatus::OutForDelivery.is_locked());
        assert!(!SubOrderStatus::OutForDelivery.is_terminal());
    }

    #[test]
    fn test_status_serde_format() {
        let json = serde_json::to_string(&SubOrderStatus::OutForDelivery).unwrap();
        assert_eq!(json, "\"OUT_FOR_DELIVERY\"");
        let back: SubOrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SubOrderStatus::OutForDelivery);
    }
}
