//! Order Model (aggregate root)
//!
//! The order document owns its sub-orders as value objects; every mutation
//! goes through root-level service methods and is committed with an
//! optimistic `version` check, so sub-orders never acquire independent
//! identity in concurrency control.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use shared::models::{
    DeliveryAddress, LineItem, MonetaryShares, OrderType, PaymentMethod, Receipt, SubOrderStatus,
};
use surrealdb::RecordId;

pub type OrderId = RecordId;

/// Sub-order: the per-shop portion of a customer order.
///
/// Line items and monetary shares are snapshots, frozen at placement; the
/// receipt is frozen at the first confirmation-stage transition and never
/// overwritten. Confirmation-code fields are null except during the
/// delivery-in-progress window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubOrder {
    /// Stable id, unique within the order
    pub sub_order_id: String,

    /// Shop reference ("shop:xyz")
    pub shop_id: String,
    /// Shop name snapshot
    pub shop_name: String,
    /// Shop owner actor id ("actor:xyz")
    pub owner_id: String,

    pub items: Vec<LineItem>,
    /// Subtotal in currency unit
    pub subtotal: f64,
    /// Monetary shares, derived once at creation and frozen
    pub shares: MonetaryShares,

    #[serde(default)]
    pub status: SubOrderStatus,

    /// Worker who accepted the dispatch job ("actor:xyz")
    #[serde(default)]
    pub assigned_worker: Option<String>,
    /// Active dispatch job reference ("dispatch_job:xyz")
    #[serde(default)]
    pub dispatch_job: Option<String>,

    /// Hand-off confirmation code (4 digits)
    #[serde(default)]
    pub confirmation_code: Option<String>,
    /// Code expiry (Unix millis)
    #[serde(default)]
    pub code_expires_at: Option<i64>,
    /// Last issue time (Unix millis)
    #[serde(default)]
    pub code_issued_at: Option<i64>,

    /// Hand-off time (Unix millis)
    #[serde(default)]
    pub delivered_at: Option<i64>,

    #[serde(default)]
    pub receipt: Option<Receipt>,
}

impl SubOrder {
    /// Whether an unexpired confirmation code is present.
    pub fn has_live_code(&self, now: i64) -> bool {
        matches!(
            (&self.confirmation_code, self.code_expires_at),
            (Some(_), Some(expires)) if expires > now
        )
    }

    /// Clear the credential triple (redemption / terminal delivered).
    pub fn clear_code(&mut self) {
        self.confirmation_code = None;
        self.code_expires_at = None;
        self.code_issued_at = None;
    }

    pub fn receipt_number(&self) -> Option<String> {
        self.receipt.as_ref().map(|r| r.number.clone())
    }
}

/// Order entity (aggregate root)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<OrderId>,

    /// Sequential human-facing number; assigned once, immutable thereafter
    #[serde(default)]
    pub order_number: Option<u64>,

    /// Customer actor id ("actor:xyz")
    pub customer: String,
    /// Customer name snapshot (notifications)
    pub customer_name: String,

    pub payment_method: PaymentMethod,
    /// External gateway reference, obtained before creation for non-cash
    /// payments; the gateway client itself is a collaborator
    #[serde(default)]
    pub gateway_order_ref: Option<String>,

    #[serde(default)]
    pub order_type: OrderType,

    #[serde(default)]
    pub delivery_address: Option<DeliveryAddress>,

    /// Total amount in currency unit
    pub total_amount: f64,

    pub sub_orders: Vec<SubOrder>,

    #[serde(default)]
    pub is_cancelled: bool,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
    #[serde(default)]
    pub cancelled_at: Option<i64>,

    #[serde(default)]
    pub special_instructions: Option<String>,

    /// Optimistic concurrency version, bumped on every committed mutation
    pub version: u64,

    /// Placement time (Unix millis)
    pub created_at: i64,
}

impl Order {
    /// Record id as "order:xyz" string, empty if unsaved.
    pub fn id_str(&self) -> String {
        self.id.as_ref().map(|id| id.to_string()).unwrap_or_default()
    }

    pub fn sub_order(&self, sub_order_id: &str) -> Option<&SubOrder> {
        self.sub_orders.iter().find(|s| s.sub_order_id == sub_order_id)
    }

    pub fn sub_order_mut(&mut self, sub_order_id: &str) -> Option<&mut SubOrder> {
        self.sub_orders
            .iter_mut()
            .find(|s| s.sub_order_id == sub_order_id)
    }

    /// Whether any sub-order is still pending (cancellation window).
    pub fn any_pending(&self) -> bool {
        self.sub_orders
            .iter()
            .any(|s| s.status == SubOrderStatus::Pending)
    }

    /// Clone with sub-orders narrowed to a single actor's slice (owner or
    /// worker views).
    pub fn narrowed<F>(&self, keep: F) -> Order
    where
        F: Fn(&SubOrder) -> bool,
    {
        let mut order = self.clone();
        order.sub_orders.retain(|s| keep(s));
        order
    }
}
