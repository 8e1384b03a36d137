//! Fulfillment State Machine
//!
//! Owns the per-sub-order status lifecycle, its transition guards, and the
//! side effects each transition produces:
//!
//! ```text
//! request_status_change(sub, target)
//!     ├─ 1. guard (lock / order type / monotonic path)
//!     ├─ 2. first confirmation-stage entry: order number + receipt freeze
//!     ├─ 3. entering out-for-delivery: confirmation code + dispatch job
//!     ├─ 4. pickup delivered: stamp + clear stale references
//!     ├─ 5. versioned save (retry on concurrent writer)
//!     └─ 6. status event to the customer
//! ```
//!
//! The order document is the aggregate root: sub-orders are value objects
//! and every mutation commits through an optimistic version check.

mod error;
pub mod money;
pub mod transition;

#[cfg(test)]
mod tests;

pub use error::{FulfillmentError, FulfillmentResult};
pub use transition::{TransitionCheck, check_transition};

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use shared::message::{NewOrderPayload, NotificationEvent, StatusChangedPayload};
use shared::models::{
    DeliveryAddress, LineItem, OrderType, PaymentMethod, Receipt, SubOrderStatus,
};
use shared::util::{now_millis, short_suffix, snowflake_key};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::credential::{CodeSender, mint_code, send_best_effort};
use crate::db::models::{Order, SubOrder};
use crate::db::repository::{
    ActorRepository, CounterRepository, OrderRepository, ShopRepository, counter::ORDER_NUMBER_KEY,
};
use crate::dispatch::DispatchCoordinator;
use crate::notify::{NotificationBus, notify};

/// Bounded retries for optimistic saves (owner double-click territory)
const MAX_SAVE_ATTEMPTS: usize = 5;

/// Status event for the customer, carrying the live code if one exists.
pub fn status_changed_event(order: &Order, sub: &SubOrder) -> NotificationEvent {
    NotificationEvent::StatusChanged(StatusChangedPayload {
        order_id: order.id_str(),
        sub_order_id: sub.sub_order_id.clone(),
        status: sub.status,
        code: sub.confirmation_code.clone(),
        code_expires_at: sub.code_expires_at,
    })
}

/// One cart line in a placement request
#[derive(Debug, Clone, Deserialize)]
pub struct CartItem {
    /// Shop reference ("shop:xyz")
    pub shop_id: String,
    #[serde(default)]
    pub item_id: Option<String>,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
}

/// Placement request
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderRequest {
    pub cart_items: Vec<CartItem>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub order_type: OrderType,
    #[serde(default)]
    pub delivery_address: Option<DeliveryAddress>,
    /// External gateway reference for non-cash payments, obtained by the
    /// transport layer before placement
    #[serde(default)]
    pub gateway_order_ref: Option<String>,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

pub struct FulfillmentService {
    db: Surreal<Db>,
    bus: Arc<dyn NotificationBus>,
    dispatch: Arc<DispatchCoordinator>,
    sender: Arc<dyn CodeSender>,
    code_ttl_minutes: i64,
}

impl FulfillmentService {
    pub fn new(
        db: Surreal<Db>,
        bus: Arc<dyn NotificationBus>,
        dispatch: Arc<DispatchCoordinator>,
        sender: Arc<dyn CodeSender>,
        code_ttl_minutes: i64,
    ) -> Self {
        Self {
            db,
            bus,
            dispatch,
            sender,
            code_ttl_minutes,
        }
    }

    fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.db.clone())
    }

    // ========================================================================
    // Placement
    // ========================================================================

    /// Place an order: group cart items by shop, snapshot line items and
    /// monetary shares into one sub-order per shop, notify each shop owner.
    pub async fn place_order(
        &self,
        customer_id: &str,
        req: PlaceOrderRequest,
    ) -> FulfillmentResult<Order> {
        if req.cart_items.is_empty() {
            return Err(FulfillmentError::Validation("cart is empty".to_string()));
        }
        if req.order_type == OrderType::Delivery
            && req.delivery_address.as_ref().is_none_or(|a| a.text.is_empty())
        {
            return Err(FulfillmentError::Validation(
                "delivery address is required for delivery orders".to_string(),
            ));
        }

        let customer = ActorRepository::new(self.db.clone())
            .find_by_id(customer_id)
            .await?
            .ok_or_else(|| FulfillmentError::Validation(format!("Unknown actor {}", customer_id)))?;

        // Group items by shop; one sub-order per participating shop
        let mut by_shop: BTreeMap<String, Vec<LineItem>> = BTreeMap::new();
        for cart_item in &req.cart_items {
            let item = LineItem {
                item_id: cart_item.item_id.clone(),
                name: cart_item.name.clone(),
                price: cart_item.price,
                quantity: cart_item.quantity,
            };
            money::validate_line_item(&item)?;
            by_shop.entry(cart_item.shop_id.clone()).or_default().push(item);
        }

        let shops = ShopRepository::new(self.db.clone());
        let mut sub_orders = Vec::with_capacity(by_shop.len());
        let mut total = 0.0;
        for (shop_id, items) in by_shop {
            let shop = shops
                .find_by_id(&shop_id)
                .await?
                .ok_or_else(|| FulfillmentError::Validation(format!("Shop {} not found", shop_id)))?;
            let subtotal = money::items_subtotal(&items);
            total += subtotal;
            sub_orders.push(SubOrder {
                sub_order_id: snowflake_key(),
                shop_id: shop.id_str(),
                shop_name: shop.name.clone(),
                owner_id: shop.owner.clone(),
                items,
                subtotal,
                shares: money::shares_for_subtotal(subtotal),
                status: SubOrderStatus::Pending,
                assigned_worker: None,
                dispatch_job: None,
                confirmation_code: None,
                code_expires_at: None,
                code_issued_at: None,
                delivered_at: None,
                receipt: None,
            });
        }

        let order = self
            .orders()
            .create(Order {
                id: None,
                order_number: None,
                customer: customer.id_str(),
                customer_name: customer.full_name.clone(),
                payment_method: req.payment_method,
                gateway_order_ref: req.gateway_order_ref,
                order_type: req.order_type,
                delivery_address: if req.order_type == OrderType::Delivery {
                    req.delivery_address
                } else {
                    None
                },
                total_amount: total,
                sub_orders,
                is_cancelled: false,
                cancellation_reason: None,
                cancelled_at: None,
                special_instructions: req.special_instructions,
                version: 0,
                created_at: now_millis(),
            })
            .await?;

        for sub in &order.sub_orders {
            notify(
                self.bus.as_ref(),
                &sub.owner_id,
                NotificationEvent::NewOrder(NewOrderPayload {
                    order_id: order.id_str(),
                    sub_order_id: sub.sub_order_id.clone(),
                    shop_id: sub.shop_id.clone(),
                    order_type: order.order_type,
                    payment_method: order.payment_method,
                    customer_name: order.customer_name.clone(),
                    delivery_address: order.delivery_address.clone(),
                    items: sub.items.clone(),
                    subtotal: sub.subtotal,
                    created_at: order.created_at,
                }),
            )
            .await;
        }

        Ok(order)
    }

    // ========================================================================
    // Status lifecycle
    // ========================================================================

    /// Owner-driven status change. Returns the updated order.
    pub async fn request_status_change(
        &self,
        owner_id: &str,
        order_id: &str,
        sub_order_id: &str,
        target: SubOrderStatus,
    ) -> FulfillmentResult<Order> {
        let repo = self.orders();
        let counters = CounterRepository::new(self.db.clone());

        for _ in 0..MAX_SAVE_ATTEMPTS {
            let mut order = repo
                .find_by_id(order_id)
                .await?
                .ok_or_else(|| FulfillmentError::OrderNotFound(order_id.to_string()))?;
            let sub = order
                .sub_order(sub_order_id)
                .ok_or_else(|| FulfillmentError::SubOrderNotFound(sub_order_id.to_string()))?;
            if sub.owner_id != owner_id {
                return Err(FulfillmentError::Forbidden(
                    "Only the shop owner can change this sub-order".to_string(),
                ));
            }

            let check = check_transition(&order, sub, target)?;
            let now = now_millis();
            let expected = order.version;
            order.version += 1;

            if check == TransitionCheck::Apply {
                order.sub_order_mut(sub_order_id).unwrap().status = target;
            }

            // First confirmation-stage entry: order number + receipt freeze.
            // The number is allocated exactly once per order, no matter how
            // many sub-orders trigger it: a losing versioned save rereads an
            // order that already carries it.
            if target.is_confirmation_stage() {
                if order.order_number.is_none() {
                    order.order_number = Some(counters.next(ORDER_NUMBER_KEY).await?);
                }
                let number = order.order_number;
                let sub = order.sub_order_mut(sub_order_id).unwrap();
                if sub.receipt.is_none() {
                    sub.receipt = Some(build_receipt(number, sub, now));
                }
            }

            // Out-for-delivery on a delivery order: make sure a live code
            // exists. Re-application is the recovery path, so this also runs
            // on an idempotent re-entry.
            let mut issued_code = None;
            let mut needs_job = false;
            if target == SubOrderStatus::OutForDelivery && order.order_type == OrderType::Delivery {
                let ttl = self.code_ttl_minutes;
                let sub = order.sub_order_mut(sub_order_id).unwrap();
                if !sub.has_live_code(now) {
                    let (code, expires_at) = mint_code(ttl, now);
                    sub.confirmation_code = Some(code.clone());
                    sub.code_expires_at = Some(expires_at);
                    sub.code_issued_at = Some(now);
                    issued_code = Some((code, expires_at));
                }
                needs_job = sub.dispatch_job.is_none();
            }

            // Pickup hand-off: no credential flow, just the stamp
            if target == SubOrderStatus::Delivered && order.order_type == OrderType::Pickup {
                let sub = order.sub_order_mut(sub_order_id).unwrap();
                sub.delivered_at = Some(now);
                sub.assigned_worker = None;
                sub.dispatch_job = None;
                sub.clear_code();
            }

            let Some(mut saved) = repo.save_versioned(&order, expected).await? else {
                continue; // concurrent writer, reread and re-guard
            };

            if let Some((code, expires_at)) = issued_code {
                send_best_effort(
                    self.sender.as_ref(),
                    &saved.customer,
                    &saved.customer_name,
                    &code,
                    expires_at,
                )
                .await;
            }

            if needs_job {
                saved = self.dispatch.create_and_attach(&saved, sub_order_id).await?;
            }

            let sub = saved.sub_order(sub_order_id).unwrap();
            notify(
                self.bus.as_ref(),
                &saved.customer,
                status_changed_event(&saved, sub),
            )
            .await;

            return Ok(saved);
        }

        Err(FulfillmentError::Conflict(format!(
            "Concurrent updates on {} exhausted {} attempts",
            sub_order_id, MAX_SAVE_ATTEMPTS
        )))
    }

    // ========================================================================
    // Cancellation (customer path)
    // ========================================================================

    /// Customer-initiated cancellation: only while at least one sub-order is
    /// still pending, and only once. Every pending sub-order becomes
    /// cancelled; later-stage sub-orders keep their status.
    pub async fn cancel(
        &self,
        customer_id: &str,
        order_id: &str,
        reason: Option<String>,
    ) -> FulfillmentResult<Order> {
        let repo = self.orders();

        for _ in 0..MAX_SAVE_ATTEMPTS {
            let mut order = repo
                .find_by_id(order_id)
                .await?
                .ok_or_else(|| FulfillmentError::OrderNotFound(order_id.to_string()))?;
            if order.customer != customer_id {
                return Err(FulfillmentError::Forbidden(
                    "Only the customer can cancel this order".to_string(),
                ));
            }
            if order.is_cancelled {
                return Err(FulfillmentError::AlreadyCancelled(order_id.to_string()));
            }
            if !order.any_pending() {
                return Err(FulfillmentError::CancelWindowClosed);
            }

            let expected = order.version;
            order.version += 1;
            order.is_cancelled = true;
            order.cancellation_reason =
                Some(reason.clone().unwrap_or_else(|| "No reason provided".to_string()));
            order.cancelled_at = Some(now_millis());
            for sub in &mut order.sub_orders {
                if sub.status == SubOrderStatus::Pending {
                    sub.status = SubOrderStatus::Cancelled;
                }
            }

            if let Some(saved) = repo.save_versioned(&order, expected).await? {
                return Ok(saved);
            }
        }

        Err(FulfillmentError::Conflict(format!(
            "Concurrent updates on {} exhausted {} attempts",
            order_id, MAX_SAVE_ATTEMPTS
        )))
    }

    // ========================================================================
    // Queries / customer edits
    // ========================================================================

    pub async fn get_order(&self, order_id: &str) -> FulfillmentResult<Order> {
        self.orders()
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| FulfillmentError::OrderNotFound(order_id.to_string()))
    }

    /// Role-filtered order listing: customers see their orders in full,
    /// owners and workers see only their slice of each order.
    pub async fn list_orders_for(
        &self,
        actor_id: &str,
        role: shared::models::ActorRole,
    ) -> FulfillmentResult<Vec<Order>> {
        use shared::models::ActorRole;
        let repo = self.orders();
        let orders = match role {
            ActorRole::Customer => repo.find_for_customer(actor_id).await?,
            ActorRole::Owner => repo
                .find_for_owner(actor_id)
                .await?
                .iter()
                .map(|o| o.narrowed(|s| s.owner_id == actor_id))
                .collect(),
            ActorRole::Worker => repo
                .find_for_worker(actor_id)
                .await?
                .iter()
                .map(|o| o.narrowed(|s| s.assigned_worker.as_deref() == Some(actor_id)))
                .collect(),
        };
        Ok(orders)
    }

    /// Update free-text delivery instructions, allowed only while some
    /// sub-order is still pending or preparing.
    pub async fn update_special_instructions(
        &self,
        customer_id: &str,
        order_id: &str,
        instructions: Option<String>,
    ) -> FulfillmentResult<Order> {
        let repo = self.orders();

        for _ in 0..MAX_SAVE_ATTEMPTS {
            let mut order = repo
                .find_by_id(order_id)
                .await?
                .ok_or_else(|| FulfillmentError::OrderNotFound(order_id.to_string()))?;
            if order.customer != customer_id {
                return Err(FulfillmentError::Forbidden(
                    "Only the customer can edit this order".to_string(),
                ));
            }
            let editable = order.sub_orders.iter().any(|s| {
                matches!(
                    s.status,
                    SubOrderStatus::Pending | SubOrderStatus::Preparing
                )
            });
            if !editable {
                return Err(FulfillmentError::Validation(
                    "Special instructions can only be updated for pending or preparing orders"
                        .to_string(),
                ));
            }

            let expected = order.version;
            order.version += 1;
            order.special_instructions = instructions.clone();

            if let Some(saved) = repo.save_versioned(&order, expected).await? {
                return Ok(saved);
            }
        }

        Err(FulfillmentError::Conflict(format!(
            "Concurrent updates on {} exhausted {} attempts",
            order_id, MAX_SAVE_ATTEMPTS
        )))
    }
}

/// Receipt snapshot: number + frozen item list + subtotal. Never regenerated.
fn build_receipt(order_number: Option<u64>, sub: &SubOrder, now: i64) -> Receipt {
    let number = match order_number {
        Some(n) => format!("R-{}-{}", n, short_suffix(&sub.sub_order_id, 6)),
        None => format!("R-NA-{}", short_suffix(&sub.sub_order_id, 6)),
    };
    Receipt {
        number,
        generated_at: now,
        items: sub.items.clone(),
        subtotal: sub.subtotal,
    }
}
