//! Confirmation Credential Manager
//!
//! Issues, validates and clears the short-lived numeric code that authorizes
//! marking a sub-order delivered. Issue is idempotent inside the validity
//! window — a "resend" must never invalidate a code already shown to a
//! worker. The equality check in [`redeem`] is the sole authorization
//! boundary on the worker side.
//!
//! [`redeem`]: CredentialManager::redeem

pub mod scheduler;
mod sender;

pub use scheduler::CodeRegenScheduler;
pub use sender::{CodeSender, LogCodeSender, WebhookCodeSender, send_best_effort};

use std::sync::Arc;

use rand::Rng;
use serde::Serialize;
use shared::models::SubOrderStatus;
use shared::util::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::models::Order;
use crate::db::repository::{DispatchJobRepository, OrderRepository};
use crate::fulfillment::{FulfillmentError, FulfillmentResult, status_changed_event};
use crate::notify::{NotificationBus, notify};

/// Bounded retries for the versioned order writes
const MAX_SAVE_ATTEMPTS: usize = 5;

/// Mint a fixed-width 4-digit code with the given validity window.
/// Returns (code, expires_at).
pub fn mint_code(ttl_minutes: i64, now: i64) -> (String, i64) {
    let code = rand::thread_rng().gen_range(1000..10000).to_string();
    (code, now + ttl_minutes * 60 * 1000)
}

/// Issue result returned to the customer
#[derive(Debug, Clone, Serialize)]
pub struct IssuedCode {
    pub code: String,
    pub expires_at: i64,
    /// True when an existing unexpired code was resent instead of minting
    pub existing: bool,
}

pub struct CredentialManager {
    db: Surreal<Db>,
    bus: Arc<dyn NotificationBus>,
    sender: Arc<dyn CodeSender>,
    ttl_minutes: i64,
}

impl CredentialManager {
    pub fn new(
        db: Surreal<Db>,
        bus: Arc<dyn NotificationBus>,
        sender: Arc<dyn CodeSender>,
        ttl_minutes: i64,
    ) -> Self {
        Self {
            db,
            bus,
            sender,
            ttl_minutes,
        }
    }

    fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.db.clone())
    }

    /// Customer-initiated (re)issue.
    ///
    /// Returns the existing code unchanged while it is still valid, so
    /// repeated resend requests cannot invalidate a code a worker already
    /// holds. Only the order's own customer may call this.
    pub async fn issue_or_reissue(
        &self,
        customer_id: &str,
        order_id: &str,
        sub_order_id: &str,
    ) -> FulfillmentResult<IssuedCode> {
        let repo = self.orders();

        for _ in 0..MAX_SAVE_ATTEMPTS {
            let mut order = repo
                .find_by_id(order_id)
                .await?
                .ok_or_else(|| FulfillmentError::OrderNotFound(order_id.to_string()))?;
            if order.customer != customer_id {
                return Err(FulfillmentError::Forbidden(
                    "Only the customer can issue the confirmation code".to_string(),
                ));
            }
            let sub = order
                .sub_order(sub_order_id)
                .ok_or_else(|| FulfillmentError::SubOrderNotFound(sub_order_id.to_string()))?;
            if sub.status == SubOrderStatus::Delivered {
                return Err(FulfillmentError::Validation(
                    "Order already delivered, no code required".to_string(),
                ));
            }

            let now = now_millis();
            if sub.has_live_code(now) {
                // Idempotent resend
                let code = sub.confirmation_code.clone().unwrap();
                let expires_at = sub.code_expires_at.unwrap();
                send_best_effort(
                    self.sender.as_ref(),
                    &order.customer,
                    &order.customer_name,
                    &code,
                    expires_at,
                )
                .await;
                notify(
                    self.bus.as_ref(),
                    &order.customer,
                    status_changed_event(&order, sub),
                )
                .await;
                return Ok(IssuedCode {
                    code,
                    expires_at,
                    existing: true,
                });
            }

            let (code, expires_at) = mint_code(self.ttl_minutes, now);
            let expected = order.version;
            order.version += 1;
            {
                let sub = order.sub_order_mut(sub_order_id).unwrap();
                sub.confirmation_code = Some(code.clone());
                sub.code_expires_at = Some(expires_at);
                sub.code_issued_at = Some(now);
            }

            let Some(saved) = repo.save_versioned(&order, expected).await? else {
                continue;
            };

            send_best_effort(
                self.sender.as_ref(),
                &saved.customer,
                &saved.customer_name,
                &code,
                expires_at,
            )
            .await;
            let sub = saved.sub_order(sub_order_id).unwrap();
            notify(
                self.bus.as_ref(),
                &saved.customer,
                status_changed_event(&saved, sub),
            )
            .await;

            return Ok(IssuedCode {
                code,
                expires_at,
                existing: false,
            });
        }

        Err(FulfillmentError::Conflict(format!(
            "Concurrent updates on {} exhausted {} attempts",
            sub_order_id, MAX_SAVE_ATTEMPTS
        )))
    }

    /// Redeem a code at hand-off: advance the sub-order to delivered, clear
    /// the credential, detach and delete the dispatch job.
    ///
    /// Any authenticated worker may attempt this; the code match is the
    /// authorization boundary. Not repeatable: success clears the code, so a
    /// second call fails with `InvalidOrExpiredCredential`.
    pub async fn redeem(
        &self,
        order_id: &str,
        sub_order_id: &str,
        candidate_code: &str,
    ) -> FulfillmentResult<Order> {
        let repo = self.orders();

        for _ in 0..MAX_SAVE_ATTEMPTS {
            let mut order = repo
                .find_by_id(order_id)
                .await?
                .ok_or_else(|| FulfillmentError::OrderNotFound(order_id.to_string()))?;
            let sub = order
                .sub_order(sub_order_id)
                .ok_or_else(|| FulfillmentError::SubOrderNotFound(sub_order_id.to_string()))?;

            let now = now_millis();
            let valid = matches!(
                (&sub.confirmation_code, sub.code_expires_at),
                (Some(code), Some(expires)) if code == candidate_code && expires > now
            );
            if !valid {
                return Err(FulfillmentError::InvalidOrExpiredCredential);
            }

            let expected = order.version;
            order.version += 1;
            let detached_job;
            {
                let sub = order.sub_order_mut(sub_order_id).unwrap();
                sub.status = SubOrderStatus::Delivered;
                sub.delivered_at = Some(now);
                sub.clear_code();
                detached_job = sub.dispatch_job.take();
            }

            let Some(saved) = repo.save_versioned(&order, expected).await? else {
                continue; // concurrent writer; reread revalidates the code
            };

            if let Some(job_id) = detached_job {
                let jobs = DispatchJobRepository::new(self.db.clone());
                if let Err(e) = jobs.delete(&job_id).await {
                    tracing::error!(job = %job_id, error = %e, "Failed to delete dispatch job after redemption");
                }
            }

            let sub = saved.sub_order(sub_order_id).unwrap();
            notify(
                self.bus.as_ref(),
                &saved.customer,
                status_changed_event(&saved, sub),
            )
            .await;
            notify(
                self.bus.as_ref(),
                &sub.owner_id,
                status_changed_event(&saved, sub),
            )
            .await;

            tracing::info!(
                order = %saved.id_str(),
                sub_order = %sub_order_id,
                "Sub-order delivered"
            );
            return Ok(saved);
        }

        Err(FulfillmentError::Conflict(format!(
            "Concurrent updates on {} exhausted {} attempts",
            sub_order_id, MAX_SAVE_ATTEMPTS
        )))
    }
}
