//! Dispatch Coordinator
//!
//! Finds exactly one worker for a sub-order entering delivery:
//!
//! ```text
//! create_job ──▶ broadcast to available workers ──▶ first accept wins
//!     │                                                  │
//!     │  (zero candidates: job waits)                    ├─▶ losers: job-withdrawn
//!     └──▶ late join: availability flip re-scans         └─▶ customer: status event
//! ```
//!
//! Resolution and broadcast-set growth are conditional updates keyed on the
//! job still broadcasting (see [`DispatchJobRepository`]), so concurrent
//! accepts and late joins race safely: exactly one accept succeeds and the
//! losers observe `JobAlreadyResolved`.

use std::sync::Arc;

use shared::message::{JobOfferPayload, JobWithdrawnPayload, NotificationEvent};
use shared::models::DispatchJobStatus;
use shared::util::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::models::{DispatchJob, Order};
use crate::db::repository::{ActorRepository, DispatchJobRepository, OrderRepository};
use crate::fulfillment::{FulfillmentError, FulfillmentResult, status_changed_event};
use crate::notify::{NotificationBus, notify};

/// Bounded retries for the versioned order writes that record the winner
const MAX_SAVE_ATTEMPTS: usize = 5;

pub struct DispatchCoordinator {
    db: Surreal<Db>,
    bus: Arc<dyn NotificationBus>,
    /// Per-worker concurrent job cap; 0 = unlimited
    max_jobs_per_worker: usize,
}

impl DispatchCoordinator {
    pub fn new(db: Surreal<Db>, bus: Arc<dyn NotificationBus>, max_jobs_per_worker: usize) -> Self {
        Self {
            db,
            bus,
            max_jobs_per_worker,
        }
    }

    fn jobs(&self) -> DispatchJobRepository {
        DispatchJobRepository::new(self.db.clone())
    }

    fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.db.clone())
    }

    fn actors(&self) -> ActorRepository {
        ActorRepository::new(self.db.clone())
    }

    /// Create a dispatch job for a sub-order entering delivery, attach it to
    /// the sub-order and broadcast the offer.
    ///
    /// An empty candidate pool is not an error: the job is created with an
    /// empty broadcast set and waits for late joiners. Returns the order as
    /// written.
    pub async fn create_and_attach(
        &self,
        order: &Order,
        sub_order_id: &str,
    ) -> FulfillmentResult<Order> {
        let sub = order
            .sub_order(sub_order_id)
            .ok_or_else(|| FulfillmentError::SubOrderNotFound(sub_order_id.to_string()))?;

        let candidates = self.actors().find_available_workers().await?;
        let candidate_ids: Vec<String> = candidates.iter().map(|a| a.id_str()).collect();
        if candidate_ids.is_empty() {
            tracing::info!(
                order = %order.id_str(),
                sub_order = %sub_order_id,
                "No eligible workers, job will wait for late joiners"
            );
        }

        let job = self
            .jobs()
            .create(DispatchJob {
                id: None,
                order_id: order.id_str(),
                sub_order_id: sub_order_id.to_string(),
                shop_id: sub.shop_id.clone(),
                shop_name: sub.shop_name.clone(),
                broadcast_to: candidate_ids.clone(),
                assigned_to: None,
                status: DispatchJobStatus::Broadcasting,
                accepted_at: None,
                created_at: now_millis(),
            })
            .await?;
        let job_id = job.id_str();

        // Attach the job reference under the version check. If another
        // request attached a different job concurrently, ours is redundant
        // and gets cleaned up.
        let attached = self.attach_job_to_sub_order(&order.id_str(), sub_order_id, &job_id).await?;
        let Some(order_after) = attached else {
            tracing::warn!(job = %job_id, "Dispatch job superseded concurrently, deleting");
            if let Err(e) = self.jobs().delete(&job_id).await {
                tracing::error!(job = %job_id, error = %e, "Failed to delete superseded job");
            }
            return self
                .orders()
                .find_by_id(&order.id_str())
                .await?
                .ok_or_else(|| FulfillmentError::OrderNotFound(order.id_str()));
        };

        let offer = Self::offer_payload(&job, &order_after, sub_order_id);
        if let Some(offer) = offer {
            for worker_id in &candidate_ids {
                notify(
                    self.bus.as_ref(),
                    worker_id,
                    NotificationEvent::JobOffer(offer.clone()),
                )
                .await;
            }
        }

        Ok(order_after)
    }

    /// Write the job reference onto the sub-order (versioned, bounded retry).
    ///
    /// Returns `None` when the sub-order already carries a different job.
    async fn attach_job_to_sub_order(
        &self,
        order_id: &str,
        sub_order_id: &str,
        job_id: &str,
    ) -> FulfillmentResult<Option<Order>> {
        let repo = self.orders();
        for _ in 0..MAX_SAVE_ATTEMPTS {
            let mut order = repo
                .find_by_id(order_id)
                .await?
                .ok_or_else(|| FulfillmentError::OrderNotFound(order_id.to_string()))?;
            let attached = order
                .sub_order(sub_order_id)
                .ok_or_else(|| FulfillmentError::SubOrderNotFound(sub_order_id.to_string()))?
                .dispatch_job
                .clone();
            match attached.as_deref() {
                Some(existing) if existing != job_id => return Ok(None),
                Some(_) => return Ok(Some(order)),
                None => {}
            }

            let expected = order.version;
            order.version += 1;
            order.sub_order_mut(sub_order_id).unwrap().dispatch_job = Some(job_id.to_string());
            if let Some(saved) = repo.save_versioned(&order, expected).await? {
                return Ok(Some(saved));
            }
        }
        Err(FulfillmentError::Conflict(format!(
            "Could not attach dispatch job to {} after {} attempts",
            sub_order_id, MAX_SAVE_ATTEMPTS
        )))
    }

    /// Accept a broadcast job. Exactly one concurrent caller wins; losers
    /// observe `JobAlreadyResolved`.
    pub async fn accept(&self, worker_id: &str, job_id: &str) -> FulfillmentResult<DispatchJob> {
        let repo = self.jobs();
        let job = repo
            .find_by_id(job_id)
            .await
            .map_err(|_| FulfillmentError::JobNotFound(job_id.to_string()))?
            .ok_or_else(|| FulfillmentError::JobNotFound(job_id.to_string()))?;

        if self.max_jobs_per_worker > 0 {
            let active = repo.count_assigned(worker_id).await?;
            if active >= self.max_jobs_per_worker {
                return Err(FulfillmentError::WorkerAtCapacity(format!(
                    "{} already holds {} active job(s)",
                    worker_id, active
                )));
            }
        }

        let record_id = job
            .id
            .clone()
            .ok_or_else(|| FulfillmentError::JobNotFound(job_id.to_string()))?;
        let Some(resolved) = repo.resolve(&record_id, worker_id, now_millis()).await? else {
            // Lost the race; distinguish a resolved job from a vanished one
            return match repo.find_by_id(job_id).await? {
                Some(_) => Err(FulfillmentError::JobAlreadyResolved(job_id.to_string())),
                None => Err(FulfillmentError::JobNotFound(job_id.to_string())),
            };
        };

        // Record the winner on the sub-order
        let order = self
            .record_assignment(&resolved.order_id, &resolved.sub_order_id, worker_id)
            .await?;

        // Losers' local views drop the now-unavailable offer
        for other in resolved.broadcast_to.iter().filter(|w| *w != worker_id) {
            notify(
                self.bus.as_ref(),
                other,
                NotificationEvent::JobWithdrawn(JobWithdrawnPayload {
                    job_id: resolved.id_str(),
                    taken_by: worker_id.to_string(),
                }),
            )
            .await;
        }

        // Acceptance does not advance the state machine; the customer still
        // gets a status event so their view picks up the assigned worker
        if let Some(sub) = order.sub_order(&resolved.sub_order_id) {
            notify(
                self.bus.as_ref(),
                &order.customer,
                status_changed_event(&order, sub),
            )
            .await;
        }

        Ok(resolved)
    }

    async fn record_assignment(
        &self,
        order_id: &str,
        sub_order_id: &str,
        worker_id: &str,
    ) -> FulfillmentResult<Order> {
        let repo = self.orders();
        for _ in 0..MAX_SAVE_ATTEMPTS {
            let mut order = repo
                .find_by_id(order_id)
                .await?
                .ok_or_else(|| FulfillmentError::OrderNotFound(order_id.to_string()))?;
            let expected = order.version;
            order.version += 1;
            {
                let sub = order
                    .sub_order_mut(sub_order_id)
                    .ok_or_else(|| FulfillmentError::SubOrderNotFound(sub_order_id.to_string()))?;
                sub.assigned_worker = Some(worker_id.to_string());
            }
            if let Some(saved) = repo.save_versioned(&order, expected).await? {
                return Ok(saved);
            }
        }
        Err(FulfillmentError::Conflict(format!(
            "Could not record assignment on {} after {} attempts",
            sub_order_id, MAX_SAVE_ATTEMPTS
        )))
    }

    /// Late-join scan: offer every still-broadcasting job this worker has
    /// not seen. Appends are conditional, so a job that resolves mid-scan is
    /// skipped. Returns the number of offers sent.
    pub async fn on_worker_available(&self, worker_id: &str) -> FulfillmentResult<usize> {
        let repo = self.jobs();

        if self.max_jobs_per_worker > 0 {
            let active = repo.count_assigned(worker_id).await?;
            if active >= self.max_jobs_per_worker {
                tracing::debug!(worker = %worker_id, active, "Worker at capacity, skipping late-join scan");
                return Ok(0);
            }
        }

        let mut offered = 0;
        for job in repo.find_broadcasting_excluding(worker_id).await? {
            let Some(record_id) = job.id.clone() else {
                continue;
            };
            // No-op when the job resolved between the scan and the append
            let Some(job) = repo.append_candidate(&record_id, worker_id).await? else {
                continue;
            };
            let Some(order) = self.orders().find_by_id(&job.order_id).await? else {
                continue;
            };
            if let Some(offer) = Self::offer_payload(&job, &order, &job.sub_order_id) {
                notify(
                    self.bus.as_ref(),
                    worker_id,
                    NotificationEvent::JobOffer(offer),
                )
                .await;
                offered += 1;
            }
        }

        if offered > 0 {
            tracing::info!(worker = %worker_id, offered, "Late-joined worker offered outstanding jobs");
        }
        Ok(offered)
    }

    /// All open offers for a worker.
    pub async fn list_offers(&self, worker_id: &str) -> FulfillmentResult<Vec<JobOfferPayload>> {
        let mut offers = Vec::new();
        for job in self.jobs().find_broadcasting_for(worker_id).await? {
            let Some(order) = self.orders().find_by_id(&job.order_id).await? else {
                tracing::warn!(job = %job.id_str(), "Broadcasting job references missing order");
                continue;
            };
            if let Some(offer) = Self::offer_payload(&job, &order, &job.sub_order_id) {
                offers.push(offer);
            }
        }
        Ok(offers)
    }

    fn offer_payload(job: &DispatchJob, order: &Order, sub_order_id: &str) -> Option<JobOfferPayload> {
        let sub = order.sub_order(sub_order_id)?;
        Some(JobOfferPayload {
            job_id: job.id_str(),
            order_id: order.id_str(),
            sub_order_id: sub.sub_order_id.clone(),
            shop_name: job.shop_name.clone(),
            delivery_address: order.delivery_address.clone(),
            items: sub.items.clone(),
            subtotal: sub.subtotal,
            receipt_number: sub.receipt_number(),
        })
    }
}
