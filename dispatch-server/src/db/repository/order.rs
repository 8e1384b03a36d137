//! Order Repository (aggregate root persistence)
//!
//! Every mutation is committed through [`save_versioned`], a read-modify-
//! conditional-write: the whole document is replaced only if `version` still
//! matches what the caller read. Losers observe `None` and retry against a
//! fresh read.
//!
//! [`save_versioned`]: OrderRepository::save_versioned

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::Order;
use shared::models::SubOrderStatus;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "order";

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn create(&self, mut order: Order) -> RepoResult<Order> {
        order.id = None;
        let created: Option<Order> = self.base.db().create(TABLE).content(order).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create order".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid order ID: {}", id)))?;
        let order: Option<Order> = self.base.db().select(thing).await?;
        Ok(order)
    }

    /// Conditionally replace the document.
    ///
    /// `order.version` must already be bumped by the caller; the write only
    /// lands if the stored version still equals `expected_version`. Returns
    /// `None` when a concurrent writer won the race.
    pub async fn save_versioned(
        &self,
        order: &Order,
        expected_version: u64,
    ) -> RepoResult<Option<Order>> {
        let id = order
            .id
            .clone()
            .ok_or_else(|| RepoError::Validation("Cannot save order without id".to_string()))?;
        let mut doc = order.clone();
        doc.id = None;

        let mut result = self
            .base
            .db()
            .query("UPDATE $order CONTENT $doc WHERE version = $expected RETURN AFTER")
            .bind(("order", id))
            .bind(("doc", doc))
            .bind(("expected", expected_version))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        Ok(orders.into_iter().next())
    }

    /// Orders placed by a customer, newest first.
    pub async fn find_for_customer(&self, customer_id: &str) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM order WHERE customer = $actor ORDER BY created_at DESC")
            .bind(("actor", customer_id.to_string()))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Orders containing a sub-order owned by this shop owner, newest first.
    pub async fn find_for_owner(&self, owner_id: &str) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "SELECT * FROM order WHERE sub_orders.owner_id CONTAINS $actor ORDER BY created_at DESC",
            )
            .bind(("actor", owner_id.to_string()))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Orders containing a sub-order assigned to this worker, newest first.
    pub async fn find_for_worker(&self, worker_id: &str) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "SELECT * FROM order WHERE sub_orders.assigned_worker CONTAINS $actor ORDER BY created_at DESC",
            )
            .bind(("actor", worker_id.to_string()))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Candidate orders for the code regeneration scan: any sub-order in the
    /// given status. Precise staleness checks (delivered-at, expiry) happen
    /// in the caller so a concurrently redeemed sub-order is simply skipped.
    pub async fn find_with_sub_order_status(
        &self,
        status: SubOrderStatus,
    ) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "SELECT * FROM order WHERE is_cancelled = false AND sub_orders.status CONTAINS $status",
            )
            .bind(("status", status))
            .await?
            .take(0)?;
        Ok(orders)
    }
}
