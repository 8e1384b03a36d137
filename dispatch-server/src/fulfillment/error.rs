//! Fulfillment error taxonomy
//!
//! Guard violations and race losses are returned synchronously as typed
//! failures; background-job and notification failures are logged and never
//! surface here.

use shared::models::SubOrderStatus;
use thiserror::Error;

use crate::db::repository::RepoError;

#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// Transition guard violation (locked status, wrong order type, wrong path)
    #[error("Status change not allowed from '{from}' to '{to}'")]
    InvalidTransition {
        from: SubOrderStatus,
        to: SubOrderStatus,
    },

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Sub-order not found: {0}")]
    SubOrderNotFound(String),

    #[error("Dispatch job not found: {0}")]
    JobNotFound(String),

    /// Accept race loser / stale job reference
    #[error("Dispatch job already resolved: {0}")]
    JobAlreadyResolved(String),

    /// Worker at the configured concurrent-job cap
    #[error("Worker at capacity: {0}")]
    WorkerAtCapacity(String),

    /// Redemption failure: absent, mismatched or expired code
    #[error("Invalid or expired confirmation code")]
    InvalidOrExpiredCredential,

    #[error("Order is already cancelled: {0}")]
    AlreadyCancelled(String),

    /// Cancellation only while a sub-order is still pending
    #[error("Order cannot be cancelled: it is already being prepared or delivered")]
    CancelWindowClosed,

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Optimistic retries exhausted under concurrent mutation
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(#[from] RepoError),
}

pub type FulfillmentResult<T> = Result<T, FulfillmentError>;
