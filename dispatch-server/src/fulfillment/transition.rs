//! Transition guards
//!
//! Pure checks over the aggregate; no storage access. The service applies
//! the decision under an optimistic version check, so two concurrent
//! requests against the same sub-order race safely at the write.

use shared::models::{OrderType, SubOrderStatus};

use super::error::{FulfillmentError, FulfillmentResult};
use crate::db::models::{Order, SubOrder};

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCheck {
    /// Target equals the current status. Nothing to write, but the
    /// out-for-delivery side effects (job/code recovery) still run.
    Reapply,
    /// Transition accepted.
    Apply,
}

/// Guard a status-change request through the generic entry point.
///
/// `Cancelled` is never reachable here: the customer cancellation path is
/// the only way in, and it operates on the whole order.
pub fn check_transition(
    order: &Order,
    sub: &SubOrder,
    target: SubOrderStatus,
) -> FulfillmentResult<TransitionCheck> {
    let current = sub.status;

    if target == current {
        return Ok(TransitionCheck::Reapply);
    }

    // Locked statuses accept only idempotent re-application
    if current.is_locked() {
        return Err(FulfillmentError::InvalidTransition {
            from: current,
            to: target,
        });
    }

    // Pickup orders never go out for delivery
    if target == SubOrderStatus::OutForDelivery && order.order_type == OrderType::Pickup {
        return Err(FulfillmentError::InvalidTransition {
            from: current,
            to: target,
        });
    }

    match target {
        // Wrong path: only the customer cancellation flow reaches Cancelled
        SubOrderStatus::Cancelled => Err(FulfillmentError::InvalidTransition {
            from: current,
            to: target,
        }),
        // Rejection branch is open from any unlocked status
        SubOrderStatus::Rejected => Ok(TransitionCheck::Apply),
        // Forward path must move forward: status is monotonic
        SubOrderStatus::Pending
        | SubOrderStatus::Confirmed
        | SubOrderStatus::Preparing
        | SubOrderStatus::OutForDelivery
        | SubOrderStatus::Delivered => {
            let from_rank = current.rank().unwrap_or(u8::MAX);
            let to_rank = target.rank().unwrap_or(0);
            if to_rank > from_rank {
                Ok(TransitionCheck::Apply)
            } else {
                Err(FulfillmentError::InvalidTransition {
                    from: current,
                    to: target,
                })
            }
        }
    }
}
