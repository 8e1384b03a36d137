//! Shared Models

pub mod actor;
pub mod dispatch;
pub mod order;

// Re-exports
pub use actor::ActorRole;
pub use dispatch::DispatchJobStatus;
pub use order::{
    DeliveryAddress, LineItem, MonetaryShares, OrderType, PaymentMethod, Receipt, SubOrderStatus,
};
