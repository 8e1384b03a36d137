//! Shared types for the Tiffin delivery platform
//!
//! Types in this crate travel between the dispatch server and its clients:
//!
//! - **models** (`models`): order/sub-order value objects, status enums,
//!   dispatch job states, actor roles
//! - **message** (`message`): notification event payloads pushed over live
//!   connections
//! - **util** (`util`): time helpers and id generation

pub mod message;
pub mod models;
pub mod util;

pub use message::NotificationEvent;
pub use models::{
    ActorRole, DeliveryAddress, DispatchJobStatus, LineItem, MonetaryShares, OrderType,
    PaymentMethod, Receipt, SubOrderStatus,
};
