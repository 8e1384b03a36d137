//! Database Models

// Serde helpers
pub mod serde_helpers;

// Actors and shops (consumed directories, narrow surface)
pub mod actor;
pub mod shop;

// Orders
pub mod order;

// Dispatch
pub mod dispatch_job;

// Re-exports
pub use actor::{Actor, ActorId, GeoPoint};
pub use dispatch_job::{DispatchJob, DispatchJobId};
pub use order::{Order, OrderId, SubOrder};
pub use shop::{Shop, ShopId};
