//! 通知模块
//!
//! 把逻辑 actor 映射到至多一条实时连接，并以 fire-and-forget 方式投递
//! 事件。投递失败永远不会影响触发它的业务操作。

mod bus;
mod connection;

pub use bus::{ConnectionRegistry, NotificationBus, NotifyError, notify};
pub use connection::{ChannelConnection, Connection};
