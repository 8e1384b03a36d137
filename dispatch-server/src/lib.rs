//! Tiffin Dispatch Server - 多角色外卖订单调度节点
//!
//! # 架构概述
//!
//! 协调顾客、店铺和配送员三方的订单生命周期：
//!
//! - **订单状态机** (`fulfillment`): 子订单状态流转、守卫和副作用
//! - **配送调度** (`dispatch`): 任务广播、抢单裁决、迟到加入
//! - **交付码** (`credential`): 签发、过期、定时再生、核销
//! - **实时通知** (`notify`): actor 到连接的映射，fire-and-forget 投递
//! - **数据库** (`db`): 嵌入式 SurrealDB 存储，条件更新做并发控制
//! - **HTTP API** (`api`): 角色门禁的 RESTful 接口 + WebSocket
//!
//! # 模块结构
//!
//! ```text
//! dispatch-server/src/
//! ├── core/          # 配置、状态、服务器、后台任务
//! ├── auth/          # JWT 身份校验
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 数据库层
//! ├── notify/        # 通知总线
//! ├── fulfillment/   # 订单状态机
//! ├── dispatch/      # 配送任务调度
//! ├── credential/    # 交付码管理
//! └── utils/         # 工具函数
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod credential;
pub mod db;
pub mod dispatch;
pub mod fulfillment;
pub mod notify;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentActor, JwtService};
pub use crate::core::{Config, Server, ServerState};
pub use fulfillment::{FulfillmentError, FulfillmentService};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境 (dotenv + 日志)
pub fn setup_environment() {
    dotenv::dotenv().ok();
    let log_level = std::env::var("LOG_LEVEL").ok();
    init_logger_with_file(log_level.as_deref(), None);
}

pub fn print_banner() {
    println!(
        r#"
  ______ _  ____  ____ _
 /_  __/(_)/ __/ / __/(_)___
  / /  / // /_  / /_ / // _ \
 / /  / // __/ / __// // / / /
/_/  /_//_/   /_/  /_//_/ /_/
        dispatch server
"#
    );
}
