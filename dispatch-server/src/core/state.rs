//! 服务器状态
//!
//! ServerState 是调度节点的核心数据结构，持有所有服务的共享引用。
//! 使用 Arc 实现浅拷贝，所有权成本极低。
//!
//! # 服务组件
//!
//! | 字段 | 类型 | 说明 |
//! |------|------|------|
//! | config | Config | 配置项 (不可变) |
//! | db | Surreal<Db> | 嵌入式数据库 |
//! | bus | Arc<dyn NotificationBus> | 实时通知总线 |
//! | jwt | Arc<JwtService> | 调用方身份校验 |
//! | fulfillment | Arc<FulfillmentService> | 订单状态机 |
//! | dispatch | Arc<DispatchCoordinator> | 配送任务调度 |
//! | credentials | Arc<CredentialManager> | 交付码管理 |

use std::sync::Arc;
use std::time::Duration;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::core::{BackgroundTasks, Config, TaskKind};
use crate::credential::{
    CodeRegenScheduler, CodeSender, CredentialManager, LogCodeSender, WebhookCodeSender,
};
use crate::db::DbService;
use crate::dispatch::DispatchCoordinator;
use crate::fulfillment::FulfillmentService;
use crate::notify::{ConnectionRegistry, NotificationBus};

/// 服务器状态 - 持有所有服务的单例引用
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// 实时通知总线
    pub bus: Arc<dyn NotificationBus>,
    /// JWT 身份校验
    pub jwt: Arc<JwtService>,
    /// 订单状态机
    pub fulfillment: Arc<FulfillmentService>,
    /// 配送任务调度
    pub dispatch: Arc<DispatchCoordinator>,
    /// 交付码管理
    pub credentials: Arc<CredentialManager>,
    /// 交付码外发端口 (再生调度器复用)
    sender: Arc<dyn CodeSender>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：工作目录结构 → 数据库 → 各服务
    ///
    /// # Panics
    ///
    /// 数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        // 0. Ensure work_dir structure exists
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        // 1. Initialize DB (work_dir/database/dispatch.db)
        let db_path = config.database_dir().join("dispatch.db");
        let db_service = DbService::new(&db_path.to_string_lossy())
            .await
            .expect("Failed to initialize database");

        Self::with_db(config, db_service.db)
    }

    /// 用已打开的数据库构造状态 (测试用内存库走这里)
    pub fn with_db(config: &Config, db: Surreal<Db>) -> Self {
        let bus: Arc<dyn NotificationBus> = Arc::new(ConnectionRegistry::new());
        let sender: Arc<dyn CodeSender> = match &config.code_webhook_url {
            Some(url) => Arc::new(WebhookCodeSender::new(url.clone())),
            None => Arc::new(LogCodeSender),
        };

        let dispatch = Arc::new(DispatchCoordinator::new(
            db.clone(),
            bus.clone(),
            config.max_jobs_per_worker,
        ));
        let fulfillment = Arc::new(FulfillmentService::new(
            db.clone(),
            bus.clone(),
            dispatch.clone(),
            sender.clone(),
            config.code_ttl_minutes,
        ));
        let credentials = Arc::new(CredentialManager::new(
            db.clone(),
            bus.clone(),
            sender.clone(),
            config.code_ttl_minutes,
        ));

        Self {
            config: config.clone(),
            db,
            bus,
            jwt: Arc::new(JwtService::new(config.jwt.clone())),
            fulfillment,
            dispatch,
            credentials,
            sender,
        }
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 之前调用
    ///
    /// 启动的任务：
    /// - 交付码再生调度器 (Periodic)
    pub fn start_background_tasks(&self, tasks: &mut BackgroundTasks) {
        let scheduler = CodeRegenScheduler::new(
            self.db.clone(),
            self.bus.clone(),
            self.sender.clone(),
            self.config.code_ttl_minutes,
            Duration::from_secs(self.config.code_regen_interval_minutes * 60),
            tasks.shutdown_token(),
        );
        tasks.spawn("code_regen_scheduler", TaskKind::Periodic, async move {
            scheduler.run().await;
        });
    }

    /// 获取数据库实例
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt.clone()
    }
}
