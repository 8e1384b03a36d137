use std::path::PathBuf;

use crate::auth::JwtConfig;

/// 服务器配置 - 调度节点的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/tiffin/dispatch | 工作目录 |
/// | HTTP_PORT | 4000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | CODE_TTL_MINUTES | 120 | 交付码有效期(分钟) |
/// | CODE_REGEN_INTERVAL_MINUTES | 120 | 交付码再生扫描间隔(分钟) |
/// | MAX_JOBS_PER_WORKER | 0 | 每个配送员并发任务上限 (0 = 不限) |
/// | CODE_WEBHOOK_URL | (无) | 交付码外发 webhook，缺省只记日志 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/tiffin HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | staging | production
    pub environment: String,

    // === 业务配置 ===
    /// 交付码有效期（分钟）
    pub code_ttl_minutes: i64,
    /// 交付码再生扫描间隔（分钟）
    pub code_regen_interval_minutes: u64,
    /// 每个配送员的并发任务上限 (0 = 不限，宽松策略)
    pub max_jobs_per_worker: usize,
    /// 交付码外发 webhook 地址 (可选)
    pub code_webhook_url: Option<String>,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR")
                .unwrap_or_else(|_| "/var/lib/tiffin/dispatch".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(4000),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),

            code_ttl_minutes: std::env::var("CODE_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(120),
            code_regen_interval_minutes: std::env::var("CODE_REGEN_INTERVAL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(120),
            max_jobs_per_worker: std::env::var("MAX_JOBS_PER_WORKER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            code_webhook_url: std::env::var("CODE_WEBHOOK_URL").ok(),
        }
    }

    /// 数据库目录 (work_dir/database)
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(PathBuf::from(&self.work_dir).join("logs"))?;
        Ok(())
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
