//! Repository Module
//!
//! CRUD and conditional-update operations on SurrealDB tables. Conditional
//! single-statement updates (`UPDATE ... WHERE <state check> RETURN AFTER`)
//! are the concurrency primitive every race-prone operation is built on.

// Directories (consumed collaborators, narrow surface)
pub mod actor;
pub mod shop;

// Orders
pub mod counter;
pub mod order;

// Dispatch
pub mod dispatch_job;

// Re-exports
pub use actor::ActorRepository;
pub use counter::CounterRepository;
pub use dispatch_job::DispatchJobRepository;
pub use order::OrderRepository;
pub use shop::ShopRepository;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// ID Convention: 全栈统一使用 "table:id" 格式
// =============================================================================
//
// 使用 surrealdb::RecordId 处理所有 ID：
//   - 解析: let id: RecordId = "order:abc".parse()?;
//   - 获取表名: id.table()
//   - CRUD: db.select(id) / db.delete(id) 直接使用 RecordId
//
// 嵌入文档内部的引用（sub_order 的 shop_id/owner_id 等）一律存字符串格式。

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}
