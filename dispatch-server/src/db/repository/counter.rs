//! Counter Repository (sequence allocator)
//!
//! Issues monotonically increasing human-facing numbers out of a `counter`
//! table. The increment is a single `UPSERT ... SET seq += 1` statement, so
//! concurrent allocations never observe the same value.

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult};

/// Counter key for order numbers
pub const ORDER_NUMBER_KEY: &str = "order_number";

#[derive(Debug, Deserialize)]
struct CounterRow {
    seq: u64,
}

#[derive(Clone)]
pub struct CounterRepository {
    base: BaseRepository,
}

impl CounterRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Allocate the next value of the named sequence (starts at 1).
    pub async fn next(&self, key: &str) -> RepoResult<u64> {
        let mut result = self
            .base
            .db()
            .query("UPSERT type::thing('counter', $key) SET seq += 1 RETURN AFTER")
            .bind(("key", key.to_string()))
            .await?;
        let rows: Vec<CounterRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(|r| r.seq)
            .ok_or_else(|| RepoError::Database(format!("Counter {} returned no row", key)))
    }

    /// Current value without allocating (0 if the sequence was never used).
    pub async fn current(&self, key: &str) -> RepoResult<u64> {
        let mut result = self
            .base
            .db()
            .query("SELECT seq FROM type::thing('counter', $key)")
            .bind(("key", key.to_string()))
            .await?;
        let rows: Vec<CounterRow> = result.take(0)?;
        Ok(rows.into_iter().next().map(|r| r.seq).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    #[tokio::test]
    async fn test_counter_is_monotonic() {
        let db = DbService::memory().await.unwrap().db;
        let repo = CounterRepository::new(db);

        assert_eq!(repo.current("t").await.unwrap(), 0);
        assert_eq!(repo.next("t").await.unwrap(), 1);
        assert_eq!(repo.next("t").await.unwrap(), 2);
        assert_eq!(repo.next("t").await.unwrap(), 3);
        assert_eq!(repo.current("t").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_counters_are_independent() {
        let db = DbService::memory().await.unwrap().db;
        let repo = CounterRepository::new(db);

        assert_eq!(repo.next("a").await.unwrap(), 1);
        assert_eq!(repo.next("b").await.unwrap(), 1);
        assert_eq!(repo.next("a").await.unwrap(), 2);
    }
}
