//! Dispatch Job Repository
//!
//! The two race-prone operations — resolving a job and growing its broadcast
//! set — are single conditional statements keyed on `status = Broadcasting`,
//! so concurrent accepts and late joins cannot corrupt the record: exactly
//! one accept lands, and an append against a resolved job is a no-op.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::DispatchJob;
use shared::models::DispatchJobStatus;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "dispatch_job";

#[derive(Debug, serde::Deserialize)]
struct CountRow {
    count: usize,
}

#[derive(Clone)]
pub struct DispatchJobRepository {
    base: BaseRepository,
}

impl DispatchJobRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn create(&self, mut job: DispatchJob) -> RepoResult<DispatchJob> {
        job.id = None;
        let created: Option<DispatchJob> = self.base.db().create(TABLE).content(job).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create dispatch job".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<DispatchJob>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid job ID: {}", id)))?;
        let job: Option<DispatchJob> = self.base.db().select(thing).await?;
        Ok(job)
    }

    /// Jobs still broadcasting to this worker (their open offers).
    pub async fn find_broadcasting_for(&self, worker_id: &str) -> RepoResult<Vec<DispatchJob>> {
        let jobs: Vec<DispatchJob> = self
            .base
            .db()
            .query(
                "SELECT * FROM dispatch_job \
                 WHERE status = $status AND broadcast_to CONTAINS $worker \
                 ORDER BY created_at DESC",
            )
            .bind(("status", DispatchJobStatus::Broadcasting))
            .bind(("worker", worker_id.to_string()))
            .await?
            .take(0)?;
        Ok(jobs)
    }

    /// Broadcasting jobs this worker has not yet been offered (late-join scan).
    pub async fn find_broadcasting_excluding(
        &self,
        worker_id: &str,
    ) -> RepoResult<Vec<DispatchJob>> {
        let jobs: Vec<DispatchJob> = self
            .base
            .db()
            .query(
                "SELECT * FROM dispatch_job \
                 WHERE status = $status AND broadcast_to CONTAINSNOT $worker \
                 ORDER BY created_at ASC",
            )
            .bind(("status", DispatchJobStatus::Broadcasting))
            .bind(("worker", worker_id.to_string()))
            .await?
            .take(0)?;
        Ok(jobs)
    }

    /// Atomically resolve the job to a worker.
    ///
    /// Lands only while the job is still broadcasting; of any number of
    /// concurrent callers exactly one gets `Some`, the rest `None`.
    pub async fn resolve(
        &self,
        job_id: &RecordId,
        worker_id: &str,
        now: i64,
    ) -> RepoResult<Option<DispatchJob>> {
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $job SET status = $assigned, assigned_to = $worker, accepted_at = $now \
                 WHERE status = $broadcasting RETURN AFTER",
            )
            .bind(("job", job_id.clone()))
            .bind(("assigned", DispatchJobStatus::Assigned))
            .bind(("broadcasting", DispatchJobStatus::Broadcasting))
            .bind(("worker", worker_id.to_string()))
            .bind(("now", now))
            .await?;
        let jobs: Vec<DispatchJob> = result.take(0)?;
        Ok(jobs.into_iter().next())
    }

    /// Append a late-joining worker to the broadcast set.
    ///
    /// Commits only while the job is still broadcasting and the worker is not
    /// already in the set; `None` means the job resolved concurrently (or the
    /// worker was already offered it) and nothing was written.
    pub async fn append_candidate(
        &self,
        job_id: &RecordId,
        worker_id: &str,
    ) -> RepoResult<Option<DispatchJob>> {
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $job SET broadcast_to += $worker \
                 WHERE status = $broadcasting AND broadcast_to CONTAINSNOT $worker \
                 RETURN AFTER",
            )
            .bind(("job", job_id.clone()))
            .bind(("broadcasting", DispatchJobStatus::Broadcasting))
            .bind(("worker", worker_id.to_string()))
            .await?;
        let jobs: Vec<DispatchJob> = result.take(0)?;
        Ok(jobs.into_iter().next())
    }

    /// Number of jobs currently assigned to a worker (capacity checks).
    pub async fn count_assigned(&self, worker_id: &str) -> RepoResult<usize> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT count() FROM dispatch_job \
                 WHERE assigned_to = $worker AND status = $assigned GROUP ALL",
            )
            .bind(("worker", worker_id.to_string()))
            .bind(("assigned", DispatchJobStatus::Assigned))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.into_iter().next().map(|r| r.count).unwrap_or(0))
    }

    /// Hard delete (redemption detaches and removes the job).
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid job ID: {}", id)))?;
        self.base
            .db()
            .query("DELETE $job")
            .bind(("job", thing))
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use shared::util::now_millis;

    fn make_job() -> DispatchJob {
        DispatchJob {
            id: None,
            order_id: "order:o1".into(),
            sub_order_id: "so1".into(),
            shop_id: "shop:s1".into(),
            shop_name: "Test Shop".into(),
            broadcast_to: vec!["actor:w1".into(), "actor:w2".into()],
            assigned_to: None,
            status: DispatchJobStatus::Broadcasting,
            accepted_at: None,
            created_at: now_millis(),
        }
    }

    #[tokio::test]
    async fn test_resolve_once() {
        let db = DbService::memory().await.unwrap().db;
        let repo = DispatchJobRepository::new(db);
        let job = repo.create(make_job()).await.unwrap();
        let id = job.id.clone().unwrap();

        let first = repo.resolve(&id, "actor:w1", now_millis()).await.unwrap();
        assert!(first.is_some());
        let resolved = first.unwrap();
        assert_eq!(resolved.status, DispatchJobStatus::Assigned);
        assert_eq!(resolved.assigned_to.as_deref(), Some("actor:w1"));
        assert!(resolved.accepted_at.is_some());

        // Second resolve must lose
        let second = repo.resolve(&id, "actor:w2", now_millis()).await.unwrap();
        assert!(second.is_none());

        // Stored record still belongs to the first winner
        let stored = repo.find_by_id(&id.to_string()).await.unwrap().unwrap();
        assert_eq!(stored.assigned_to.as_deref(), Some("actor:w1"));
    }

    #[tokio::test]
    async fn test_append_candidate_grows_set_once() {
        let db = DbService::memory().await.unwrap().db;
        let repo = DispatchJobRepository::new(db);
        let mut job = make_job();
        job.broadcast_to = vec![];
        let job = repo.create(job).await.unwrap();
        let id = job.id.clone().unwrap();

        let appended = repo.append_candidate(&id, "actor:w3").await.unwrap();
        assert!(appended.is_some());
        assert_eq!(appended.unwrap().broadcast_to, vec!["actor:w3".to_string()]);

        // Same worker again: no-op
        let again = repo.append_candidate(&id, "actor:w3").await.unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_append_candidate_after_resolve_is_noop() {
        let db = DbService::memory().await.unwrap().db;
        let repo = DispatchJobRepository::new(db);
        let job = repo.create(make_job()).await.unwrap();
        let id = job.id.clone().unwrap();

        repo.resolve(&id, "actor:w1", now_millis()).await.unwrap();

        let appended = repo.append_candidate(&id, "actor:w9").await.unwrap();
        assert!(appended.is_none());
        let stored = repo.find_by_id(&id.to_string()).await.unwrap().unwrap();
        assert!(!stored.broadcast_to.contains(&"actor:w9".to_string()));
    }

    #[tokio::test]
    async fn test_broadcasting_queries() {
        let db = DbService::memory().await.unwrap().db;
        let repo = DispatchJobRepository::new(db);
        let job = repo.create(make_job()).await.unwrap();
        let id = job.id.clone().unwrap();

        let offers = repo.find_broadcasting_for("actor:w1").await.unwrap();
        assert_eq!(offers.len(), 1);
        let missing = repo.find_broadcasting_excluding("actor:w3").await.unwrap();
        assert_eq!(missing.len(), 1);

        repo.resolve(&id, "actor:w1", now_millis()).await.unwrap();
        assert!(repo.find_broadcasting_for("actor:w1").await.unwrap().is_empty());
        assert_eq!(repo.count_assigned("actor:w1").await.unwrap(), 1);
        assert_eq!(repo.count_assigned("actor:w2").await.unwrap(), 0);
    }
}
