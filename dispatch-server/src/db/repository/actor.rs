//! Actor Repository
//!
//! Narrow consumed interface to the actor directory: lookups, the worker
//! availability flag, and the available-worker scan used by dispatch.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::Actor;
use shared::models::ActorRole;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "actor";

#[derive(Clone)]
pub struct ActorRepository {
    base: BaseRepository,
}

impl ActorRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Create an actor record (seeding / tests; the real directory is a
    /// collaborator service)
    pub async fn create(&self, mut actor: Actor) -> RepoResult<Actor> {
        actor.id = None;
        let created: Option<Actor> = self.base.db().create(TABLE).content(actor).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create actor".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Actor>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid actor ID: {}", id)))?;
        let actor: Option<Actor> = self.base.db().select(thing).await?;
        Ok(actor)
    }

    /// All workers currently flagged available (on shift).
    pub async fn find_available_workers(&self) -> RepoResult<Vec<Actor>> {
        let actors: Vec<Actor> = self
            .base
            .db()
            .query("SELECT * FROM actor WHERE role = $role AND is_available = true")
            .bind(("role", ActorRole::Worker))
            .await?
            .take(0)?;
        Ok(actors)
    }

    /// Flip the availability flag. Returns the updated record.
    pub async fn set_availability(&self, id: &str, available: bool) -> RepoResult<Actor> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid actor ID: {}", id)))?;
        let mut result = self
            .base
            .db()
            .query("UPDATE $actor SET is_available = $available RETURN AFTER")
            .bind(("actor", thing))
            .bind(("available", available))
            .await?;
        let actors: Vec<Actor> = result.take(0)?;
        actors
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Actor {} not found", id)))
    }
}
