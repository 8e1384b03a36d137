//! Shop Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::Shop;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "shop";

#[derive(Clone)]
pub struct ShopRepository {
    base: BaseRepository,
}

impl ShopRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn create(&self, mut shop: Shop) -> RepoResult<Shop> {
        shop.id = None;
        let created: Option<Shop> = self.base.db().create(TABLE).content(shop).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create shop".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Shop>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid shop ID: {}", id)))?;
        let shop: Option<Shop> = self.base.db().select(thing).await?;
        Ok(shop)
    }
}
