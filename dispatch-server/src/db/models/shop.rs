//! Shop Model
//!
//! Narrow slice of the catalog service: enough to resolve a cart item's shop
//! to its owner at placement time. Catalog CRUD is out of scope.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

pub type ShopId = RecordId;

/// Shop entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shop {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<ShopId>,

    pub name: String,

    /// Owner actor id ("actor:xyz")
    pub owner: String,

    /// 创建时间 (Unix millis)
    pub created_at: i64,
}

impl Shop {
    pub fn id_str(&self) -> String {
        self.id.as_ref().map(|id| id.to_string()).unwrap_or_default()
    }
}
