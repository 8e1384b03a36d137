//! Actor Model (演员目录：顾客/店主/配送员)
//!
//! Narrow slice of the actor directory this core consumes: identity, role,
//! availability and last known position. Authentication and profile
//! management live in a separate service.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use shared::models::ActorRole;
use surrealdb::RecordId;

pub type ActorId = RecordId;

/// Last known position (workers report it while on shift)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Actor entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<ActorId>,

    pub full_name: String,

    #[serde(default)]
    pub email: Option<String>,

    pub role: ActorRole,

    /// 配送员是否在班（actor 自行切换）
    #[serde(default)]
    pub is_available: bool,

    #[serde(default)]
    pub location: Option<GeoPoint>,

    /// 创建时间 (Unix millis)
    pub created_at: i64,
}

impl Actor {
    /// Record id as "actor:xyz" string, empty if unsaved.
    pub fn id_str(&self) -> String {
        self.id.as_ref().map(|id| id.to_string()).unwrap_or_default()
    }
}
