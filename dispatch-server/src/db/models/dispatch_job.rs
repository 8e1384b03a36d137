//! Dispatch Job Model
//!
//! One attempt to match a sub-order in delivery to exactly one worker.
//! `broadcast_to` is append-only; resolution is a single conditional update.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use shared::models::DispatchJobStatus;
use surrealdb::RecordId;

pub type DispatchJobId = RecordId;

/// Dispatch job entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchJob {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<DispatchJobId>,

    /// Order reference ("order:xyz")
    pub order_id: String,
    /// Sub-order id within the order
    pub sub_order_id: String,

    /// Shop reference ("shop:xyz")
    pub shop_id: String,
    /// Shop name snapshot (offer payloads)
    pub shop_name: String,

    /// Workers this job has been offered to (append-only)
    #[serde(default)]
    pub broadcast_to: Vec<String>,

    /// Winning worker ("actor:xyz")
    #[serde(default)]
    pub assigned_to: Option<String>,

    #[serde(default)]
    pub status: DispatchJobStatus,

    /// Resolution time (Unix millis)
    #[serde(default)]
    pub accepted_at: Option<i64>,

    /// 创建时间 (Unix millis)
    pub created_at: i64,
}

impl DispatchJob {
    /// Record id as "dispatch_job:xyz" string, empty if unsaved.
    pub fn id_str(&self) -> String {
        self.id.as_ref().map(|id| id.to_string()).unwrap_or_default()
    }
}
