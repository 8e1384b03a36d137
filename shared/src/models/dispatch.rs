//! Dispatch job states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dispatch job lifecycle
///
/// A job is created in `Broadcasting` and resolved to `Assigned` by exactly
/// one accepting worker; there is no further state (redemption deletes the
/// job).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchJobStatus {
    #[default]
    Broadcasting,
    Assigned,
}

impl fmt::Display for DispatchJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Broadcasting => write!(f, "broadcasting"),
            Self::Assigned => write!(f, "assigned"),
        }
    }
}
