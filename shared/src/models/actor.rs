//! Actor roles
//!
//! The actor directory itself (authentication, profiles) lives outside this
//! core; only the role taxonomy is shared.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Actor role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    /// 下单的顾客
    Customer,
    /// 店铺负责人
    Owner,
    /// 配送员
    Worker,
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Owner => write!(f, "owner"),
            Self::Worker => write!(f, "worker"),
        }
    }
}
