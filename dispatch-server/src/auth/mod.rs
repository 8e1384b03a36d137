//! 调用方身份
//!
//! 认证服务（登录、密码、OTP）是外部协作方；这里只校验它签发的 JWT，
//! 把 actor id 和角色提取成 [`CurrentActor`] 供路由做角色门禁。

mod extractor;
mod jwt;

pub use jwt::{Claims, JwtConfig, JwtError, JwtService};

use shared::models::ActorRole;

use crate::utils::AppError;

/// Authenticated caller identity
#[derive(Debug, Clone)]
pub struct CurrentActor {
    /// Actor id ("actor:xyz")
    pub id: String,
    pub name: String,
    pub role: ActorRole,
}

impl CurrentActor {
    /// Role gate for handlers.
    pub fn require_role(&self, role: ActorRole) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::forbidden(format!("{} role required", role)))
        }
    }
}

impl TryFrom<Claims> for CurrentActor {
    type Error = String;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        if claims.sub.is_empty() {
            return Err("empty subject".to_string());
        }
        Ok(Self {
            id: claims.sub,
            name: claims.name,
            role: claims.role,
        })
    }
}
