//! # 认证类型定义
//!
//! 定义认证相关的数据结构和常量

use serde::{Deserialize, Serialize};

use crate::auth::permissions::UserRole;

/// 认证配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// JWT 签名密钥
    pub jwt_secret: String,
    /// 访问令牌有效期（秒）
    pub jwt_expires_in: i64,
    /// 刷新令牌有效期（秒）
    pub refresh_expires_in: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "insecure-dev-secret-change-me".to_string(),
            jwt_expires_in: 3600,
            refresh_expires_in: 7 * 24 * 3600,
        }
    }
}

/// 已认证的调用方上下文
///
/// 由令牌校验得出，服务层据此做权限判断
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: i32,
    pub role: UserRole,
}

impl AuthContext {
    #[must_use]
    pub const fn new(user_id: i32, role: UserRole) -> Self {
        Self { user_id, role }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// JWT 载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// 用户ID
    pub sub: String,
    /// 邮箱
    pub email: String,
    /// 角色
    pub role: String,
    /// 签发时间
    pub iat: i64,
    /// 过期时间
    pub exp: i64,
    /// 签发者
    pub iss: String,
    /// 受众
    pub aud: String,
    /// JWT ID
    pub jti: String,
}

impl JwtClaims {
    /// 创建新的 JWT 载荷
    #[must_use]
    pub fn new(user_id: i32, email: String, role: UserRole, expires_in_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            email,
            role: role.as_str().to_string(),
            iat: now,
            exp: now + expires_in_seconds,
            iss: "market-api".to_string(),
            aud: "market-api-users".to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// 检查 JWT 是否过期
    #[must_use]
    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp() > self.exp
    }

    /// 获取用户ID
    pub fn user_id(&self) -> Result<i32, std::num::ParseIntError> {
        self.sub.parse()
    }
}
