//! # 认证模块
//!
//! JWT 令牌管理、角色权限与密码处理

pub mod jwt;
pub mod password;
pub mod permissions;
pub mod types;

pub use jwt::{JwtManager, TokenPair};
pub use permissions::UserRole;
pub use types::{AuthConfig, AuthContext, JwtClaims};
