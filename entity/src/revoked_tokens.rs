//! # 已吊销令牌实体定义
//!
//! 登出后的刷新令牌 JTI 黑名单，令牌自身过期后条目即可清理

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 已吊销令牌实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "revoked_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 令牌 JTI
    #[sea_orm(unique)]
    pub jti: String,
    /// 令牌自身的过期时间
    pub expires_at: DateTime,
    pub revoked_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
