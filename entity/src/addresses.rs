//! # 收货地址实体定义
//!
//! 用户保存的收货/账单地址，同一 (user, address_type) 组合最多一个默认地址。
//! 游客订单的地址不关联用户，以 guest_email 标识。

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 地址实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "addresses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: Option<i32>,
    pub guest_email: Option<String>,
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    /// 类型: shipping | billing
    pub address_type: String,
    pub is_default: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Model {
    /// 单行格式化的完整地址
    #[must_use]
    pub fn full_address(&self) -> String {
        let mut parts = vec![self.address_line1.clone()];
        if !self.address_line2.is_empty() {
            parts.push(self.address_line2.clone());
        }
        parts.push(self.city.clone());
        parts.push(self.state.clone());
        parts.push(self.postal_code.clone());
        parts.push(self.country.clone());
        parts.join(", ")
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
