//! # 商户实体定义
//!
//! 商户店铺档案，status 控制审核流程，计数字段为冗余统计

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 商户实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "vendors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub user_id: i32,
    #[sea_orm(unique)]
    pub store_name: String,
    pub slug: String,
    pub description: String,
    pub business_email: String,
    pub business_phone: String,
    pub business_address: String,
    /// 状态: pending | approved | suspended | rejected
    pub status: String,
    pub is_featured: bool,
    /// 冗余统计字段，按需重算
    pub total_products: i32,
    pub total_orders: i32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
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
    #[sea_orm(has_many = "super::products::Entity")]
    Products,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
