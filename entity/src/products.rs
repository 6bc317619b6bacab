//! # 商品实体定义
//!
//! 商户商品表，库存与销量由下单/取消流程维护

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 商品实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub vendor_id: i32,
    pub category_id: Option<i32>,
    pub name: String,
    /// 商户内唯一
    pub slug: String,
    pub description: String,
    pub short_description: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    /// 划线价，用于展示折扣
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub compare_price: Option<Decimal>,
    pub stock: i32,
    pub sku: String,
    pub is_active: bool,
    pub is_featured: bool,
    pub view_count: i32,
    pub sales_count: i32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Model {
    #[must_use]
    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    /// 基于划线价的折扣百分比，无折扣时为 0
    #[must_use]
    pub fn discount_percentage(&self) -> i32 {
        match self.compare_price {
            Some(compare) if compare > self.price && !compare.is_zero() => {
                let ratio = (compare - self.price) / compare * Decimal::from(100);
                ratio.round().try_into().unwrap_or(0)
            }
            _ => 0,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vendors::Entity",
        from = "Column::VendorId",
        to = "super::vendors::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Vendors,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Categories,
    #[sea_orm(has_many = "super::product_images::Entity")]
    ProductImages,
    #[sea_orm(has_many = "super::cart_items::Entity")]
    CartItems,
    #[sea_orm(has_many = "super::wishlist_items::Entity")]
    WishlistItems,
}

impl Related<super::vendors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vendors.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl Related<super::product_images::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductImages.def()
    }
}

impl Related<super::cart_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl Related<super::wishlist_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WishlistItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
