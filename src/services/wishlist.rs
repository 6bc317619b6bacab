//! # 心愿单服务
//!
//! 以 toggle 为主的心愿单维护，同一 (用户, 商品) 只存一条。

use chrono::Utc;
use entity::{
    products, wishlist_items, wishlist_items::Entity as WishlistItems,
};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;

use crate::{
    auth::AuthContext,
    error::{Context, MarketError, Result},
};

use super::{
    products::{ProductResponse, visible_products},
    shared::ServiceResponse,
};

/// 心愿单条目响应
#[derive(Debug, Serialize)]
pub struct WishlistItemResponse {
    pub id: i32,
    pub product: ProductResponse,
    pub added_at: String,
}

/// toggle 结果
#[derive(Debug, Serialize)]
pub struct WishlistToggleResult {
    pub product_id: i32,
    pub in_wishlist: bool,
}

/// 心愿单服务
pub struct WishlistService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> WishlistService<'a> {
    #[must_use]
    pub const fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    const fn db(&self) -> &'a DatabaseConnection {
        self.db
    }

    /// 当前用户的心愿单，商品已下架或商户被停用时条目仍在但商品缺失，直接跳过
    pub async fn list(&self, auth: &AuthContext) -> Result<Vec<WishlistItemResponse>> {
        let items = WishlistItems::find()
            .filter(wishlist_items::Column::UserId.eq(auth.user_id))
            .order_by_desc(wishlist_items::Column::CreatedAt)
            .find_also_related(products::Entity)
            .all(self.db())
            .await
            .context("Failed to fetch wishlist")?;

        Ok(items
            .into_iter()
            .filter_map(|(item, product)| {
                product.map(|product| WishlistItemResponse {
                    id: item.id,
                    product: product.into(),
                    added_at: item.created_at.and_utc().to_rfc3339(),
                })
            })
            .collect())
    }

    /// 添加/移除互斥切换
    pub async fn toggle(
        &self,
        auth: &AuthContext,
        product_id: i32,
    ) -> Result<ServiceResponse<WishlistToggleResult>> {
        let existing = self.find_item(auth.user_id, product_id).await?;

        if let Some(item) = existing {
            WishlistItems::delete_by_id(item.id)
                .exec(self.db())
                .await
                .context("Failed to remove wishlist item")?;
            return Ok(ServiceResponse::with_message(
                WishlistToggleResult {
                    product_id,
                    in_wishlist: false,
                },
                "已从心愿单移除",
            ));
        }

        // 仅可收藏公开可见商品
        visible_products()
            .filter(products::Column::Id.eq(product_id))
            .one(self.db())
            .await
            .context("Failed to fetch product")?
            .ok_or_else(|| MarketError::not_found("Product", product_id.to_string()))?;

        let model = wishlist_items::ActiveModel {
            user_id: Set(auth.user_id),
            product_id: Set(product_id),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        };
        WishlistItems::insert(model)
            .exec(self.db())
            .await
            .context("Failed to add wishlist item")?;

        Ok(ServiceResponse::with_message(
            WishlistToggleResult {
                product_id,
                in_wishlist: true,
            },
            "已加入心愿单",
        ))
    }

    /// 查询某商品是否已收藏
    pub async fn check(&self, auth: &AuthContext, product_id: i32) -> Result<bool> {
        Ok(self.find_item(auth.user_id, product_id).await?.is_some())
    }

    /// 直接移除，不存在时报 NotFound
    pub async fn remove(
        &self,
        auth: &AuthContext,
        product_id: i32,
    ) -> Result<ServiceResponse<()>> {
        let item = self
            .find_item(auth.user_id, product_id)
            .await?
            .ok_or_else(|| MarketError::not_found("WishlistItem", product_id.to_string()))?;

        WishlistItems::delete_by_id(item.id)
            .exec(self.db())
            .await
            .context("Failed to remove wishlist item")?;

        Ok(ServiceResponse::with_message((), "已从心愿单移除"))
    }

    async fn find_item(
        &self,
        user_id: i32,
        product_id: i32,
    ) -> Result<Option<wishlist_items::Model>> {
        WishlistItems::find()
            .filter(wishlist_items::Column::UserId.eq(user_id))
            .filter(wishlist_items::Column::ProductId.eq(product_id))
            .one(self.db())
            .await
            .context("Failed to fetch wishlist item")
    }
}
