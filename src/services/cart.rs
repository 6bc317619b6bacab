//! # 购物车服务
//!
//! 登录用户与游客购物车，登录时合并游客车。
//! 加购超出库存直接拒绝；合并时静默夹取到库存。

use chrono::Utc;
use entity::{
    cart_items, cart_items::Entity as CartItems, carts, carts::Entity as Carts, products,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::AuthContext,
    error::{Context, MarketError, Result},
};

use super::{
    products::{ProductResponse, visible_products},
    shared::ServiceResponse,
};

/// 购物车归属：登录用户或游客会话
#[derive(Debug, Clone)]
pub enum CartOwner {
    User(i32),
    Guest(String),
}

impl CartOwner {
    #[must_use]
    pub const fn user(auth: &AuthContext) -> Self {
        Self::User(auth.user_id)
    }

    #[must_use]
    pub fn guest(session_key: impl Into<String>) -> Self {
        Self::Guest(session_key.into())
    }
}

/// 购物车条目响应
#[derive(Debug, Serialize)]
pub struct CartItemResponse {
    pub id: i32,
    pub product: ProductResponse,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// 购物车响应
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub id: i32,
    pub items: Vec<CartItemResponse>,
    /// 条目数量合计
    pub total_items: i32,
    pub subtotal: Decimal,
}

/// 游客购物车行，合并与游客结账共用
#[derive(Debug, Clone, Deserialize)]
pub struct GuestCartLine {
    pub product_id: i32,
    pub quantity: i32,
}

/// 合并结果
#[derive(Debug, Serialize)]
pub struct CartMergeResult {
    pub merged_items: usize,
    pub warnings: Vec<String>,
    pub cart: CartResponse,
}

/// 角标数据
#[derive(Debug, Serialize)]
pub struct CartBadge {
    pub total_items: i32,
    pub subtotal: Decimal,
}

/// 购物车服务
pub struct CartService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    const fn db(&self) -> &'a DatabaseConnection {
        self.db
    }

    /// 获取购物车，不存在时创建空车
    pub async fn get_cart(&self, owner: &CartOwner) -> Result<CartResponse> {
        let cart = self.get_or_create(owner).await?;
        self.build_response(&cart).await
    }

    /// 加入商品
    ///
    /// 已有条目与新增数量合并后不得超过库存，超出时报 Stock 并给出可用量。
    pub async fn add_item(
        &self,
        owner: &CartOwner,
        product_id: i32,
        quantity: i32,
    ) -> Result<ServiceResponse<CartResponse>> {
        crate::ensure_validation!(quantity >= 1, "数量必须大于等于 1");

        let product = visible_products()
            .filter(products::Column::Id.eq(product_id))
            .one(self.db())
            .await
            .context("Failed to fetch product")?
            .ok_or_else(|| MarketError::not_found("Product", product_id.to_string()))?;

        let cart = self.get_or_create(owner).await?;
        let existing = self.find_item(cart.id, product.id).await?;
        let in_cart = existing.as_ref().map_or(0, |item| item.quantity);

        if in_cart + quantity > product.stock {
            let message = if in_cart > 0 {
                format!(
                    "Only {} items available. You have {} in cart.",
                    product.stock, in_cart
                )
            } else {
                format!("Only {} items available.", product.stock)
            };
            return Err(MarketError::stock(message, product.stock));
        }

        let now = Utc::now().naive_utc();
        match existing {
            Some(item) => {
                let new_quantity = item.quantity + quantity;
                let mut active_model: cart_items::ActiveModel = item.into();
                active_model.quantity = Set(new_quantity);
                active_model.updated_at = Set(now);
                active_model
                    .update(self.db())
                    .await
                    .context("Failed to update cart item")?;
            }
            None => {
                let model = cart_items::ActiveModel {
                    cart_id: Set(cart.id),
                    product_id: Set(product.id),
                    quantity: Set(quantity),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                CartItems::insert(model)
                    .exec(self.db())
                    .await
                    .context("Failed to create cart item")?;
            }
        }

        self.touch_cart(cart.id).await?;
        let response = self.build_response(&cart).await?;
        Ok(ServiceResponse::with_message(response, "已加入购物车"))
    }

    /// 修改条目数量
    pub async fn update_item(
        &self,
        owner: &CartOwner,
        item_id: i32,
        quantity: i32,
    ) -> Result<ServiceResponse<CartResponse>> {
        crate::ensure_validation!(quantity >= 1, "数量必须大于等于 1");

        let cart = self.get_or_create(owner).await?;
        let item = self.fetch_item(cart.id, item_id).await?;

        let product = products::Entity::find_by_id(item.product_id)
            .one(self.db())
            .await
            .context("Failed to fetch product")?
            .ok_or_else(|| MarketError::not_found("Product", item.product_id.to_string()))?;

        if quantity > product.stock {
            return Err(MarketError::stock(
                format!("Only {} items available.", product.stock),
                product.stock,
            ));
        }

        let mut active_model: cart_items::ActiveModel = item.into();
        active_model.quantity = Set(quantity);
        active_model.updated_at = Set(Utc::now().naive_utc());
        active_model
            .update(self.db())
            .await
            .context("Failed to update cart item")?;

        self.touch_cart(cart.id).await?;
        let response = self.build_response(&cart).await?;
        Ok(ServiceResponse::with_message(response, "购物车已更新"))
    }

    /// 删除条目
    pub async fn remove_item(
        &self,
        owner: &CartOwner,
        item_id: i32,
    ) -> Result<ServiceResponse<CartResponse>> {
        let cart = self.get_or_create(owner).await?;
        let item = self.fetch_item(cart.id, item_id).await?;

        CartItems::delete_by_id(item.id)
            .exec(self.db())
            .await
            .context("Failed to remove cart item")?;

        self.touch_cart(cart.id).await?;
        let response = self.build_response(&cart).await?;
        Ok(ServiceResponse::with_message(response, "条目已删除"))
    }

    /// 清空购物车
    pub async fn clear(&self, owner: &CartOwner) -> Result<ServiceResponse<()>> {
        let cart = self.get_or_create(owner).await?;
        self.clear_items(cart.id).await?;
        Ok(ServiceResponse::with_message((), "购物车已清空"))
    }

    /// 角标：条目数量与小计
    pub async fn count(&self, owner: &CartOwner) -> Result<CartBadge> {
        let cart = self.get_or_create(owner).await?;
        let response = self.build_response(&cart).await?;
        Ok(CartBadge {
            total_items: response.total_items,
            subtotal: response.subtotal,
        })
    }

    /// 登录时合并游客购物车行
    ///
    /// 逐行尽力合并：商品失效产生警告并跳过；超出库存静默夹取，不产生警告。
    pub async fn merge(
        &self,
        auth: &AuthContext,
        guest_items: &[GuestCartLine],
    ) -> Result<CartMergeResult> {
        let user_owner = CartOwner::User(auth.user_id);
        let user_cart = self.get_or_create(&user_owner).await?;

        let mut merged_items = 0;
        let mut warnings = Vec::new();
        let now = Utc::now().naive_utc();

        for guest_item in guest_items {
            if guest_item.quantity < 1 {
                continue;
            }
            let product = visible_products()
                .filter(products::Column::Id.eq(guest_item.product_id))
                .one(self.db())
                .await
                .context("Failed to fetch product")?;

            let Some(product) = product else {
                warnings.push(format!(
                    "Product #{} is no longer available.",
                    guest_item.product_id
                ));
                continue;
            };
            if product.stock <= 0 {
                warnings.push(format!("{} is out of stock.", product.name));
                continue;
            }

            let existing = self.find_item(user_cart.id, product.id).await?;
            let combined =
                existing.as_ref().map_or(0, |item| item.quantity) + guest_item.quantity;
            // 超库存静默夹取
            let quantity = combined.min(product.stock);

            match existing {
                Some(item) => {
                    let mut active_model: cart_items::ActiveModel = item.into();
                    active_model.quantity = Set(quantity);
                    active_model.updated_at = Set(now);
                    active_model
                        .update(self.db())
                        .await
                        .context("Failed to update cart item")?;
                }
                None => {
                    let model = cart_items::ActiveModel {
                        cart_id: Set(user_cart.id),
                        product_id: Set(product.id),
                        quantity: Set(quantity),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    };
                    CartItems::insert(model)
                        .exec(self.db())
                        .await
                        .context("Failed to create cart item")?;
                }
            }
            merged_items += 1;
        }

        self.touch_cart(user_cart.id).await?;
        let cart = self.build_response(&user_cart).await?;
        Ok(CartMergeResult {
            merged_items,
            warnings,
            cart,
        })
    }

    /// 游客会话购物车并入登录用户车，随后删除游客车
    pub async fn merge_session(
        &self,
        auth: &AuthContext,
        session_key: &str,
    ) -> Result<CartMergeResult> {
        let guest_cart = Carts::find()
            .filter(carts::Column::SessionKey.eq(session_key))
            .one(self.db())
            .await
            .context("Failed to fetch guest cart")?;

        let Some(guest_cart) = guest_cart else {
            return self.merge(auth, &[]).await;
        };

        let lines: Vec<GuestCartLine> = self
            .list_items(guest_cart.id)
            .await?
            .into_iter()
            .map(|item| GuestCartLine {
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect();

        let result = self.merge(auth, &lines).await?;

        Carts::delete_by_id(guest_cart.id)
            .exec(self.db())
            .await
            .context("Failed to delete guest cart")?;

        Ok(result)
    }

    /// 结账后清空，供订单服务调用
    pub(crate) async fn clear_items(&self, cart_id: i32) -> Result<()> {
        CartItems::delete_many()
            .filter(cart_items::Column::CartId.eq(cart_id))
            .exec(self.db())
            .await
            .context("Failed to clear cart")?;
        Ok(())
    }

    pub(crate) async fn get_or_create(&self, owner: &CartOwner) -> Result<carts::Model> {
        let existing = match owner {
            CartOwner::User(user_id) => Carts::find()
                .filter(carts::Column::UserId.eq(*user_id))
                .one(self.db())
                .await
                .context("Failed to fetch cart")?,
            CartOwner::Guest(session_key) => Carts::find()
                .filter(carts::Column::SessionKey.eq(session_key.as_str()))
                .one(self.db())
                .await
                .context("Failed to fetch cart")?,
        };
        if let Some(cart) = existing {
            return Ok(cart);
        }

        let now = Utc::now().naive_utc();
        let model = match owner {
            CartOwner::User(user_id) => carts::ActiveModel {
                user_id: Set(Some(*user_id)),
                session_key: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            },
            CartOwner::Guest(session_key) => carts::ActiveModel {
                user_id: Set(None),
                session_key: Set(Some(session_key.clone())),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            },
        };

        let insert_result = Carts::insert(model)
            .exec(self.db())
            .await
            .context("Failed to create cart")?;
        Carts::find_by_id(insert_result.last_insert_id)
            .one(self.db())
            .await
            .context("Failed to fetch cart")?
            .ok_or_else(|| {
                MarketError::not_found("Cart", insert_result.last_insert_id.to_string())
            })
    }

    pub(crate) async fn list_items(&self, cart_id: i32) -> Result<Vec<cart_items::Model>> {
        CartItems::find()
            .filter(cart_items::Column::CartId.eq(cart_id))
            .order_by_asc(cart_items::Column::CreatedAt)
            .all(self.db())
            .await
            .context("Failed to fetch cart items")
    }

    async fn find_item(
        &self,
        cart_id: i32,
        product_id: i32,
    ) -> Result<Option<cart_items::Model>> {
        CartItems::find()
            .filter(cart_items::Column::CartId.eq(cart_id))
            .filter(cart_items::Column::ProductId.eq(product_id))
            .one(self.db())
            .await
            .context("Failed to fetch cart item")
    }

    async fn fetch_item(&self, cart_id: i32, item_id: i32) -> Result<cart_items::Model> {
        CartItems::find_by_id(item_id)
            .filter(cart_items::Column::CartId.eq(cart_id))
            .one(self.db())
            .await
            .context("Failed to fetch cart item")?
            .ok_or_else(|| MarketError::not_found("CartItem", item_id.to_string()))
    }

    async fn touch_cart(&self, cart_id: i32) -> Result<()> {
        Carts::update_many()
            .col_expr(
                carts::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now().naive_utc()),
            )
            .filter(carts::Column::Id.eq(cart_id))
            .exec(self.db())
            .await
            .context("Failed to touch cart")?;
        Ok(())
    }

    async fn build_response(&self, cart: &carts::Model) -> Result<CartResponse> {
        let rows = CartItems::find()
            .filter(cart_items::Column::CartId.eq(cart.id))
            .order_by_asc(cart_items::Column::CreatedAt)
            .find_also_related(products::Entity)
            .all(self.db())
            .await
            .context("Failed to fetch cart items")?;

        let mut items = Vec::with_capacity(rows.len());
        let mut total_items = 0;
        let mut subtotal = Decimal::ZERO;

        for (item, product) in rows {
            let Some(product) = product else { continue };
            let line_total = product.price * Decimal::from(item.quantity);
            total_items += item.quantity;
            subtotal += line_total;
            items.push(CartItemResponse {
                id: item.id,
                unit_price: product.price,
                line_total,
                quantity: item.quantity,
                product: product.into(),
            });
        }

        Ok(CartResponse {
            id: cart.id,
            items,
            total_items,
            subtotal,
        })
    }
}
