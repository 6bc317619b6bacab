//! # 订单服务
//!
//! 下单、查询与生命周期管理。下单与取消在单个数据库事务内完成，
//! 库存校验与扣减不会被并发结账穿插。

mod checkout;
mod lifecycle;

pub use checkout::{CheckoutRequest, GuestCheckoutRequest, ShippingAddressInput};

use entity::{
    order_items, order_items::Entity as OrderItems, orders, orders::Entity as Orders,
};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select,
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::AuthContext,
    config::CheckoutConfig,
    error::{Context, MarketError, Result},
    types::OrderStatus,
};

use super::{
    shared::{PaginationInfo, PaginationParams, ServiceResponse, build_page},
    vendors::VendorsService,
};

/// 管理员订单列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct AdminOrderQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
}

/// 订单条目响应
#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub id: i32,
    pub product_id: Option<i32>,
    pub vendor_id: i32,
    pub product_name: String,
    pub product_sku: String,
    pub vendor_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub subtotal: Decimal,
    pub status: String,
}

impl From<order_items::Model> for OrderItemResponse {
    fn from(item: order_items::Model) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            vendor_id: item.vendor_id,
            product_name: item.product_name,
            product_sku: item.product_sku,
            vendor_name: item.vendor_name,
            unit_price: item.unit_price,
            quantity: item.quantity,
            subtotal: item.subtotal,
            status: item.status,
        }
    }
}

/// 订单响应，地址与金额均为下单时快照
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: i32,
    pub order_number: String,
    pub user_id: Option<i32>,
    pub guest_email: Option<String>,
    pub status: String,
    pub shipping_name: String,
    pub shipping_phone: String,
    pub shipping_address_line1: String,
    pub shipping_address_line2: String,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_postal_code: String,
    pub shipping_country: String,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub note: String,
    pub items: Vec<OrderItemResponse>,
    pub created_at: String,
}

impl OrderResponse {
    fn from_parts(order: orders::Model, items: Vec<order_items::Model>) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            user_id: order.user_id,
            guest_email: order.guest_email,
            status: order.status,
            shipping_name: order.shipping_name,
            shipping_phone: order.shipping_phone,
            shipping_address_line1: order.shipping_address_line1,
            shipping_address_line2: order.shipping_address_line2,
            shipping_city: order.shipping_city,
            shipping_state: order.shipping_state,
            shipping_postal_code: order.shipping_postal_code,
            shipping_country: order.shipping_country,
            subtotal: order.subtotal,
            tax: order.tax,
            shipping_cost: order.shipping_cost,
            total: order.total,
            note: order.note,
            items: items.into_iter().map(OrderItemResponse::from).collect(),
            created_at: order.created_at.and_utc().to_rfc3339(),
        }
    }
}

#[derive(Debug)]
pub struct ListOrdersResult {
    pub orders: Vec<OrderResponse>,
    pub pagination: PaginationInfo,
}

/// 订单服务
pub struct OrdersService<'a> {
    db: &'a DatabaseConnection,
    checkout: CheckoutConfig,
}

impl<'a> OrdersService<'a> {
    /// 默认金额参数建服务
    #[must_use]
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self {
            db,
            checkout: CheckoutConfig::default(),
        }
    }

    /// 用配置中的金额参数建服务
    #[must_use]
    pub const fn with_config(db: &'a DatabaseConnection, checkout: CheckoutConfig) -> Self {
        Self { db, checkout }
    }

    const fn db(&self) -> &'a DatabaseConnection {
        self.db
    }

    /// 当前用户的订单列表
    pub async fn my_orders(&self, auth: &AuthContext) -> Result<Vec<OrderResponse>> {
        let orders = Orders::find()
            .filter(orders::Column::UserId.eq(auth.user_id))
            .order_by_desc(orders::Column::CreatedAt)
            .all(self.db())
            .await
            .context("Failed to fetch orders")?;

        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let items = self.load_items(self.db(), order.id).await?;
            result.push(OrderResponse::from_parts(order, items));
        }
        Ok(result)
    }

    /// 按订单号查询本人订单，归属失败报 NotFound
    pub async fn get(&self, auth: &AuthContext, order_number: &str) -> Result<OrderResponse> {
        let order = Orders::find()
            .filter(orders::Column::OrderNumber.eq(order_number))
            .filter(orders::Column::UserId.eq(auth.user_id))
            .one(self.db())
            .await
            .context("Failed to fetch order")?
            .ok_or_else(|| MarketError::not_found("Order", order_number))?;

        let items = self.load_items(self.db(), order.id).await?;
        Ok(OrderResponse::from_parts(order, items))
    }

    /// 游客查单：订单号与邮箱必须同时匹配
    pub async fn guest_order(&self, order_number: &str, email: &str) -> Result<OrderResponse> {
        let order = Orders::find()
            .filter(orders::Column::OrderNumber.eq(order_number))
            .filter(orders::Column::GuestEmail.eq(email))
            .one(self.db())
            .await
            .context("Failed to fetch order")?
            .ok_or_else(|| MarketError::not_found("Order", order_number))?;

        let items = self.load_items(self.db(), order.id).await?;
        Ok(OrderResponse::from_parts(order, items))
    }

    /// 商户：包含本商户条目的订单列表
    pub async fn vendor_orders(&self, auth: &AuthContext) -> Result<Vec<OrderResponse>> {
        let vendor = VendorsService::new(self.db()).fetch_own_vendor(auth).await?;

        let order_ids: Vec<i32> = OrderItems::find()
            .select_only()
            .column(order_items::Column::OrderId)
            .distinct()
            .filter(order_items::Column::VendorId.eq(vendor.id))
            .into_tuple()
            .all(self.db())
            .await
            .context("Failed to fetch vendor order ids")?;

        let orders = Orders::find()
            .filter(orders::Column::Id.is_in(order_ids))
            .order_by_desc(orders::Column::CreatedAt)
            .all(self.db())
            .await
            .context("Failed to fetch orders")?;

        // 商户视图只含自己的条目
        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let items = OrderItems::find()
                .filter(order_items::Column::OrderId.eq(order.id))
                .filter(order_items::Column::VendorId.eq(vendor.id))
                .all(self.db())
                .await
                .context("Failed to fetch order items")?;
            result.push(OrderResponse::from_parts(order, items));
        }
        Ok(result)
    }

    /// 商户：某订单中本商户的条目，无条目时报 NotFound
    pub async fn vendor_order_items(
        &self,
        auth: &AuthContext,
        order_number: &str,
    ) -> Result<Vec<OrderItemResponse>> {
        let vendor = VendorsService::new(self.db()).fetch_own_vendor(auth).await?;

        let order = Orders::find()
            .filter(orders::Column::OrderNumber.eq(order_number))
            .one(self.db())
            .await
            .context("Failed to fetch order")?
            .ok_or_else(|| MarketError::not_found("Order", order_number))?;

        let items = OrderItems::find()
            .filter(order_items::Column::OrderId.eq(order.id))
            .filter(order_items::Column::VendorId.eq(vendor.id))
            .all(self.db())
            .await
            .context("Failed to fetch order items")?;

        if items.is_empty() {
            return Err(MarketError::not_found("Order", order_number));
        }
        Ok(items.into_iter().map(OrderItemResponse::from).collect())
    }

    /// 商户：更新本商户单个条目的状态
    ///
    /// 条目转为 delivered 时重算商户成交计数。
    pub async fn vendor_update_item_status(
        &self,
        auth: &AuthContext,
        item_id: i32,
        status: &str,
    ) -> Result<ServiceResponse<OrderItemResponse>> {
        let vendor = VendorsService::new(self.db()).fetch_own_vendor(auth).await?;
        let status = parse_order_status(status)?;

        let item = OrderItems::find_by_id(item_id)
            .filter(order_items::Column::VendorId.eq(vendor.id))
            .one(self.db())
            .await
            .context("Failed to fetch order item")?
            .ok_or_else(|| MarketError::not_found("OrderItem", item_id.to_string()))?;

        let mut active_model: order_items::ActiveModel = item.into();
        active_model.status = sea_orm::Set(status.as_str().to_string());
        let updated = sea_orm::ActiveModelTrait::update(active_model, self.db())
            .await
            .context("Failed to update order item")?;

        if status == OrderStatus::Delivered {
            VendorsService::new(self.db())
                .recompute_sales_count(vendor.id)
                .await?;
        }

        Ok(ServiceResponse::with_message(updated.into(), "条目状态已更新"))
    }

    /// 管理员：订单列表
    pub async fn list_admin(
        &self,
        auth: &AuthContext,
        query: &AdminOrderQuery,
    ) -> Result<ListOrdersResult> {
        ensure_admin(auth)?;

        let params = PaginationParams::new(query.page, query.limit, 10, 100);
        let filtered = || Self::admin_filtered(query);

        let total = filtered()
            .count(self.db())
            .await
            .context("Failed to count orders")?;
        let orders = filtered()
            .order_by_desc(orders::Column::CreatedAt)
            .offset(params.offset())
            .limit(params.limit)
            .all(self.db())
            .await
            .context("Failed to fetch orders")?;

        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let items = self.load_items(self.db(), order.id).await?;
            result.push(OrderResponse::from_parts(order, items));
        }

        Ok(ListOrdersResult {
            orders: result,
            pagination: build_page(total, params),
        })
    }

    /// 管理员：按订单号查询任意订单
    pub async fn get_admin(
        &self,
        auth: &AuthContext,
        order_number: &str,
    ) -> Result<OrderResponse> {
        ensure_admin(auth)?;
        let order = self.fetch_by_number(order_number).await?;
        let items = self.load_items(self.db(), order.id).await?;
        Ok(OrderResponse::from_parts(order, items))
    }

    fn admin_filtered(query: &AdminOrderQuery) -> Select<Orders> {
        let mut select = Orders::find();
        if let Some(status) = query
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            select = select.filter(orders::Column::Status.eq(status));
        }
        select
    }

    pub(crate) async fn fetch_by_number(&self, order_number: &str) -> Result<orders::Model> {
        Orders::find()
            .filter(orders::Column::OrderNumber.eq(order_number))
            .one(self.db())
            .await
            .context("Failed to fetch order")?
            .ok_or_else(|| MarketError::not_found("Order", order_number))
    }

    async fn load_items<C: ConnectionTrait>(
        &self,
        conn: &C,
        order_id: i32,
    ) -> Result<Vec<order_items::Model>> {
        OrderItems::find()
            .filter(order_items::Column::OrderId.eq(order_id))
            .all(conn)
            .await
            .context("Failed to fetch order items")
    }
}

fn ensure_admin(auth: &AuthContext) -> Result<()> {
    if auth.is_admin() {
        Ok(())
    } else {
        Err(MarketError::permission("权限不足"))
    }
}

fn parse_order_status(raw: &str) -> Result<OrderStatus> {
    OrderStatus::parse(raw)
        .ok_or_else(|| MarketError::validation_field(format!("无效的订单状态: {raw}"), "status"))
}
