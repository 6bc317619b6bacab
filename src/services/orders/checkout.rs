//! # 结账流程
//!
//! 购物车结账与游客直购共用同一套下单事务：
//! 库存校验、订单与条目快照、扣库存、清车全部原子完成。

use chrono::Utc;
use std::collections::HashMap;

use entity::{
    addresses, cart_items, cart_items::Entity as CartItems, carts, carts::Entity as Carts,
    order_items, order_items::Entity as OrderItems, orders, orders::Entity as Orders, products,
    products::Entity as Products, vendors, vendors::Entity as Vendors,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, JoinType, QueryFilter,
    QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::Deserialize;

use crate::{
    auth::AuthContext,
    config::CheckoutConfig,
    error::{Context, MarketError, Result},
    types::{AddressType, OrderStatus, VendorStatus},
};

use super::{
    super::{cart::GuestCartLine, shared::ServiceResponse},
    OrderResponse, OrdersService,
};

/// 订单号碰撞重掷上限
const ORDER_NUMBER_RETRIES: u32 = 5;

/// 收货地址输入，字段直接快照进订单
#[derive(Debug, Clone, Deserialize)]
pub struct ShippingAddressInput {
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// 结账请求：保存的地址 ID 或内联地址二选一
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub address_id: Option<i32>,
    pub address: Option<ShippingAddressInput>,
    /// 内联地址另存为新地址
    #[serde(default)]
    pub save_address: bool,
    #[serde(default)]
    pub note: String,
}

/// 游客直购请求
#[derive(Debug, Deserialize)]
pub struct GuestCheckoutRequest {
    pub email: String,
    pub items: Vec<GuestCartLine>,
    pub address: ShippingAddressInput,
    #[serde(default)]
    pub note: String,
}

impl OrdersService<'_> {
    /// 登录用户结账
    pub async fn checkout(
        &self,
        auth: &AuthContext,
        request: &CheckoutRequest,
    ) -> Result<ServiceResponse<OrderResponse>> {
        let shipping = self.resolve_shipping(auth, request).await?;

        let txn = self
            .db()
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let cart = Carts::find()
            .filter(carts::Column::UserId.eq(auth.user_id))
            .one(&txn)
            .await
            .context("Failed to fetch cart")?;
        let lines = match &cart {
            Some(cart) => CartItems::find()
                .filter(cart_items::Column::CartId.eq(cart.id))
                .all(&txn)
                .await
                .context("Failed to fetch cart items")?,
            None => Vec::new(),
        };
        if lines.is_empty() {
            return Err(MarketError::validation("Cart is empty"));
        }

        let mut order_lines = Vec::with_capacity(lines.len());
        for line in &lines {
            let product = Products::find_by_id(line.product_id)
                .one(&txn)
                .await
                .context("Failed to fetch product")?
                .ok_or_else(|| {
                    MarketError::not_found("Product", line.product_id.to_string())
                })?;
            ensure_line_stock(&product, line.quantity)?;
            order_lines.push((product, line.quantity));
        }

        if request.save_address {
            if let Some(address) = &request.address {
                save_new_address(&txn, auth.user_id, address).await?;
            }
        }

        let order = place_order(
            &txn,
            &self.checkout,
            Some(auth.user_id),
            None,
            &shipping,
            &request.note,
            &order_lines,
        )
        .await?;

        if let Some(cart) = cart {
            CartItems::delete_many()
                .filter(cart_items::Column::CartId.eq(cart.id))
                .exec(&txn)
                .await
                .context("Failed to clear cart")?;
        }

        let items = OrderItems::find()
            .filter(order_items::Column::OrderId.eq(order.id))
            .all(&txn)
            .await
            .context("Failed to fetch order items")?;

        txn.commit().await.context("Failed to commit checkout")?;

        tracing::info!(order_number = %order.order_number, "order placed");
        Ok(ServiceResponse::with_message(
            OrderResponse::from_parts(order, items),
            "下单成功",
        ))
    }

    /// 游客直购：调用方直接提交商品行与内联地址
    pub async fn guest_checkout(
        &self,
        request: &GuestCheckoutRequest,
    ) -> Result<ServiceResponse<OrderResponse>> {
        let email = request.email.trim().to_lowercase();
        crate::ensure_validation!(
            email.len() <= 255 && email.contains('@'),
            "邮箱格式无效"
        );
        crate::ensure_validation!(!request.items.is_empty(), "订单不能为空");
        validate_shipping(&request.address)?;

        let txn = self
            .db()
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let mut order_lines = Vec::with_capacity(request.items.len());
        for line in &request.items {
            crate::ensure_validation!(line.quantity >= 1, "数量必须大于等于 1");
            let product = Products::find()
                .filter(products::Column::Id.eq(line.product_id))
                .filter(products::Column::IsActive.eq(true))
                .join(JoinType::InnerJoin, products::Relation::Vendors.def())
                .filter(vendors::Column::Status.eq(VendorStatus::Approved.as_str()))
                .one(&txn)
                .await
                .context("Failed to fetch product")?
                .ok_or_else(|| {
                    MarketError::not_found("Product", line.product_id.to_string())
                })?;
            ensure_line_stock(&product, line.quantity)?;
            order_lines.push((product, line.quantity));
        }

        let order = place_order(
            &txn,
            &self.checkout,
            None,
            Some(email),
            &request.address,
            &request.note,
            &order_lines,
        )
        .await?;

        let items = OrderItems::find()
            .filter(order_items::Column::OrderId.eq(order.id))
            .all(&txn)
            .await
            .context("Failed to fetch order items")?;

        txn.commit().await.context("Failed to commit checkout")?;

        tracing::info!(order_number = %order.order_number, "guest order placed");
        Ok(ServiceResponse::with_message(
            OrderResponse::from_parts(order, items),
            "下单成功",
        ))
    }

    /// 结账地址：保存的地址（须归属本人）或内联地址
    async fn resolve_shipping(
        &self,
        auth: &AuthContext,
        request: &CheckoutRequest,
    ) -> Result<ShippingAddressInput> {
        if let Some(address_id) = request.address_id {
            let address = addresses::Entity::find_by_id(address_id)
                .filter(addresses::Column::UserId.eq(auth.user_id))
                .one(self.db())
                .await
                .context("Failed to fetch address")?
                .ok_or_else(|| MarketError::not_found("Address", address_id.to_string()))?;
            return Ok(ShippingAddressInput {
                full_name: address.full_name,
                phone: address.phone,
                address_line1: address.address_line1,
                address_line2: address.address_line2,
                city: address.city,
                state: address.state,
                postal_code: address.postal_code,
                country: address.country,
            });
        }

        let address = request
            .address
            .as_ref()
            .ok_or_else(|| MarketError::validation("缺少收货地址"))?;
        validate_shipping(address)?;
        Ok(address.clone())
    }
}

/// 下单核心：金额计算、订单号生成、条目快照与库存扣减
async fn place_order<C: ConnectionTrait>(
    conn: &C,
    pricing: &CheckoutConfig,
    user_id: Option<i32>,
    guest_email: Option<String>,
    shipping: &ShippingAddressInput,
    note: &str,
    lines: &[(products::Model, i32)],
) -> Result<orders::Model> {
    let subtotal: Decimal = lines
        .iter()
        .map(|(product, quantity)| product.price * Decimal::from(*quantity))
        .sum();
    let tax = (subtotal * pricing.tax_rate).round_dp(2);
    let shipping_cost = if subtotal < pricing.free_shipping_threshold {
        pricing.shipping_fee
    } else {
        Decimal::ZERO
    };
    let total = subtotal + tax + shipping_cost;

    let order_number = generate_order_number(conn).await?;
    let now = Utc::now().naive_utc();

    // 商户名称随条目快照
    let vendor_ids: Vec<i32> = lines.iter().map(|(p, _)| p.vendor_id).collect();
    let vendor_names: HashMap<i32, String> = Vendors::find()
        .filter(vendors::Column::Id.is_in(vendor_ids))
        .all(conn)
        .await
        .context("Failed to fetch vendors")?
        .into_iter()
        .map(|vendor| (vendor.id, vendor.store_name))
        .collect();

    let order_model = orders::ActiveModel {
        order_number: Set(order_number),
        user_id: Set(user_id),
        guest_email: Set(guest_email),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        shipping_name: Set(shipping.full_name.trim().to_string()),
        shipping_phone: Set(shipping.phone.clone()),
        shipping_address_line1: Set(shipping.address_line1.clone()),
        shipping_address_line2: Set(shipping.address_line2.clone()),
        shipping_city: Set(shipping.city.clone()),
        shipping_state: Set(shipping.state.clone()),
        shipping_postal_code: Set(shipping.postal_code.clone()),
        shipping_country: Set(shipping.country.clone()),
        subtotal: Set(subtotal),
        tax: Set(tax),
        shipping_cost: Set(shipping_cost),
        total: Set(total),
        note: Set(note.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let insert_result = Orders::insert(order_model)
        .exec(conn)
        .await
        .context("Failed to create order")?;
    let order_id = insert_result.last_insert_id;

    for (product, quantity) in lines {
        let item_subtotal = product.price * Decimal::from(*quantity);
        let item_model = order_items::ActiveModel {
            order_id: Set(order_id),
            product_id: Set(Some(product.id)),
            vendor_id: Set(product.vendor_id),
            product_name: Set(product.name.clone()),
            product_sku: Set(product.sku.clone()),
            vendor_name: Set(vendor_names
                .get(&product.vendor_id)
                .cloned()
                .unwrap_or_default()),
            unit_price: Set(product.price),
            quantity: Set(*quantity),
            subtotal: Set(item_subtotal),
            status: Set(OrderStatus::Pending.as_str().to_string()),
            created_at: Set(now),
            ..Default::default()
        };
        OrderItems::insert(item_model)
            .exec(conn)
            .await
            .context("Failed to create order item")?;

        // 扣库存夹到 0，销量随单累加
        let mut product_model: products::ActiveModel = product.clone().into();
        product_model.stock = Set((product.stock - quantity).max(0));
        product_model.sales_count = Set(product.sales_count + quantity);
        product_model.updated_at = Set(now);
        product_model
            .update(conn)
            .await
            .context("Failed to update product stock")?;
    }

    Orders::find_by_id(order_id)
        .one(conn)
        .await
        .context("Failed to fetch order")?
        .ok_or_else(|| MarketError::not_found("Order", order_id.to_string()))
}

/// `ORD-` + 8 位大写十六进制，碰撞时重掷
async fn generate_order_number<C: ConnectionTrait>(conn: &C) -> Result<String> {
    for _ in 0..ORDER_NUMBER_RETRIES {
        let suffix: u32 = rand::random();
        let candidate = format!("ORD-{suffix:08X}");
        let taken = Orders::find()
            .filter(orders::Column::OrderNumber.eq(candidate.as_str()))
            .one(conn)
            .await
            .context("Failed to check order number")?
            .is_some();
        if !taken {
            return Ok(candidate);
        }
    }
    Err(crate::internal_error!("订单号生成失败"))
}

fn ensure_line_stock(product: &products::Model, quantity: i32) -> Result<()> {
    if quantity > product.stock {
        return Err(MarketError::stock(
            format!("Only {} of {} available.", product.stock, product.name),
            product.stock,
        ));
    }
    Ok(())
}

async fn save_new_address<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    address: &ShippingAddressInput,
) -> Result<()> {
    let now = Utc::now().naive_utc();
    let model = addresses::ActiveModel {
        user_id: Set(Some(user_id)),
        full_name: Set(address.full_name.trim().to_string()),
        phone: Set(address.phone.clone()),
        address_line1: Set(address.address_line1.clone()),
        address_line2: Set(address.address_line2.clone()),
        city: Set(address.city.clone()),
        state: Set(address.state.clone()),
        postal_code: Set(address.postal_code.clone()),
        country: Set(address.country.clone()),
        address_type: Set(AddressType::Shipping.as_str().to_string()),
        is_default: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    addresses::Entity::insert(model)
        .exec(conn)
        .await
        .context("Failed to save address")?;
    Ok(())
}

fn validate_shipping(address: &ShippingAddressInput) -> Result<()> {
    crate::ensure_validation!(!address.full_name.trim().is_empty(), "收件人不能为空");
    crate::ensure_validation!(
        !address.address_line1.trim().is_empty(),
        "地址第一行不能为空"
    );
    crate::ensure_validation!(!address.city.trim().is_empty(), "城市不能为空");
    crate::ensure_validation!(!address.postal_code.trim().is_empty(), "邮编不能为空");
    crate::ensure_validation!(!address.country.trim().is_empty(), "国家不能为空");
    Ok(())
}
