//! # 订单生命周期
//!
//! 取消与管理员状态流转。取消仅限 pending，退库存但不回退销量。

use chrono::Utc;
use entity::{
    order_items, order_items::Entity as OrderItems, orders, orders::Entity as Orders, products,
    products::Entity as Products,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait, sea_query::Expr,
};

use crate::{
    auth::AuthContext,
    error::{Context, MarketError, Result},
    types::OrderStatus,
};

use super::{
    OrderResponse, OrdersService, ensure_admin, parse_order_status, super::shared::ServiceResponse,
};

impl OrdersService<'_> {
    /// 取消本人订单
    ///
    /// 仅 pending 可取消；逐行退回库存，销量计数保持不变。
    pub async fn cancel(
        &self,
        auth: &AuthContext,
        order_number: &str,
    ) -> Result<ServiceResponse<OrderResponse>> {
        let txn = self
            .db()
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let order = Orders::find()
            .filter(orders::Column::OrderNumber.eq(order_number))
            .filter(orders::Column::UserId.eq(auth.user_id))
            .one(&txn)
            .await
            .context("Failed to fetch order")?
            .ok_or_else(|| MarketError::not_found("Order", order_number))?;

        if order.status != OrderStatus::Pending.as_str() {
            return Err(crate::business_error!(
                "Only pending orders can be cancelled"
            ));
        }

        let items = OrderItems::find()
            .filter(order_items::Column::OrderId.eq(order.id))
            .all(&txn)
            .await
            .context("Failed to fetch order items")?;

        let now = Utc::now().naive_utc();
        for item in &items {
            // 商品已删除的条目无库存可退
            let Some(product_id) = item.product_id else {
                continue;
            };
            if let Some(product) = Products::find_by_id(product_id)
                .one(&txn)
                .await
                .context("Failed to fetch product")?
            {
                let new_stock = product.stock + item.quantity;
                let mut product_model: products::ActiveModel = product.into();
                product_model.stock = Set(new_stock);
                product_model.updated_at = Set(now);
                product_model
                    .update(&txn)
                    .await
                    .context("Failed to restore stock")?;
            }
        }

        set_order_status(&txn, &order, OrderStatus::Cancelled).await?;

        let order = Orders::find_by_id(order.id)
            .one(&txn)
            .await
            .context("Failed to fetch order")?
            .ok_or_else(|| MarketError::not_found("Order", order_number))?;
        let items = OrderItems::find()
            .filter(order_items::Column::OrderId.eq(order.id))
            .all(&txn)
            .await
            .context("Failed to fetch order items")?;

        txn.commit().await.context("Failed to commit cancel")?;

        tracing::info!(order_number = %order.order_number, "order cancelled");
        Ok(ServiceResponse::with_message(
            OrderResponse::from_parts(order, items),
            "订单已取消",
        ))
    }

    /// 管理员：更新订单状态并级联到全部条目
    pub async fn admin_update_status(
        &self,
        auth: &AuthContext,
        order_number: &str,
        status: &str,
    ) -> Result<ServiceResponse<OrderResponse>> {
        ensure_admin(auth)?;
        let status = parse_order_status(status)?;

        let order = self.fetch_by_number(order_number).await?;

        if order.status == OrderStatus::Cancelled.as_str() {
            return Err(crate::business_error!("已取消的订单不能变更状态"));
        }
        if status == OrderStatus::Cancelled && order.status != OrderStatus::Pending.as_str() {
            return Err(crate::business_error!(
                "Only pending orders can be cancelled"
            ));
        }

        set_order_status(self.db(), &order, status).await?;

        let order = self.fetch_by_number(order_number).await?;
        let items = OrderItems::find()
            .filter(order_items::Column::OrderId.eq(order.id))
            .all(self.db())
            .await
            .context("Failed to fetch order items")?;

        Ok(ServiceResponse::with_message(
            OrderResponse::from_parts(order, items),
            "订单状态已更新",
        ))
    }
}

/// 订单状态覆盖写入并级联到所有条目
async fn set_order_status<C: ConnectionTrait>(
    conn: &C,
    order: &orders::Model,
    status: OrderStatus,
) -> Result<()> {
    let now = Utc::now().naive_utc();

    Orders::update_many()
        .col_expr(orders::Column::Status, Expr::value(status.as_str()))
        .col_expr(orders::Column::UpdatedAt, Expr::value(now))
        .filter(orders::Column::Id.eq(order.id))
        .exec(conn)
        .await
        .context("Failed to update order status")?;

    OrderItems::update_many()
        .col_expr(order_items::Column::Status, Expr::value(status.as_str()))
        .filter(order_items::Column::OrderId.eq(order.id))
        .exec(conn)
        .await
        .context("Failed to cascade item status")?;

    Ok(())
}
