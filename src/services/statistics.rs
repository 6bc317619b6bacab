//! # 平台统计服务
//!
//! 管理员总览，按需实时聚合，不落任何统计表。

use entity::{
    orders, orders::Entity as Orders, products, products::Entity as Products, users,
    users::Entity as Users, vendors, vendors::Entity as Vendors,
};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
};
use serde::Serialize;

use crate::{
    auth::{AuthContext, UserRole},
    error::{Context, MarketError, Result},
    types::OrderStatus,
};

/// 平台总览
#[derive(Debug, Serialize)]
pub struct PlatformStatistics {
    pub users: UserStatistics,
    pub vendors: Vec<StatusCount>,
    pub products: ProductStatistics,
    pub orders: Vec<StatusCount>,
    /// 已发货/已送达订单总额之和
    pub revenue: Decimal,
}

#[derive(Debug, Serialize)]
pub struct UserStatistics {
    pub total: u64,
    pub customers: u64,
    pub vendors: u64,
}

#[derive(Debug, Serialize)]
pub struct ProductStatistics {
    pub total: u64,
    pub active: u64,
}

#[derive(Debug, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// 统计服务
pub struct StatisticsService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> StatisticsService<'a> {
    #[must_use]
    pub const fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    const fn db(&self) -> &'a DatabaseConnection {
        self.db
    }

    /// 管理员平台总览，空库时各项为零
    pub async fn platform(&self, auth: &AuthContext) -> Result<PlatformStatistics> {
        if !auth.is_admin() {
            return Err(MarketError::permission("权限不足"));
        }

        let total_users = Users::find()
            .count(self.db())
            .await
            .context("Failed to count users")?;
        let customers = Users::find()
            .filter(users::Column::Role.eq(UserRole::Customer.as_str()))
            .count(self.db())
            .await
            .context("Failed to count customers")?;
        let vendor_users = Users::find()
            .filter(users::Column::Role.eq(UserRole::Vendor.as_str()))
            .count(self.db())
            .await
            .context("Failed to count vendor users")?;

        let vendor_counts: Vec<(String, i64)> = Vendors::find()
            .select_only()
            .column(vendors::Column::Status)
            .column_as(vendors::Column::Id.count(), "count")
            .group_by(vendors::Column::Status)
            .into_tuple()
            .all(self.db())
            .await
            .context("Failed to aggregate vendor statuses")?;

        let total_products = Products::find()
            .count(self.db())
            .await
            .context("Failed to count products")?;
        let active_products = Products::find()
            .filter(products::Column::IsActive.eq(true))
            .count(self.db())
            .await
            .context("Failed to count active products")?;

        let order_counts: Vec<(String, i64)> = Orders::find()
            .select_only()
            .column(orders::Column::Status)
            .column_as(orders::Column::Id.count(), "count")
            .group_by(orders::Column::Status)
            .into_tuple()
            .all(self.db())
            .await
            .context("Failed to aggregate order statuses")?;

        let revenue: Option<Decimal> = Orders::find()
            .select_only()
            .column_as(orders::Column::Total.sum(), "revenue")
            .filter(orders::Column::Status.is_in([
                OrderStatus::Shipped.as_str(),
                OrderStatus::Delivered.as_str(),
            ]))
            .into_tuple()
            .one(self.db())
            .await
            .context("Failed to aggregate revenue")?
            .flatten();

        Ok(PlatformStatistics {
            users: UserStatistics {
                total: total_users,
                customers,
                vendors: vendor_users,
            },
            vendors: into_status_counts(vendor_counts),
            products: ProductStatistics {
                total: total_products,
                active: active_products,
            },
            orders: into_status_counts(order_counts),
            revenue: revenue.unwrap_or_default(),
        })
    }
}

fn into_status_counts(rows: Vec<(String, i64)>) -> Vec<StatusCount> {
    rows.into_iter()
        .map(|(status, count)| StatusCount { status, count })
        .collect()
}
