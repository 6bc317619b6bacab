//! # 商户服务
//!
//! 商户入驻、资料维护、审核状态管理与经营看板。

use chrono::Utc;
use entity::{
    order_items, order_items::Entity as OrderItems, orders, products,
    products::Entity as Products, users, users::Entity as Users, vendors,
    vendors::Entity as Vendors,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
    sea_query::{Expr, Func},
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{AuthContext, UserRole},
    error::{Context, MarketError, Result},
    types::{OrderStatus, VendorStatus},
};

use super::shared::{PaginationInfo, PaginationParams, ServiceResponse, build_page, slugify};

/// 商户入驻请求
#[derive(Debug, Deserialize)]
pub struct VendorRegisterRequest {
    pub store_name: String,
    #[serde(default)]
    pub description: String,
    pub business_email: String,
    #[serde(default)]
    pub business_phone: String,
    #[serde(default)]
    pub business_address: String,
}

/// 商户资料更新请求
#[derive(Debug, Default, Deserialize)]
pub struct VendorUpdateRequest {
    pub store_name: Option<String>,
    pub description: Option<String>,
    pub business_email: Option<String>,
    pub business_phone: Option<String>,
    pub business_address: Option<String>,
}

/// 公开商户列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct VendorQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub featured: Option<bool>,
}

/// 管理员商户列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct AdminVendorQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
}

/// 商户完整响应（本人/管理员可见）
#[derive(Debug, Serialize)]
pub struct VendorResponse {
    pub id: i32,
    pub user_id: i32,
    pub store_name: String,
    pub slug: String,
    pub description: String,
    pub business_email: String,
    pub business_phone: String,
    pub business_address: String,
    pub status: String,
    pub is_featured: bool,
    pub total_products: i32,
    pub total_orders: i32,
    pub created_at: String,
}

impl From<vendors::Model> for VendorResponse {
    fn from(vendor: vendors::Model) -> Self {
        Self {
            id: vendor.id,
            user_id: vendor.user_id,
            store_name: vendor.store_name,
            slug: vendor.slug,
            description: vendor.description,
            business_email: vendor.business_email,
            business_phone: vendor.business_phone,
            business_address: vendor.business_address,
            status: vendor.status,
            is_featured: vendor.is_featured,
            total_products: vendor.total_products,
            total_orders: vendor.total_orders,
            created_at: vendor.created_at.and_utc().to_rfc3339(),
        }
    }
}

/// 商户公开响应
#[derive(Debug, Serialize)]
pub struct VendorPublicResponse {
    pub id: i32,
    pub store_name: String,
    pub slug: String,
    pub description: String,
    pub is_featured: bool,
    pub total_products: i32,
}

impl From<vendors::Model> for VendorPublicResponse {
    fn from(vendor: vendors::Model) -> Self {
        Self {
            id: vendor.id,
            store_name: vendor.store_name,
            slug: vendor.slug,
            description: vendor.description,
            is_featured: vendor.is_featured,
            total_products: vendor.total_products,
        }
    }
}

#[derive(Debug)]
pub struct ListVendorsResult<T> {
    pub vendors: Vec<T>,
    pub pagination: PaginationInfo,
}

/// 商户经营看板
#[derive(Debug, Serialize)]
pub struct VendorDashboard {
    pub total_products: u64,
    pub active_products: u64,
    pub out_of_stock_products: u64,
    /// 按条目状态统计的订单条目数量
    pub item_status_counts: Vec<StatusCount>,
    /// 含本商户商品的订单数
    pub total_orders: u64,
    /// 已发货/已送达订单中本商户条目小计之和
    pub revenue: Decimal,
}

#[derive(Debug, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// 商户服务
pub struct VendorsService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> VendorsService<'a> {
    #[must_use]
    pub const fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    const fn db(&self) -> &'a DatabaseConnection {
        self.db
    }

    /// 商户入驻：创建店铺档案并将用户角色切换为 vendor
    pub async fn register(
        &self,
        auth: &AuthContext,
        request: &VendorRegisterRequest,
    ) -> Result<ServiceResponse<VendorResponse>> {
        validate_store_name(&request.store_name)?;
        validate_business_email(&request.business_email)?;

        if self.find_by_user(auth.user_id).await?.is_some() {
            return Err(MarketError::conflict("Vendor", auth.user_id.to_string()));
        }
        self.ensure_unique_store_name(None, &request.store_name)
            .await?;

        let now = Utc::now().naive_utc();
        let store_name = request.store_name.trim().to_string();
        let slug = slugify(&store_name);

        let model = vendors::ActiveModel {
            user_id: Set(auth.user_id),
            store_name: Set(store_name),
            slug: Set(slug),
            description: Set(request.description.clone()),
            business_email: Set(request.business_email.trim().to_lowercase()),
            business_phone: Set(request.business_phone.clone()),
            business_address: Set(request.business_address.clone()),
            status: Set(VendorStatus::Pending.as_str().to_string()),
            is_featured: Set(false),
            total_products: Set(0),
            total_orders: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let insert_result = Vendors::insert(model)
            .exec(self.db())
            .await
            .context("Failed to create vendor")?;

        // 入驻后用户角色升级为商户
        if let Some(user) = Users::find_by_id(auth.user_id)
            .one(self.db())
            .await
            .context("Failed to fetch user")?
        {
            let mut user_model: users::ActiveModel = user.into();
            user_model.role = Set(UserRole::Vendor.as_str().to_string());
            user_model.updated_at = Set(now);
            user_model
                .update(self.db())
                .await
                .context("Failed to update user role")?;
        }

        let created = self.fetch_vendor(insert_result.last_insert_id).await?;
        Ok(ServiceResponse::with_message(
            created.into(),
            "商户注册成功，等待审核",
        ))
    }

    /// 当前商户资料
    pub async fn my_profile(&self, auth: &AuthContext) -> Result<VendorResponse> {
        let vendor = self.fetch_own_vendor(auth).await?;
        Ok(vendor.into())
    }

    /// 更新当前商户资料
    pub async fn update_profile(
        &self,
        auth: &AuthContext,
        request: &VendorUpdateRequest,
    ) -> Result<ServiceResponse<VendorResponse>> {
        let vendor = self.fetch_own_vendor(auth).await?;

        if let Some(store_name) = &request.store_name {
            validate_store_name(store_name)?;
            self.ensure_unique_store_name(Some(vendor.id), store_name)
                .await?;
        }
        if let Some(email) = &request.business_email {
            validate_business_email(email)?;
        }

        let mut active_model: vendors::ActiveModel = vendor.into();
        if let Some(store_name) = &request.store_name {
            let trimmed = store_name.trim().to_string();
            active_model.slug = Set(slugify(&trimmed));
            active_model.store_name = Set(trimmed);
        }
        if let Some(description) = &request.description {
            active_model.description = Set(description.clone());
        }
        if let Some(email) = &request.business_email {
            active_model.business_email = Set(email.trim().to_lowercase());
        }
        if let Some(phone) = &request.business_phone {
            active_model.business_phone = Set(phone.clone());
        }
        if let Some(address) = &request.business_address {
            active_model.business_address = Set(address.clone());
        }
        active_model.updated_at = Set(Utc::now().naive_utc());

        let updated = active_model
            .update(self.db())
            .await
            .context("Failed to update vendor")?;

        Ok(ServiceResponse::with_message(updated.into(), "商户资料更新成功"))
    }

    /// 管理员：审核商户状态
    ///
    /// action ∈ {approve, reject, suspend}，直接覆盖状态，不保留历史。
    pub async fn set_status(
        &self,
        auth: &AuthContext,
        vendor_id: i32,
        action: &str,
    ) -> Result<ServiceResponse<VendorResponse>> {
        ensure_admin(auth)?;

        let status = match action {
            "approve" => VendorStatus::Approved,
            "reject" => VendorStatus::Rejected,
            "suspend" => VendorStatus::Suspended,
            _ => {
                return Err(MarketError::validation_field(
                    format!("无效的审核动作: {action}"),
                    "action",
                ));
            }
        };

        let vendor = self.fetch_vendor(vendor_id).await?;
        let mut active_model: vendors::ActiveModel = vendor.into();
        active_model.status = Set(status.as_str().to_string());
        active_model.updated_at = Set(Utc::now().naive_utc());

        let updated = active_model
            .update(self.db())
            .await
            .context("Failed to update vendor status")?;

        Ok(ServiceResponse::with_message(
            updated.into(),
            format!("商户状态已更新为 {status}"),
        ))
    }

    /// 商户经营看板，每次调用实时聚合
    pub async fn dashboard(&self, auth: &AuthContext) -> Result<VendorDashboard> {
        let vendor = self.fetch_own_vendor(auth).await?;

        let total_products = Products::find()
            .filter(products::Column::VendorId.eq(vendor.id))
            .count(self.db())
            .await
            .context("Failed to count products")?;
        let active_products = Products::find()
            .filter(products::Column::VendorId.eq(vendor.id))
            .filter(products::Column::IsActive.eq(true))
            .count(self.db())
            .await
            .context("Failed to count active products")?;
        let out_of_stock_products = Products::find()
            .filter(products::Column::VendorId.eq(vendor.id))
            .filter(products::Column::Stock.lte(0))
            .count(self.db())
            .await
            .context("Failed to count out-of-stock products")?;

        let item_status_counts: Vec<(String, i64)> = OrderItems::find()
            .select_only()
            .column(order_items::Column::Status)
            .column_as(order_items::Column::Id.count(), "count")
            .filter(order_items::Column::VendorId.eq(vendor.id))
            .group_by(order_items::Column::Status)
            .into_tuple()
            .all(self.db())
            .await
            .context("Failed to aggregate item statuses")?;

        let order_ids: Vec<i32> = OrderItems::find()
            .select_only()
            .column(order_items::Column::OrderId)
            .distinct()
            .filter(order_items::Column::VendorId.eq(vendor.id))
            .into_tuple()
            .all(self.db())
            .await
            .context("Failed to count distinct orders")?;

        let revenue: Option<Decimal> = OrderItems::find()
            .select_only()
            .column_as(order_items::Column::Subtotal.sum(), "revenue")
            .join(JoinType::InnerJoin, order_items::Relation::Orders.def())
            .filter(order_items::Column::VendorId.eq(vendor.id))
            .filter(orders::Column::Status.is_in([
                OrderStatus::Shipped.as_str(),
                OrderStatus::Delivered.as_str(),
            ]))
            .into_tuple()
            .one(self.db())
            .await
            .context("Failed to aggregate revenue")?
            .flatten();

        Ok(VendorDashboard {
            total_products,
            active_products,
            out_of_stock_products,
            item_status_counts: item_status_counts
                .into_iter()
                .map(|(status, count)| StatusCount { status, count })
                .collect(),
            total_orders: order_ids.len() as u64,
            revenue: revenue.unwrap_or_default(),
        })
    }

    /// 重算商品计数（冗余字段按需刷新）
    pub async fn recompute_product_count(&self, vendor_id: i32) -> Result<i32> {
        let count = Products::find()
            .filter(products::Column::VendorId.eq(vendor_id))
            .filter(products::Column::IsActive.eq(true))
            .count(self.db())
            .await
            .context("Failed to count vendor products")?;

        let count = i32::try_from(count).unwrap_or(i32::MAX);
        Vendors::update_many()
            .col_expr(vendors::Column::TotalProducts, Expr::value(count))
            .filter(vendors::Column::Id.eq(vendor_id))
            .exec(self.db())
            .await
            .context("Failed to update product count")?;

        Ok(count)
    }

    /// 重算成交计数：已发货/已送达的订单条目数
    pub async fn recompute_sales_count(&self, vendor_id: i32) -> Result<i32> {
        let count = OrderItems::find()
            .filter(order_items::Column::VendorId.eq(vendor_id))
            .filter(order_items::Column::Status.is_in([
                OrderStatus::Shipped.as_str(),
                OrderStatus::Delivered.as_str(),
            ]))
            .count(self.db())
            .await
            .context("Failed to count vendor sales")?;

        let count = i32::try_from(count).unwrap_or(i32::MAX);
        Vendors::update_many()
            .col_expr(vendors::Column::TotalOrders, Expr::value(count))
            .filter(vendors::Column::Id.eq(vendor_id))
            .exec(self.db())
            .await
            .context("Failed to update sales count")?;

        Ok(count)
    }

    /// 公开：已通过审核的商户列表
    pub async fn list_public(
        &self,
        query: &VendorQuery,
    ) -> Result<ListVendorsResult<VendorPublicResponse>> {
        let params = PaginationParams::new(query.page, query.limit, 10, 100);

        let filtered = || {
            let mut select =
                Vendors::find().filter(vendors::Column::Status.eq(VendorStatus::Approved.as_str()));
            if let Some(featured) = query.featured {
                select = select.filter(vendors::Column::IsFeatured.eq(featured));
            }
            select
        };

        let total = filtered()
            .count(self.db())
            .await
            .context("Failed to count vendors")?;
        let items = filtered()
            .order_by_desc(vendors::Column::IsFeatured)
            .order_by_asc(vendors::Column::StoreName)
            .offset(params.offset())
            .limit(params.limit)
            .all(self.db())
            .await
            .context("Failed to fetch vendors")?;

        Ok(ListVendorsResult {
            vendors: items.into_iter().map(VendorPublicResponse::from).collect(),
            pagination: build_page(total, params),
        })
    }

    /// 公开：获取已通过审核的商户
    pub async fn get_public(&self, vendor_id: i32) -> Result<VendorPublicResponse> {
        let vendor = Vendors::find_by_id(vendor_id)
            .filter(vendors::Column::Status.eq(VendorStatus::Approved.as_str()))
            .one(self.db())
            .await
            .context("Failed to fetch vendor")?
            .ok_or_else(|| MarketError::not_found("Vendor", vendor_id.to_string()))?;
        Ok(vendor.into())
    }

    /// 管理员：商户列表
    pub async fn list_admin(
        &self,
        auth: &AuthContext,
        query: &AdminVendorQuery,
    ) -> Result<ListVendorsResult<VendorResponse>> {
        ensure_admin(auth)?;

        let params = PaginationParams::new(query.page, query.limit, 10, 100);
        let filtered = || Self::admin_filtered(query);

        let total = filtered()
            .count(self.db())
            .await
            .context("Failed to count vendors")?;
        let items = filtered()
            .order_by_desc(vendors::Column::CreatedAt)
            .offset(params.offset())
            .limit(params.limit)
            .all(self.db())
            .await
            .context("Failed to fetch vendors")?;

        Ok(ListVendorsResult {
            vendors: items.into_iter().map(VendorResponse::from).collect(),
            pagination: build_page(total, params),
        })
    }

    /// 管理员：获取任意商户
    pub async fn get_admin(&self, auth: &AuthContext, vendor_id: i32) -> Result<VendorResponse> {
        ensure_admin(auth)?;
        let vendor = self.fetch_vendor(vendor_id).await?;
        Ok(vendor.into())
    }

    fn admin_filtered(query: &AdminVendorQuery) -> Select<Vendors> {
        let mut select = Vendors::find();
        if let Some(status) = query
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            select = select.filter(vendors::Column::Status.eq(status));
        }
        select
    }

    pub(crate) async fn fetch_vendor(&self, vendor_id: i32) -> Result<vendors::Model> {
        Vendors::find_by_id(vendor_id)
            .one(self.db())
            .await
            .context("Failed to fetch vendor")?
            .ok_or_else(|| MarketError::not_found("Vendor", vendor_id.to_string()))
    }

    pub(crate) async fn find_by_user(&self, user_id: i32) -> Result<Option<vendors::Model>> {
        Vendors::find()
            .filter(vendors::Column::UserId.eq(user_id))
            .one(self.db())
            .await
            .context("Failed to fetch vendor by user")
    }

    /// 调用方本人的商户档案，不存在时报 NotFound
    pub(crate) async fn fetch_own_vendor(&self, auth: &AuthContext) -> Result<vendors::Model> {
        self.find_by_user(auth.user_id)
            .await?
            .ok_or_else(|| MarketError::not_found("Vendor", auth.user_id.to_string()))
    }

    /// 店铺名大小写不敏感唯一
    async fn ensure_unique_store_name(&self, exclude_id: Option<i32>, name: &str) -> Result<()> {
        let lowered = name.trim().to_lowercase();
        let mut query = Vendors::find().filter(
            Expr::expr(Func::lower(Expr::col(vendors::Column::StoreName))).eq(lowered),
        );
        if let Some(id) = exclude_id {
            query = query.filter(vendors::Column::Id.ne(id));
        }

        if query
            .one(self.db())
            .await
            .context("Failed to check store name")?
            .is_some()
        {
            return Err(MarketError::conflict("Vendor", name.trim()));
        }
        Ok(())
    }
}

fn ensure_admin(auth: &AuthContext) -> Result<()> {
    if auth.is_admin() {
        Ok(())
    } else {
        Err(MarketError::permission("权限不足"))
    }
}

fn validate_store_name(name: &str) -> Result<()> {
    super::shared::validate_name_format(name)
}

fn validate_business_email(email: &str) -> Result<()> {
    if email.len() <= 255 && email.contains('@') {
        Ok(())
    } else {
        Err(MarketError::validation_field("邮箱格式无效", "business_email"))
    }
}
