//! # 商品服务
//!
//! 公开商品检索、商户商品维护与商品图片管理。
//! 公开可见性规则：商品启用且所属商户已通过审核。

use chrono::Utc;
use entity::{
    product_images, product_images::Entity as ProductImages, products,
    products::Entity as Products, vendors,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::AuthContext,
    error::{Context, MarketError, Result},
    types::VendorStatus,
};

use super::{
    categories::CategoriesService,
    shared::{PaginationInfo, PaginationParams, ServiceResponse, build_page, slugify},
    vendors::VendorsService,
};

/// 自动派生 slug 的后缀尝试上限
const SLUG_SUFFIX_LIMIT: u32 = 50;

/// 公开商品列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// 分类 slug，含该分类及其直接子分类
    pub category: Option<String>,
    /// 名称/描述关键字
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub in_stock: Option<bool>,
    pub featured: Option<bool>,
    pub vendor_id: Option<i32>,
    /// price_asc | price_desc | popular | newest（默认）
    pub sort: Option<String>,
}

/// 商户商品列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct VendorProductQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub is_active: Option<bool>,
}

/// 商品创建请求
#[derive(Debug, Deserialize)]
pub struct ProductCreateRequest {
    pub name: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: String,
    pub price: Decimal,
    pub compare_price: Option<Decimal>,
    pub stock: i32,
    #[serde(default)]
    pub sku: String,
    pub category_id: Option<i32>,
    pub is_active: Option<bool>,
}

/// 商品更新请求
#[derive(Debug, Default, Deserialize)]
pub struct ProductUpdateRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub price: Option<Decimal>,
    pub compare_price: Option<Option<Decimal>>,
    pub stock: Option<i32>,
    pub sku: Option<String>,
    pub category_id: Option<Option<i32>>,
    pub is_active: Option<bool>,
}

/// 商品图片请求
#[derive(Debug, Deserialize)]
pub struct ProductImageRequest {
    pub image_url: String,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub sort_order: i32,
}

/// 商品响应
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: i32,
    pub vendor_id: i32,
    pub category_id: Option<i32>,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub short_description: String,
    pub price: Decimal,
    pub compare_price: Option<Decimal>,
    pub discount_percentage: i32,
    pub stock: i32,
    pub in_stock: bool,
    pub sku: String,
    pub is_active: bool,
    pub is_featured: bool,
    pub view_count: i32,
    pub sales_count: i32,
    pub created_at: String,
}

impl From<products::Model> for ProductResponse {
    fn from(product: products::Model) -> Self {
        let discount_percentage = product.discount_percentage();
        let in_stock = product.is_in_stock();
        Self {
            id: product.id,
            vendor_id: product.vendor_id,
            category_id: product.category_id,
            name: product.name,
            slug: product.slug,
            description: product.description,
            short_description: product.short_description,
            price: product.price,
            compare_price: product.compare_price,
            discount_percentage,
            stock: product.stock,
            in_stock,
            sku: product.sku,
            is_active: product.is_active,
            is_featured: product.is_featured,
            view_count: product.view_count,
            sales_count: product.sales_count,
            created_at: product.created_at.and_utc().to_rfc3339(),
        }
    }
}

/// 商品详情响应，附带图片
#[derive(Debug, Serialize)]
pub struct ProductDetailResponse {
    #[serde(flatten)]
    pub product: ProductResponse,
    pub images: Vec<ProductImageResponse>,
}

/// 商品图片响应
#[derive(Debug, Serialize)]
pub struct ProductImageResponse {
    pub id: i32,
    pub image_url: String,
    pub alt_text: String,
    pub is_primary: bool,
    pub sort_order: i32,
}

impl From<product_images::Model> for ProductImageResponse {
    fn from(image: product_images::Model) -> Self {
        Self {
            id: image.id,
            image_url: image.image_url,
            alt_text: image.alt_text,
            is_primary: image.is_primary,
            sort_order: image.sort_order,
        }
    }
}

#[derive(Debug)]
pub struct ListProductsResult {
    pub products: Vec<ProductResponse>,
    pub pagination: PaginationInfo,
}

/// 商品服务
pub struct ProductsService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ProductsService<'a> {
    #[must_use]
    pub const fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    const fn db(&self) -> &'a DatabaseConnection {
        self.db
    }

    /// 公开：商品列表
    pub async fn list_public(&self, query: &ProductQuery) -> Result<ListProductsResult> {
        let params = PaginationParams::new(query.page, query.limit, 12, 100);

        // 分类筛选只下钻一层
        let category_ids = match query.category.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => {
                let categories = CategoriesService::new(self.db());
                let category = categories.get_by_slug(slug).await?;
                Some(categories.category_and_children_ids(category.id).await?)
            }
            _ => None,
        };

        let filtered = || {
            let mut select = visible_products();
            if let Some(ids) = &category_ids {
                select = select.filter(products::Column::CategoryId.is_in(ids.clone()));
            }
            if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
            {
                select = select.filter(
                    products::Column::Name
                        .contains(search)
                        .or(products::Column::Description.contains(search)),
                );
            }
            if let Some(min) = query.min_price {
                select = select.filter(products::Column::Price.gte(min));
            }
            if let Some(max) = query.max_price {
                select = select.filter(products::Column::Price.lte(max));
            }
            if query.in_stock == Some(true) {
                select = select.filter(products::Column::Stock.gt(0));
            }
            if let Some(featured) = query.featured {
                select = select.filter(products::Column::IsFeatured.eq(featured));
            }
            if let Some(vendor_id) = query.vendor_id {
                select = select.filter(products::Column::VendorId.eq(vendor_id));
            }
            select
        };

        let total = filtered()
            .count(self.db())
            .await
            .context("Failed to count products")?;

        let select = match query.sort.as_deref() {
            Some("price_asc") => filtered().order_by_asc(products::Column::Price),
            Some("price_desc") => filtered().order_by_desc(products::Column::Price),
            Some("popular") => filtered().order_by_desc(products::Column::SalesCount),
            _ => filtered().order_by_desc(products::Column::CreatedAt),
        };

        let items = select
            .offset(params.offset())
            .limit(params.limit)
            .all(self.db())
            .await
            .context("Failed to fetch products")?;

        Ok(ListProductsResult {
            products: items.into_iter().map(ProductResponse::from).collect(),
            pagination: build_page(total, params),
        })
    }

    /// 公开：精选商品
    pub async fn list_featured(&self, limit: Option<u64>) -> Result<Vec<ProductResponse>> {
        let limit = limit.unwrap_or(8).clamp(1, 50);
        let items = visible_products()
            .filter(products::Column::IsFeatured.eq(true))
            .order_by_desc(products::Column::CreatedAt)
            .limit(limit)
            .all(self.db())
            .await
            .context("Failed to fetch featured products")?;
        Ok(items.into_iter().map(ProductResponse::from).collect())
    }

    /// 公开：按 slug 获取商品详情，同时累加浏览计数
    pub async fn get_by_slug(&self, slug: &str) -> Result<ProductDetailResponse> {
        let product = visible_products()
            .filter(products::Column::Slug.eq(slug))
            .one(self.db())
            .await
            .context("Failed to fetch product")?
            .ok_or_else(|| MarketError::not_found("Product", slug))?;

        Products::update_many()
            .col_expr(
                products::Column::ViewCount,
                Expr::col(products::Column::ViewCount).add(1),
            )
            .filter(products::Column::Id.eq(product.id))
            .exec(self.db())
            .await
            .context("Failed to update view count")?;

        let images = self.list_images(product.id).await?;
        let mut response = ProductResponse::from(product);
        response.view_count += 1;
        Ok(ProductDetailResponse {
            product: response,
            images,
        })
    }

    /// 公开：按 ID 获取商品，不计浏览
    pub async fn get_public(&self, product_id: i32) -> Result<ProductDetailResponse> {
        let product = visible_products()
            .filter(products::Column::Id.eq(product_id))
            .one(self.db())
            .await
            .context("Failed to fetch product")?
            .ok_or_else(|| MarketError::not_found("Product", product_id.to_string()))?;

        let images = self.list_images(product.id).await?;
        Ok(ProductDetailResponse {
            product: product.into(),
            images,
        })
    }

    /// 商户：创建商品，slug 缺省时由名称派生并自动去重
    pub async fn create(
        &self,
        auth: &AuthContext,
        request: &ProductCreateRequest,
    ) -> Result<ServiceResponse<ProductResponse>> {
        let vendor = self.fetch_approved_vendor(auth).await?;
        validate_product_fields(&request.name, request.price, request.stock)?;

        if let Some(category_id) = request.category_id {
            CategoriesService::new(self.db())
                .fetch_category(category_id)
                .await?;
        }

        let slug = match request.slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => {
                // 显式指定的 slug 冲突直接报错，不加后缀
                self.ensure_unique_slug(vendor.id, None, slug).await?;
                slug.to_string()
            }
            _ => self.derive_slug(vendor.id, &request.name).await?,
        };

        let now = Utc::now().naive_utc();
        let model = products::ActiveModel {
            vendor_id: Set(vendor.id),
            category_id: Set(request.category_id),
            name: Set(request.name.trim().to_string()),
            slug: Set(slug),
            description: Set(request.description.clone()),
            short_description: Set(request.short_description.clone()),
            price: Set(request.price),
            compare_price: Set(request.compare_price),
            stock: Set(request.stock),
            sku: Set(request.sku.clone()),
            is_active: Set(request.is_active.unwrap_or(true)),
            is_featured: Set(false),
            view_count: Set(0),
            sales_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let insert_result = Products::insert(model)
            .exec(self.db())
            .await
            .context("Failed to create product")?;

        VendorsService::new(self.db())
            .recompute_product_count(vendor.id)
            .await?;

        let created = self.fetch_product(insert_result.last_insert_id).await?;
        Ok(ServiceResponse::with_message(created.into(), "商品创建成功"))
    }

    /// 商户：自己的商品列表（含未启用）
    pub async fn list_own(
        &self,
        auth: &AuthContext,
        query: &VendorProductQuery,
    ) -> Result<ListProductsResult> {
        let vendor = VendorsService::new(self.db()).fetch_own_vendor(auth).await?;
        let params = PaginationParams::new(query.page, query.limit, 12, 100);

        let filtered = || {
            let mut select =
                Products::find().filter(products::Column::VendorId.eq(vendor.id));
            if let Some(is_active) = query.is_active {
                select = select.filter(products::Column::IsActive.eq(is_active));
            }
            select
        };

        let total = filtered()
            .count(self.db())
            .await
            .context("Failed to count products")?;
        let items = filtered()
            .order_by_desc(products::Column::CreatedAt)
            .offset(params.offset())
            .limit(params.limit)
            .all(self.db())
            .await
            .context("Failed to fetch products")?;

        Ok(ListProductsResult {
            products: items.into_iter().map(ProductResponse::from).collect(),
            pagination: build_page(total, params),
        })
    }

    /// 商户：获取自己的商品详情
    pub async fn get_own(
        &self,
        auth: &AuthContext,
        product_id: i32,
    ) -> Result<ProductDetailResponse> {
        let product = self.fetch_owned(auth, product_id).await?;
        let images = self.list_images(product.id).await?;
        Ok(ProductDetailResponse {
            product: product.into(),
            images,
        })
    }

    /// 商户：更新商品
    pub async fn update(
        &self,
        auth: &AuthContext,
        product_id: i32,
        request: &ProductUpdateRequest,
    ) -> Result<ServiceResponse<ProductResponse>> {
        let product = self.fetch_owned(auth, product_id).await?;
        let vendor_id = product.vendor_id;

        if let Some(name) = &request.name {
            super::shared::validate_name_format(name)?;
        }
        if let Some(price) = request.price {
            crate::ensure_validation!(price > Decimal::ZERO, "价格必须大于 0");
        }
        if let Some(stock) = request.stock {
            crate::ensure_validation!(stock >= 0, "库存不能为负数");
        }
        if let Some(slug) = request.slug.as_deref().map(str::trim) {
            if slug != product.slug {
                self.ensure_unique_slug(vendor_id, Some(product.id), slug)
                    .await?;
            }
        }
        if let Some(Some(category_id)) = request.category_id {
            CategoriesService::new(self.db())
                .fetch_category(category_id)
                .await?;
        }

        let mut active_model: products::ActiveModel = product.into();
        if let Some(name) = &request.name {
            active_model.name = Set(name.trim().to_string());
        }
        if let Some(slug) = request.slug.as_deref().map(str::trim) {
            active_model.slug = Set(slug.to_string());
        }
        if let Some(description) = &request.description {
            active_model.description = Set(description.clone());
        }
        if let Some(short_description) = &request.short_description {
            active_model.short_description = Set(short_description.clone());
        }
        if let Some(price) = request.price {
            active_model.price = Set(price);
        }
        if let Some(compare_price) = request.compare_price {
            active_model.compare_price = Set(compare_price);
        }
        if let Some(stock) = request.stock {
            active_model.stock = Set(stock);
        }
        if let Some(sku) = &request.sku {
            active_model.sku = Set(sku.clone());
        }
        if let Some(category_id) = request.category_id {
            active_model.category_id = Set(category_id);
        }
        if let Some(is_active) = request.is_active {
            active_model.is_active = Set(is_active);
        }
        active_model.updated_at = Set(Utc::now().naive_utc());

        let updated = active_model
            .update(self.db())
            .await
            .context("Failed to update product")?;

        // 启用状态可能变化，刷新商户冗余计数
        VendorsService::new(self.db())
            .recompute_product_count(vendor_id)
            .await?;

        Ok(ServiceResponse::with_message(updated.into(), "商品更新成功"))
    }

    /// 商户：删除商品
    pub async fn delete(
        &self,
        auth: &AuthContext,
        product_id: i32,
    ) -> Result<ServiceResponse<()>> {
        let product = self.fetch_owned(auth, product_id).await?;
        let vendor_id = product.vendor_id;

        Products::delete_by_id(product.id)
            .exec(self.db())
            .await
            .context("Failed to delete product")?;

        VendorsService::new(self.db())
            .recompute_product_count(vendor_id)
            .await?;

        Ok(ServiceResponse::with_message((), "商品删除成功"))
    }

    /// 商户：添加商品图片，设为主图时清除旧主图
    pub async fn add_image(
        &self,
        auth: &AuthContext,
        product_id: i32,
        request: &ProductImageRequest,
    ) -> Result<ServiceResponse<ProductImageResponse>> {
        let product = self.fetch_owned(auth, product_id).await?;
        crate::ensure_validation!(!request.image_url.trim().is_empty(), "图片地址不能为空");

        if request.is_primary {
            ProductImages::update_many()
                .col_expr(product_images::Column::IsPrimary, Expr::value(false))
                .filter(product_images::Column::ProductId.eq(product.id))
                .filter(product_images::Column::IsPrimary.eq(true))
                .exec(self.db())
                .await
                .context("Failed to clear primary image")?;
        }

        let model = product_images::ActiveModel {
            product_id: Set(product.id),
            image_url: Set(request.image_url.trim().to_string()),
            alt_text: Set(request.alt_text.clone()),
            is_primary: Set(request.is_primary),
            sort_order: Set(request.sort_order),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        };

        let insert_result = ProductImages::insert(model)
            .exec(self.db())
            .await
            .context("Failed to create product image")?;

        let created = ProductImages::find_by_id(insert_result.last_insert_id)
            .one(self.db())
            .await
            .context("Failed to fetch product image")?
            .ok_or_else(|| {
                MarketError::not_found("ProductImage", insert_result.last_insert_id.to_string())
            })?;

        Ok(ServiceResponse::with_message(created.into(), "图片添加成功"))
    }

    /// 商户：删除商品图片
    pub async fn delete_image(
        &self,
        auth: &AuthContext,
        product_id: i32,
        image_id: i32,
    ) -> Result<ServiceResponse<()>> {
        let product = self.fetch_owned(auth, product_id).await?;

        let image = ProductImages::find_by_id(image_id)
            .filter(product_images::Column::ProductId.eq(product.id))
            .one(self.db())
            .await
            .context("Failed to fetch product image")?
            .ok_or_else(|| MarketError::not_found("ProductImage", image_id.to_string()))?;

        ProductImages::delete_by_id(image.id)
            .exec(self.db())
            .await
            .context("Failed to delete product image")?;

        Ok(ServiceResponse::with_message((), "图片删除成功"))
    }

    pub(crate) async fn list_images(&self, product_id: i32) -> Result<Vec<ProductImageResponse>> {
        let images = ProductImages::find()
            .filter(product_images::Column::ProductId.eq(product_id))
            .order_by_desc(product_images::Column::IsPrimary)
            .order_by_asc(product_images::Column::SortOrder)
            .all(self.db())
            .await
            .context("Failed to fetch product images")?;
        Ok(images.into_iter().map(ProductImageResponse::from).collect())
    }

    pub(crate) async fn fetch_product(&self, product_id: i32) -> Result<products::Model> {
        Products::find_by_id(product_id)
            .one(self.db())
            .await
            .context("Failed to fetch product")?
            .ok_or_else(|| MarketError::not_found("Product", product_id.to_string()))
    }

    /// 归属校验失败与不存在同样报 NotFound
    async fn fetch_owned(&self, auth: &AuthContext, product_id: i32) -> Result<products::Model> {
        let vendor = VendorsService::new(self.db()).fetch_own_vendor(auth).await?;
        Products::find_by_id(product_id)
            .filter(products::Column::VendorId.eq(vendor.id))
            .one(self.db())
            .await
            .context("Failed to fetch product")?
            .ok_or_else(|| MarketError::not_found("Product", product_id.to_string()))
    }

    async fn fetch_approved_vendor(&self, auth: &AuthContext) -> Result<vendors::Model> {
        let vendor = VendorsService::new(self.db()).fetch_own_vendor(auth).await?;
        if vendor.status != VendorStatus::Approved.as_str() {
            return Err(MarketError::permission("商户未通过审核，无法管理商品"));
        }
        Ok(vendor)
    }

    /// 由名称派生商户内唯一 slug，冲突时追加 -2、-3 …
    async fn derive_slug(&self, vendor_id: i32, name: &str) -> Result<String> {
        let base = slugify(name);
        if !self.slug_taken(vendor_id, &base).await? {
            return Ok(base);
        }
        for suffix in 2..=SLUG_SUFFIX_LIMIT {
            let candidate = format!("{base}-{suffix}");
            if !self.slug_taken(vendor_id, &candidate).await? {
                return Ok(candidate);
            }
        }
        Err(MarketError::conflict("Product", base))
    }

    async fn slug_taken(&self, vendor_id: i32, slug: &str) -> Result<bool> {
        Ok(Products::find()
            .filter(products::Column::VendorId.eq(vendor_id))
            .filter(products::Column::Slug.eq(slug))
            .one(self.db())
            .await
            .context("Failed to check product slug")?
            .is_some())
    }

    async fn ensure_unique_slug(
        &self,
        vendor_id: i32,
        exclude_id: Option<i32>,
        slug: &str,
    ) -> Result<()> {
        let mut query = Products::find()
            .filter(products::Column::VendorId.eq(vendor_id))
            .filter(products::Column::Slug.eq(slug));
        if let Some(id) = exclude_id {
            query = query.filter(products::Column::Id.ne(id));
        }
        if query
            .one(self.db())
            .await
            .context("Failed to check product slug")?
            .is_some()
        {
            return Err(MarketError::conflict("Product", slug));
        }
        Ok(())
    }
}

/// 公开可见商品：启用且商户已通过审核
pub(crate) fn visible_products() -> Select<Products> {
    Products::find()
        .filter(products::Column::IsActive.eq(true))
        .join(JoinType::InnerJoin, products::Relation::Vendors.def())
        .filter(vendors::Column::Status.eq(VendorStatus::Approved.as_str()))
}

fn validate_product_fields(name: &str, price: Decimal, stock: i32) -> Result<()> {
    super::shared::validate_name_format(name)?;
    crate::ensure_validation!(price > Decimal::ZERO, "价格必须大于 0");
    crate::ensure_validation!(stock >= 0, "库存不能为负数");
    Ok(())
}
