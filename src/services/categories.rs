//! # 分类服务
//!
//! 公开分类树查询与管理员分类维护。

use chrono::Utc;
use entity::{
    categories, categories::Entity as Categories, products, products::Entity as Products,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::AuthContext,
    error::{Context, MarketError, Result},
};

use super::shared::{ServiceResponse, slugify, validate_name_format};

/// 分类创建请求
#[derive(Debug, Deserialize)]
pub struct CategoryCreateRequest {
    pub name: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    pub parent_id: Option<i32>,
    #[serde(default)]
    pub sort_order: i32,
    pub is_active: Option<bool>,
}

/// 分类更新请求
#[derive(Debug, Default, Deserialize)]
pub struct CategoryUpdateRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub parent_id: Option<Option<i32>>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// 分类响应，包含一级子分类
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub icon: String,
    pub parent_id: Option<i32>,
    pub sort_order: i32,
    pub is_active: bool,
    pub product_count: u64,
    pub subcategories: Vec<CategoryResponse>,
}

impl CategoryResponse {
    fn from_model(category: categories::Model, product_count: u64) -> Self {
        Self {
            id: category.id,
            name: category.name,
            slug: category.slug,
            description: category.description,
            icon: category.icon,
            parent_id: category.parent_id,
            sort_order: category.sort_order,
            is_active: category.is_active,
            product_count,
            subcategories: Vec::new(),
        }
    }
}

/// 分类服务
pub struct CategoriesService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> CategoriesService<'a> {
    #[must_use]
    pub const fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    const fn db(&self) -> &'a DatabaseConnection {
        self.db
    }

    /// 公开：活跃根分类及其一级子分类
    pub async fn list_tree(&self) -> Result<Vec<CategoryResponse>> {
        let roots = Categories::find()
            .filter(categories::Column::IsActive.eq(true))
            .filter(categories::Column::ParentId.is_null())
            .order_by_asc(categories::Column::SortOrder)
            .order_by_asc(categories::Column::Name)
            .all(self.db())
            .await
            .context("Failed to fetch root categories")?;

        let mut tree = Vec::with_capacity(roots.len());
        for root in roots {
            let children = Categories::find()
                .filter(categories::Column::IsActive.eq(true))
                .filter(categories::Column::ParentId.eq(root.id))
                .order_by_asc(categories::Column::SortOrder)
                .order_by_asc(categories::Column::Name)
                .all(self.db())
                .await
                .context("Failed to fetch subcategories")?;

            let mut node =
                CategoryResponse::from_model(root.clone(), self.product_count(root.id).await?);
            for child in children {
                let count = self.product_count(child.id).await?;
                node.subcategories
                    .push(CategoryResponse::from_model(child, count));
            }
            tree.push(node);
        }

        Ok(tree)
    }

    /// 公开：按 slug 获取活跃分类
    pub async fn get_by_slug(&self, slug: &str) -> Result<CategoryResponse> {
        let category = Categories::find()
            .filter(categories::Column::Slug.eq(slug))
            .filter(categories::Column::IsActive.eq(true))
            .one(self.db())
            .await
            .context("Failed to fetch category")?
            .ok_or_else(|| MarketError::not_found("Category", slug))?;

        let count = self.product_count(category.id).await?;
        let children = Categories::find()
            .filter(categories::Column::IsActive.eq(true))
            .filter(categories::Column::ParentId.eq(category.id))
            .order_by_asc(categories::Column::SortOrder)
            .all(self.db())
            .await
            .context("Failed to fetch subcategories")?;

        let mut node = CategoryResponse::from_model(category, count);
        for child in children {
            let count = self.product_count(child.id).await?;
            node.subcategories
                .push(CategoryResponse::from_model(child, count));
        }
        Ok(node)
    }

    /// 分类及其直接子分类的ID集合（只下钻一层）
    pub async fn category_and_children_ids(&self, category_id: i32) -> Result<Vec<i32>> {
        let mut ids = vec![category_id];
        let children = Categories::find()
            .filter(categories::Column::ParentId.eq(category_id))
            .all(self.db())
            .await
            .context("Failed to fetch subcategories")?;
        ids.extend(children.into_iter().map(|c| c.id));
        Ok(ids)
    }

    /// 管理员：创建分类
    pub async fn create(
        &self,
        auth: &AuthContext,
        request: &CategoryCreateRequest,
    ) -> Result<ServiceResponse<CategoryResponse>> {
        ensure_admin(auth)?;
        validate_name_format(&request.name)?;

        let slug = match &request.slug {
            Some(slug) if !slug.trim().is_empty() => slug.trim().to_string(),
            _ => slugify(&request.name),
        };
        self.ensure_unique_slug(None, &slug).await?;

        if let Some(parent_id) = request.parent_id {
            self.fetch_category(parent_id).await?;
        }

        let now = Utc::now().naive_utc();
        let model = categories::ActiveModel {
            name: Set(request.name.trim().to_string()),
            slug: Set(slug),
            description: Set(request.description.clone()),
            icon: Set(request.icon.clone()),
            parent_id: Set(request.parent_id),
            sort_order: Set(request.sort_order),
            is_active: Set(request.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let insert_result = Categories::insert(model)
            .exec(self.db())
            .await
            .context("Failed to create category")?;

        let created = self.fetch_category(insert_result.last_insert_id).await?;
        Ok(ServiceResponse::with_message(
            CategoryResponse::from_model(created, 0),
            "分类创建成功",
        ))
    }

    /// 管理员：更新分类
    pub async fn update(
        &self,
        auth: &AuthContext,
        category_id: i32,
        request: &CategoryUpdateRequest,
    ) -> Result<ServiceResponse<CategoryResponse>> {
        ensure_admin(auth)?;

        let category = self.fetch_category(category_id).await?;

        if let Some(name) = &request.name {
            validate_name_format(name)?;
        }
        if let Some(slug) = &request.slug {
            self.ensure_unique_slug(Some(category_id), slug.trim()).await?;
        }
        if let Some(Some(parent_id)) = request.parent_id {
            if parent_id == category_id {
                return Err(MarketError::validation_field(
                    "分类不能作为自己的父分类",
                    "parent_id",
                ));
            }
            self.fetch_category(parent_id).await?;
        }

        let mut active_model: categories::ActiveModel = category.into();
        if let Some(name) = &request.name {
            active_model.name = Set(name.trim().to_string());
        }
        if let Some(slug) = &request.slug {
            active_model.slug = Set(slug.trim().to_string());
        }
        if let Some(description) = &request.description {
            active_model.description = Set(description.clone());
        }
        if let Some(icon) = &request.icon {
            active_model.icon = Set(icon.clone());
        }
        if let Some(parent_id) = request.parent_id {
            active_model.parent_id = Set(parent_id);
        }
        if let Some(sort_order) = request.sort_order {
            active_model.sort_order = Set(sort_order);
        }
        if let Some(is_active) = request.is_active {
            active_model.is_active = Set(is_active);
        }
        active_model.updated_at = Set(Utc::now().naive_utc());

        let updated = active_model
            .update(self.db())
            .await
            .context("Failed to update category")?;

        let count = self.product_count(updated.id).await?;
        Ok(ServiceResponse::with_message(
            CategoryResponse::from_model(updated, count),
            "分类更新成功",
        ))
    }

    /// 管理员：删除分类（商品的 category_id 置空由外键处理）
    pub async fn delete(
        &self,
        auth: &AuthContext,
        category_id: i32,
    ) -> Result<ServiceResponse<()>> {
        ensure_admin(auth)?;
        self.fetch_category(category_id).await?;

        Categories::delete_by_id(category_id)
            .exec(self.db())
            .await
            .context("Failed to delete category")?;

        Ok(ServiceResponse::with_message((), "分类删除成功"))
    }

    async fn product_count(&self, category_id: i32) -> Result<u64> {
        Products::find()
            .filter(products::Column::CategoryId.eq(category_id))
            .filter(products::Column::IsActive.eq(true))
            .count(self.db())
            .await
            .context("Failed to count category products")
    }

    pub(crate) async fn fetch_category(&self, category_id: i32) -> Result<categories::Model> {
        Categories::find_by_id(category_id)
            .one(self.db())
            .await
            .context("Failed to fetch category")?
            .ok_or_else(|| MarketError::not_found("Category", category_id.to_string()))
    }

    async fn ensure_unique_slug(&self, exclude_id: Option<i32>, slug: &str) -> Result<()> {
        let mut query = Categories::find().filter(categories::Column::Slug.eq(slug));
        if let Some(id) = exclude_id {
            query = query.filter(categories::Column::Id.ne(id));
        }
        if query
            .one(self.db())
            .await
            .context("Failed to check category slug")?
            .is_some()
        {
            return Err(MarketError::conflict("Category", slug));
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
