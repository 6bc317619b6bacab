//! # 地址服务
//!
//! 用户收货/账单地址管理，同一 (用户, 类型) 最多一个默认地址。

use chrono::Utc;
use entity::{addresses, addresses::Entity as Addresses};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::AuthContext,
    error::{Context, MarketError, Result},
    types::AddressType,
};

use super::shared::ServiceResponse;

/// 地址创建/更新请求
#[derive(Debug, Deserialize)]
pub struct AddressRequest {
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub address_type: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// 地址响应
#[derive(Debug, Serialize)]
pub struct AddressResponse {
    pub id: i32,
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub address_type: String,
    pub is_default: bool,
    pub full_address: String,
    pub created_at: String,
}

impl From<addresses::Model> for AddressResponse {
    fn from(address: addresses::Model) -> Self {
        let full_address = address.full_address();
        Self {
            id: address.id,
            full_name: address.full_name,
            phone: address.phone,
            address_line1: address.address_line1,
            address_line2: address.address_line2,
            city: address.city,
            state: address.state,
            postal_code: address.postal_code,
            country: address.country,
            address_type: address.address_type,
            is_default: address.is_default,
            full_address,
            created_at: address.created_at.and_utc().to_rfc3339(),
        }
    }
}

/// 地址服务
pub struct AddressesService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> AddressesService<'a> {
    #[must_use]
    pub const fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    const fn db(&self) -> &'a DatabaseConnection {
        self.db
    }

    /// 列出当前用户的地址
    pub async fn list(&self, auth: &AuthContext) -> Result<Vec<AddressResponse>> {
        let items = Addresses::find()
            .filter(addresses::Column::UserId.eq(auth.user_id))
            .order_by_desc(addresses::Column::IsDefault)
            .order_by_desc(addresses::Column::CreatedAt)
            .all(self.db())
            .await
            .context("Failed to fetch addresses")?;

        Ok(items.into_iter().map(AddressResponse::from).collect())
    }

    /// 创建地址
    pub async fn create(
        &self,
        auth: &AuthContext,
        request: &AddressRequest,
    ) -> Result<ServiceResponse<AddressResponse>> {
        let address_type = parse_address_type(request.address_type.as_deref())?;
        validate_address(request)?;

        if request.is_default {
            self.clear_default(auth.user_id, address_type).await?;
        }

        let now = Utc::now().naive_utc();
        let model = addresses::ActiveModel {
            user_id: Set(Some(auth.user_id)),
            full_name: Set(request.full_name.trim().to_string()),
            phone: Set(request.phone.clone()),
            address_line1: Set(request.address_line1.clone()),
            address_line2: Set(request.address_line2.clone()),
            city: Set(request.city.clone()),
            state: Set(request.state.clone()),
            postal_code: Set(request.postal_code.clone()),
            country: Set(request.country.clone()),
            address_type: Set(address_type.as_str().to_string()),
            is_default: Set(request.is_default),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let insert_result = Addresses::insert(model)
            .exec(self.db())
            .await
            .context("Failed to create address")?;

        let created = self
            .fetch_owned(auth, insert_result.last_insert_id)
            .await?;
        Ok(ServiceResponse::with_message(created.into(), "地址创建成功"))
    }

    /// 获取单个地址
    pub async fn get(&self, auth: &AuthContext, address_id: i32) -> Result<AddressResponse> {
        let address = self.fetch_owned(auth, address_id).await?;
        Ok(address.into())
    }

    /// 更新地址
    pub async fn update(
        &self,
        auth: &AuthContext,
        address_id: i32,
        request: &AddressRequest,
    ) -> Result<ServiceResponse<AddressResponse>> {
        let address_type = parse_address_type(request.address_type.as_deref())?;
        validate_address(request)?;

        let address = self.fetch_owned(auth, address_id).await?;

        if request.is_default {
            self.clear_default(auth.user_id, address_type).await?;
        }

        let mut active_model: addresses::ActiveModel = address.into();
        active_model.full_name = Set(request.full_name.trim().to_string());
        active_model.phone = Set(request.phone.clone());
        active_model.address_line1 = Set(request.address_line1.clone());
        active_model.address_line2 = Set(request.address_line2.clone());
        active_model.city = Set(request.city.clone());
        active_model.state = Set(request.state.clone());
        active_model.postal_code = Set(request.postal_code.clone());
        active_model.country = Set(request.country.clone());
        active_model.address_type = Set(address_type.as_str().to_string());
        active_model.is_default = Set(request.is_default);
        active_model.updated_at = Set(Utc::now().naive_utc());

        let updated = active_model
            .update(self.db())
            .await
            .context("Failed to update address")?;

        Ok(ServiceResponse::with_message(updated.into(), "地址更新成功"))
    }

    /// 删除地址
    pub async fn delete(&self, auth: &AuthContext, address_id: i32) -> Result<ServiceResponse<()>> {
        let address = self.fetch_owned(auth, address_id).await?;

        Addresses::delete_by_id(address.id)
            .exec(self.db())
            .await
            .context("Failed to delete address")?;

        Ok(ServiceResponse::with_message((), "地址删除成功"))
    }

    /// 归属校验失败与不存在同样报 NotFound，不泄露他人资源
    pub(crate) async fn fetch_owned(
        &self,
        auth: &AuthContext,
        address_id: i32,
    ) -> Result<addresses::Model> {
        Addresses::find_by_id(address_id)
            .filter(addresses::Column::UserId.eq(auth.user_id))
            .one(self.db())
            .await
            .context("Failed to fetch address")?
            .ok_or_else(|| MarketError::not_found("Address", address_id.to_string()))
    }

    async fn clear_default(&self, user_id: i32, address_type: AddressType) -> Result<()> {
        Addresses::update_many()
            .col_expr(addresses::Column::IsDefault, Expr::value(false))
            .filter(addresses::Column::UserId.eq(user_id))
            .filter(addresses::Column::AddressType.eq(address_type.as_str()))
            .filter(addresses::Column::IsDefault.eq(true))
            .exec(self.db())
            .await
            .context("Failed to clear default address")?;
        Ok(())
    }
}

fn parse_address_type(value: Option<&str>) -> Result<AddressType> {
    match value {
        None => Ok(AddressType::Shipping),
        Some(raw) => AddressType::parse(raw)
            .ok_or_else(|| MarketError::validation_field("无效的地址类型", "address_type")),
    }
}

fn validate_address(request: &AddressRequest) -> Result<()> {
    crate::ensure_validation!(!request.full_name.trim().is_empty(), "收件人不能为空");
    crate::ensure_validation!(
        !request.address_line1.trim().is_empty(),
        "地址第一行不能为空"
    );
    crate::ensure_validation!(!request.city.trim().is_empty(), "城市不能为空");
    crate::ensure_validation!(!request.postal_code.trim().is_empty(), "邮编不能为空");
    crate::ensure_validation!(!request.country.trim().is_empty(), "国家不能为空");
    Ok(())
}
