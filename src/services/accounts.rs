//! # 账户服务
//!
//! 注册、登录、个人资料与管理员用户管理。

use chrono::Utc;
use entity::{
    revoked_tokens, revoked_tokens::Entity as RevokedTokens, users, users::Entity as Users,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{AuthContext, JwtManager, TokenPair, UserRole},
    auth::password::{hash_password, verify_password},
    error::{Context, MarketError, Result},
};

use super::shared::{PaginationInfo, PaginationParams, ServiceResponse, build_page};

/// 注册请求
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub password2: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Option<String>,
}

/// 登录请求
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 更新个人资料请求
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// 修改密码请求
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub new_password2: String,
}

/// 管理员更新用户请求
#[derive(Debug, Default, Deserialize)]
pub struct AdminUpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

/// 用户列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// 用户响应
#[derive(Debug, Serialize, Clone)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub phone: String,
    pub role: String,
    pub is_active: bool,
    pub date_joined: String,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        let full_name = user.full_name();
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            full_name,
            phone: user.phone,
            role: user.role,
            is_active: user.is_active,
            date_joined: user.date_joined.and_utc().to_rfc3339(),
        }
    }
}

/// 认证响应（用户 + 令牌对）
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub tokens: TokenPair,
}

#[derive(Debug)]
pub struct ListUsersResult {
    pub users: Vec<UserResponse>,
    pub pagination: PaginationInfo,
}

/// 账户服务
pub struct AccountsService<'a> {
    db: &'a DatabaseConnection,
    jwt: &'a JwtManager,
}

impl<'a> AccountsService<'a> {
    #[must_use]
    pub const fn new(db: &'a DatabaseConnection, jwt: &'a JwtManager) -> Self {
        Self { db, jwt }
    }

    const fn db(&self) -> &'a DatabaseConnection {
        self.db
    }

    /// 注册新用户
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        let email = normalize_email(&request.email);
        validate_email(&email)?;
        ensure_password_strength(&request.password)?;
        if request.password != request.password2 {
            return Err(MarketError::validation_field(
                "Password fields didn't match.",
                "password",
            ));
        }

        // 只允许注册 customer / vendor，其余一律按 customer 处理
        let role = match request.role.as_deref().and_then(UserRole::parse) {
            Some(UserRole::Vendor) => UserRole::Vendor,
            _ => UserRole::Customer,
        };

        self.ensure_unique_email(None, &email).await?;

        let now = Utc::now().naive_utc();
        let user_model = users::ActiveModel {
            email: Set(email),
            first_name: Set(request.first_name.trim().to_string()),
            last_name: Set(request.last_name.trim().to_string()),
            phone: Set(request.phone.clone().unwrap_or_default()),
            role: Set(role.as_str().to_string()),
            is_active: Set(true),
            password_hash: Set(hash_password(&request.password)?),
            date_joined: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let insert_result = Users::insert(user_model)
            .exec(self.db())
            .await
            .context("Failed to create user")?;

        let user = self.fetch_user(insert_result.last_insert_id).await?;
        self.auth_response(user)
    }

    /// 登录
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        let email = normalize_email(&request.email);
        let user = Users::find()
            .filter(users::Column::Email.eq(&email))
            .one(self.db())
            .await
            .context("Failed to fetch user by email")?
            .ok_or_else(|| MarketError::auth("Invalid email or password"))?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(MarketError::auth("Invalid email or password"));
        }
        if !user.is_active {
            return Err(MarketError::auth("Account is disabled"));
        }

        self.auth_response(user)
    }

    /// 登出：吊销刷新令牌并写入黑名单
    ///
    /// 令牌解析失败时只返回通用认证错误，不向调用方泄露解析细节。
    /// 重复登出幂等。
    pub async fn logout(&self, refresh_token: &str) -> Result<ServiceResponse<()>> {
        let claims = self
            .jwt
            .revoke_token(refresh_token)
            .map_err(|_| MarketError::auth("Invalid token"))?;

        let now = Utc::now().naive_utc();
        if !self.is_token_revoked(&claims.jti).await? {
            let expires_at = chrono::DateTime::<Utc>::from_timestamp(claims.exp, 0)
                .map_or(now, |t| t.naive_utc());
            let model = revoked_tokens::ActiveModel {
                jti: Set(claims.jti),
                expires_at: Set(expires_at),
                revoked_at: Set(now),
                ..Default::default()
            };
            RevokedTokens::insert(model)
                .exec(self.db())
                .await
                .context("Failed to revoke token")?;
        }

        // 顺手清理已过期的黑名单条目
        RevokedTokens::delete_many()
            .filter(revoked_tokens::Column::ExpiresAt.lt(now))
            .exec(self.db())
            .await
            .context("Failed to prune revoked tokens")?;

        Ok(ServiceResponse::with_message((), "Logged out"))
    }

    /// 用刷新令牌换取新的访问令牌
    ///
    /// 已登出（黑名单内）的刷新令牌被拒绝。
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let claims = self.jwt.validate_token(refresh_token)?;
        if self.is_token_revoked(&claims.jti).await? {
            return Err(MarketError::auth("认证令牌已吊销"));
        }
        let user_id = claims
            .user_id()
            .map_err(|_| MarketError::auth("认证令牌格式无效"))?;
        let user = self.fetch_user(user_id).await?;
        if !user.is_active {
            return Err(MarketError::auth("Account is disabled"));
        }
        let role = parse_role(&user.role);
        self.jwt.generate_token_pair(user.id, user.email, role)
    }

    /// 当前用户资料
    pub async fn profile(&self, auth: &AuthContext) -> Result<UserResponse> {
        let user = self.fetch_user(auth.user_id).await?;
        Ok(user.into())
    }

    /// 更新当前用户资料
    pub async fn update_profile(
        &self,
        auth: &AuthContext,
        request: &UpdateProfileRequest,
    ) -> Result<ServiceResponse<UserResponse>> {
        let user = self.fetch_user(auth.user_id).await?;
        let mut active_model: users::ActiveModel = user.into();

        if let Some(first_name) = &request.first_name {
            active_model.first_name = Set(first_name.trim().to_string());
        }
        if let Some(last_name) = &request.last_name {
            active_model.last_name = Set(last_name.trim().to_string());
        }
        if let Some(phone) = &request.phone {
            active_model.phone = Set(phone.clone());
        }
        active_model.updated_at = Set(Utc::now().naive_utc());

        let updated = active_model
            .update(self.db())
            .await
            .context("Failed to update profile")?;

        Ok(ServiceResponse::with_message(
            updated.into(),
            "Profile updated successfully",
        ))
    }

    /// 修改密码
    pub async fn change_password(
        &self,
        auth: &AuthContext,
        request: &ChangePasswordRequest,
    ) -> Result<ServiceResponse<()>> {
        ensure_password_strength(&request.new_password)?;
        if request.new_password != request.new_password2 {
            return Err(MarketError::validation_field(
                "New password fields didn't match.",
                "new_password",
            ));
        }

        let user = self.fetch_user(auth.user_id).await?;
        if !verify_password(&request.old_password, &user.password_hash)? {
            return Err(MarketError::auth("Current password is incorrect"));
        }

        let mut active_model: users::ActiveModel = user.into();
        active_model.password_hash = Set(hash_password(&request.new_password)?);
        active_model.updated_at = Set(Utc::now().naive_utc());

        active_model
            .update(self.db())
            .await
            .context("Failed to change password")?;

        Ok(ServiceResponse::with_message((), "密码修改成功"))
    }

    /// 管理员：列出用户
    pub async fn list(&self, auth: &AuthContext, query: &UserQuery) -> Result<ListUsersResult> {
        ensure_admin(auth)?;

        let params = PaginationParams::new(query.page, query.limit, 10, 100);

        let total = Self::filtered_users(query)
            .count(self.db())
            .await
            .context("Failed to count users")?;

        let users = Self::filtered_users(query)
            .order_by_desc(users::Column::DateJoined)
            .offset(params.offset())
            .limit(params.limit)
            .all(self.db())
            .await
            .context("Failed to fetch users")?;

        Ok(ListUsersResult {
            users: users.into_iter().map(UserResponse::from).collect(),
            pagination: build_page(total, params),
        })
    }

    /// 管理员：获取单个用户
    pub async fn get(&self, auth: &AuthContext, user_id: i32) -> Result<UserResponse> {
        ensure_admin(auth)?;
        let user = self.fetch_user(user_id).await?;
        Ok(user.into())
    }

    /// 管理员：更新用户
    pub async fn update_user(
        &self,
        auth: &AuthContext,
        user_id: i32,
        request: &AdminUpdateUserRequest,
    ) -> Result<ServiceResponse<UserResponse>> {
        ensure_admin(auth)?;

        let user = self.fetch_user(user_id).await?;
        let mut active_model: users::ActiveModel = user.into();

        if let Some(first_name) = &request.first_name {
            active_model.first_name = Set(first_name.clone());
        }
        if let Some(last_name) = &request.last_name {
            active_model.last_name = Set(last_name.clone());
        }
        if let Some(phone) = &request.phone {
            active_model.phone = Set(phone.clone());
        }
        if let Some(is_active) = request.is_active {
            active_model.is_active = Set(is_active);
        }
        active_model.updated_at = Set(Utc::now().naive_utc());

        let updated = active_model
            .update(self.db())
            .await
            .context("Failed to update user")?;

        Ok(ServiceResponse::with_message(updated.into(), "用户更新成功"))
    }

    /// 管理员：停用用户
    pub async fn deactivate(
        &self,
        auth: &AuthContext,
        user_id: i32,
    ) -> Result<ServiceResponse<()>> {
        ensure_admin(auth)?;
        if auth.user_id == user_id {
            return Err(crate::business_error!("不能停用自己"));
        }

        let user = self.fetch_user(user_id).await?;
        let mut active_model: users::ActiveModel = user.into();
        active_model.is_active = Set(false);
        active_model.updated_at = Set(Utc::now().naive_utc());

        active_model
            .update(self.db())
            .await
            .context("Failed to deactivate user")?;

        Ok(ServiceResponse::with_message((), "用户已停用"))
    }

    fn auth_response(&self, user: users::Model) -> Result<AuthResponse> {
        let role = parse_role(&user.role);
        let tokens = self
            .jwt
            .generate_token_pair(user.id, user.email.clone(), role)?;
        Ok(AuthResponse {
            user: user.into(),
            tokens,
        })
    }

    async fn is_token_revoked(&self, jti: &str) -> Result<bool> {
        Ok(RevokedTokens::find()
            .filter(revoked_tokens::Column::Jti.eq(jti))
            .one(self.db())
            .await
            .context("Failed to check token revocation")?
            .is_some())
    }

    async fn fetch_user(&self, user_id: i32) -> Result<users::Model> {
        Users::find_by_id(user_id)
            .one(self.db())
            .await
            .context("Failed to fetch user")?
            .ok_or_else(|| MarketError::not_found("User", user_id.to_string()))
    }

    async fn ensure_unique_email(&self, exclude_id: Option<i32>, email: &str) -> Result<()> {
        let mut query = Users::find().filter(users::Column::Email.eq(email));
        if let Some(id) = exclude_id {
            query = query.filter(users::Column::Id.ne(id));
        }

        if query
            .one(self.db())
            .await
            .context("Failed to check existing user")?
            .is_some()
        {
            return Err(MarketError::conflict("User", email));
        }
        Ok(())
    }

    fn filtered_users(query: &UserQuery) -> Select<Users> {
        let mut select = Users::find();

        if let Some(role) = query
            .role
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
        {
            select = select.filter(users::Column::Role.eq(role));
        }
        if let Some(is_active) = query.is_active {
            select = select.filter(users::Column::IsActive.eq(is_active));
        }

        select
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn parse_role(role: &str) -> UserRole {
    UserRole::parse(role).unwrap_or(UserRole::Customer)
}

fn ensure_admin(auth: &AuthContext) -> Result<()> {
    if auth.is_admin() {
        Ok(())
    } else {
        Err(MarketError::permission("权限不足"))
    }
}

fn validate_email(email: &str) -> Result<()> {
    if email.len() <= 255 && email.contains('@') && !email.starts_with('@') && !email.ends_with('@')
    {
        Ok(())
    } else {
        Err(MarketError::validation_field("邮箱格式无效", "email"))
    }
}

fn ensure_password_strength(password: &str) -> Result<()> {
    if password.len() >= 8 {
        Ok(())
    } else {
        Err(MarketError::validation_field("密码长度至少8字符", "password"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Foo@Example.COM "), "foo@example.com");
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
    }

    #[test]
    fn test_password_strength() {
        assert!(ensure_password_strength("12345678").is_ok());
        assert!(ensure_password_strength("short").is_err());
    }
}
