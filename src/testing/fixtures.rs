//! # 测试数据 Fixtures
//!
//! 链式构建器，转换为 Sea-ORM ActiveModel 后直接插入测试库

use chrono::Utc;
use entity::{categories, products, users, vendors};
use rust_decimal::Decimal;
use sea_orm::Set;

use crate::{
    auth::UserRole,
    types::VendorStatus,
};

/// 用户测试数据构建器
pub struct UserFixture {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub role: UserRole,
    pub is_active: bool,
    pub password_hash: String,
}

impl Default for UserFixture {
    fn default() -> Self {
        Self {
            email: "test@example.com".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            phone: String::new(),
            role: UserRole::Customer,
            is_active: true,
            // 测试专用低成本哈希
            password_hash: bcrypt::hash("password123", 4).expect("hash fixture password"),
        }
    }
}

impl UserFixture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn email(mut self, email: &str) -> Self {
        self.email = email.to_string();
        self
    }

    #[must_use]
    pub const fn role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }

    #[must_use]
    pub fn admin(self) -> Self {
        self.role(UserRole::Admin)
    }

    #[must_use]
    pub const fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    #[must_use]
    pub fn to_active_model(self) -> users::ActiveModel {
        let now = Utc::now().naive_utc();
        users::ActiveModel {
            email: Set(self.email),
            first_name: Set(self.first_name),
            last_name: Set(self.last_name),
            phone: Set(self.phone),
            role: Set(self.role.as_str().to_string()),
            is_active: Set(self.is_active),
            password_hash: Set(self.password_hash),
            date_joined: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
    }
}

/// 商户测试数据构建器
pub struct VendorFixture {
    pub user_id: i32,
    pub store_name: String,
    pub slug: String,
    pub status: VendorStatus,
    pub is_featured: bool,
}

impl Default for VendorFixture {
    fn default() -> Self {
        Self {
            user_id: 1,
            store_name: "Test Store".to_string(),
            slug: "test-store".to_string(),
            status: VendorStatus::Approved,
            is_featured: false,
        }
    }
}

impl VendorFixture {
    #[must_use]
    pub fn new(user_id: i32) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn store_name(mut self, name: &str) -> Self {
        self.slug = crate::services::shared::slugify(name);
        self.store_name = name.to_string();
        self
    }

    #[must_use]
    pub const fn status(mut self, status: VendorStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub const fn featured(mut self) -> Self {
        self.is_featured = true;
        self
    }

    #[must_use]
    pub fn to_active_model(self) -> vendors::ActiveModel {
        let now = Utc::now().naive_utc();
        vendors::ActiveModel {
            user_id: Set(self.user_id),
            store_name: Set(self.store_name.clone()),
            slug: Set(self.slug),
            description: Set(String::new()),
            business_email: Set("store@example.com".to_string()),
            business_phone: Set(String::new()),
            business_address: Set(String::new()),
            status: Set(self.status.as_str().to_string()),
            is_featured: Set(self.is_featured),
            total_products: Set(0),
            total_orders: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
    }
}

/// 分类测试数据构建器
pub struct CategoryFixture {
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i32>,
    pub is_active: bool,
}

impl Default for CategoryFixture {
    fn default() -> Self {
        Self {
            name: "Electronics".to_string(),
            slug: "electronics".to_string(),
            parent_id: None,
            is_active: true,
        }
    }
}

impl CategoryFixture {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            slug: crate::services::shared::slugify(name),
            name: name.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn parent(mut self, parent_id: i32) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    #[must_use]
    pub const fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    #[must_use]
    pub fn to_active_model(self) -> categories::ActiveModel {
        let now = Utc::now().naive_utc();
        categories::ActiveModel {
            name: Set(self.name),
            slug: Set(self.slug),
            description: Set(String::new()),
            icon: Set(String::new()),
            parent_id: Set(self.parent_id),
            sort_order: Set(0),
            is_active: Set(self.is_active),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
    }
}

/// 商品测试数据构建器
pub struct ProductFixture {
    pub vendor_id: i32,
    pub category_id: Option<i32>,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub stock: i32,
    pub is_active: bool,
    pub is_featured: bool,
}

impl Default for ProductFixture {
    fn default() -> Self {
        Self {
            vendor_id: 1,
            category_id: None,
            name: "Test Product".to_string(),
            slug: "test-product".to_string(),
            price: Decimal::new(1999, 2),
            stock: 10,
            is_active: true,
            is_featured: false,
        }
    }
}

impl ProductFixture {
    #[must_use]
    pub fn new(vendor_id: i32, name: &str) -> Self {
        Self {
            vendor_id,
            slug: crate::services::shared::slugify(name),
            name: name.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn price(mut self, price: Decimal) -> Self {
        self.price = price;
        self
    }

    #[must_use]
    pub const fn stock(mut self, stock: i32) -> Self {
        self.stock = stock;
        self
    }

    #[must_use]
    pub const fn category(mut self, category_id: i32) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub const fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    #[must_use]
    pub const fn featured(mut self) -> Self {
        self.is_featured = true;
        self
    }

    #[must_use]
    pub fn to_active_model(self) -> products::ActiveModel {
        let now = Utc::now().naive_utc();
        products::ActiveModel {
            vendor_id: Set(self.vendor_id),
            category_id: Set(self.category_id),
            name: Set(self.name),
            slug: Set(self.slug),
            description: Set(String::new()),
            short_description: Set(String::new()),
            price: Set(self.price),
            compare_price: Set(None),
            stock: Set(self.stock),
            sku: Set(String::new()),
            is_active: Set(self.is_active),
            is_featured: Set(self.is_featured),
            view_count: Set(0),
            sales_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
    }
}
