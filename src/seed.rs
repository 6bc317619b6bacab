//! # 演示数据
//!
//! 空库时写入一套可浏览的演示数据：管理员、顾客、两家已审核商户、
//! 分类树与带库存的商品。已有用户时跳过。

use chrono::Utc;
use entity::{
    categories, categories::Entity as Categories, products, products::Entity as Products, users,
    users::Entity as Users, vendors, vendors::Entity as Vendors,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set};

use crate::{
    auth::{UserRole, password::hash_password},
    error::{Context, Result},
    services::shared::slugify,
    types::VendorStatus,
};

pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<()> {
    let existing = Users::find()
        .count(db)
        .await
        .context("Failed to count users")?;
    if existing > 0 {
        tracing::info!("数据库非空，跳过演示数据写入");
        return Ok(());
    }

    let now = Utc::now().naive_utc();
    let password_hash = hash_password("password123")?;

    let admin = users::ActiveModel {
        email: Set("admin@market.local".to_string()),
        first_name: Set("Site".to_string()),
        last_name: Set("Admin".to_string()),
        phone: Set(String::new()),
        role: Set(UserRole::Admin.as_str().to_string()),
        is_active: Set(true),
        password_hash: Set(password_hash.clone()),
        date_joined: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .context("Failed to seed admin")?;

    users::ActiveModel {
        email: Set("customer@market.local".to_string()),
        first_name: Set("Demo".to_string()),
        last_name: Set("Customer".to_string()),
        phone: Set(String::new()),
        role: Set(UserRole::Customer.as_str().to_string()),
        is_active: Set(true),
        password_hash: Set(password_hash.clone()),
        date_joined: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .context("Failed to seed customer")?;

    let electronics = seed_category(db, "Electronics", None).await?;
    seed_category(db, "Laptops", Some(electronics.id)).await?;
    let phones = seed_category(db, "Phones", Some(electronics.id)).await?;
    let home = seed_category(db, "Home & Kitchen", None).await?;

    let stores = [
        ("TechNest", "vendor1@market.local"),
        ("CozyHome Goods", "vendor2@market.local"),
    ];
    let mut vendor_ids = Vec::new();
    for (store_name, email) in stores {
        let user = users::ActiveModel {
            email: Set(email.to_string()),
            first_name: Set(String::new()),
            last_name: Set(String::new()),
            phone: Set(String::new()),
            role: Set(UserRole::Vendor.as_str().to_string()),
            is_active: Set(true),
            password_hash: Set(password_hash.clone()),
            date_joined: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .context("Failed to seed vendor user")?;

        let vendor = vendors::ActiveModel {
            user_id: Set(user.id),
            store_name: Set(store_name.to_string()),
            slug: Set(slugify(store_name)),
            description: Set(format!("{store_name} official store")),
            business_email: Set(email.to_string()),
            business_phone: Set(String::new()),
            business_address: Set(String::new()),
            status: Set(VendorStatus::Approved.as_str().to_string()),
            is_featured: Set(true),
            total_products: Set(0),
            total_orders: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .context("Failed to seed vendor")?;
        vendor_ids.push(vendor.id);
    }

    let catalog = [
        (vendor_ids[0], phones.id, "Nimbus X5 Smartphone", 49_999, 25),
        (vendor_ids[0], electronics.id, "Volt USB-C Charger", 1_999, 120),
        (vendor_ids[0], electronics.id, "AeroBuds Wireless Earbuds", 7_999, 60),
        (vendor_ids[1], home.id, "Ceramic Pour-Over Kettle", 3_499, 40),
        (vendor_ids[1], home.id, "Linen Apron", 2_499, 80),
    ];
    for (vendor_id, category_id, name, cents, stock) in catalog {
        products::ActiveModel {
            vendor_id: Set(vendor_id),
            category_id: Set(Some(category_id)),
            name: Set(name.to_string()),
            slug: Set(slugify(name)),
            description: Set(format!("{name} - demo listing")),
            short_description: Set(String::new()),
            price: Set(Decimal::new(cents, 2)),
            compare_price: Set(None),
            stock: Set(stock),
            sku: Set(String::new()),
            is_active: Set(true),
            is_featured: Set(true),
            view_count: Set(0),
            sales_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .context("Failed to seed product")?;
    }

    for vendor_id in vendor_ids {
        crate::services::VendorsService::new(db)
            .recompute_product_count(vendor_id)
            .await?;
    }

    let total_products = Products::find()
        .count(db)
        .await
        .context("Failed to count products")?;
    let total_categories = Categories::find()
        .count(db)
        .await
        .context("Failed to count categories")?;
    let total_vendors = Vendors::find()
        .count(db)
        .await
        .context("Failed to count vendors")?;
    tracing::info!(
        admin = %admin.email,
        vendors = total_vendors,
        categories = total_categories,
        products = total_products,
        "演示数据写入完成"
    );
    Ok(())
}

async fn seed_category(
    db: &DatabaseConnection,
    name: &str,
    parent_id: Option<i32>,
) -> Result<categories::Model> {
    let now = Utc::now().naive_utc();
    categories::ActiveModel {
        name: Set(name.to_string()),
        slug: Set(slugify(name)),
        description: Set(String::new()),
        icon: Set(String::new()),
        parent_id: Set(parent_id),
        sort_order: Set(0),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .context("Failed to seed category")
}
