//! # 测试辅助函数

use entity::{categories, products, users, vendors};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection};

use crate::{
    auth::{AuthContext, UserRole},
    types::VendorStatus,
};

use super::fixtures::{CategoryFixture, ProductFixture, UserFixture, VendorFixture};

/// 内存 SQLite 测试库，每次调用全新迁移
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("connect in-memory database");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

/// 插入用户并返回模型
pub async fn insert_user(db: &DatabaseConnection, fixture: UserFixture) -> users::Model {
    fixture
        .to_active_model()
        .insert(db)
        .await
        .expect("insert user")
}

/// 插入用户并返回其认证上下文
pub async fn insert_user_with_auth(
    db: &DatabaseConnection,
    fixture: UserFixture,
) -> (users::Model, AuthContext) {
    let role = fixture.role;
    let user = insert_user(db, fixture).await;
    let auth = AuthContext::new(user.id, role);
    (user, auth)
}

/// 插入商户档案
pub async fn insert_vendor(db: &DatabaseConnection, fixture: VendorFixture) -> vendors::Model {
    fixture
        .to_active_model()
        .insert(db)
        .await
        .expect("insert vendor")
}

/// 插入分类
pub async fn insert_category(
    db: &DatabaseConnection,
    fixture: CategoryFixture,
) -> categories::Model {
    fixture
        .to_active_model()
        .insert(db)
        .await
        .expect("insert category")
}

/// 插入商品
pub async fn insert_product(db: &DatabaseConnection, fixture: ProductFixture) -> products::Model {
    fixture
        .to_active_model()
        .insert(db)
        .await
        .expect("insert product")
}

/// 常用组合：已审核商户及其用户和认证上下文
pub async fn setup_approved_vendor(
    db: &DatabaseConnection,
    email: &str,
    store_name: &str,
) -> (vendors::Model, AuthContext) {
    let (user, auth) = insert_user_with_auth(
        db,
        UserFixture::new().email(email).role(UserRole::Vendor),
    )
    .await;
    let vendor = insert_vendor(
        db,
        VendorFixture::new(user.id)
            .store_name(store_name)
            .status(VendorStatus::Approved),
    )
    .await;
    (vendor, auth)
}
