//! 商户服务集成测试

use entity::users::Entity as Users;
use market_api::{
    MarketError,
    auth::UserRole,
    services::{
        VendorsService,
        vendors::{AdminVendorQuery, VendorQuery, VendorRegisterRequest},
    },
    testing::{
        UserFixture, VendorFixture, insert_user_with_auth, insert_vendor, setup_test_db,
    },
    types::VendorStatus,
};
use pretty_assertions::assert_eq;
use sea_orm::EntityTrait;

fn register_request(store_name: &str) -> VendorRegisterRequest {
    VendorRegisterRequest {
        store_name: store_name.to_string(),
        description: String::new(),
        business_email: "store@example.com".to_string(),
        business_phone: String::new(),
        business_address: String::new(),
    }
}

#[tokio::test]
async fn test_register_creates_pending_vendor_and_flips_role() {
    let db = setup_test_db().await;
    let service = VendorsService::new(&db);
    let (user, auth) = insert_user_with_auth(&db, UserFixture::new()).await;

    let response = service
        .register(&auth, &register_request("Gadget Grove"))
        .await
        .expect("register vendor");
    assert_eq!(response.data.status, "pending");
    assert_eq!(response.data.slug, "gadget-grove");

    let updated = Users::find_by_id(user.id)
        .one(&db)
        .await
        .expect("query user")
        .expect("user exists");
    assert_eq!(updated.role, UserRole::Vendor.as_str());
}

#[tokio::test]
async fn test_store_name_unique_case_insensitive() {
    let db = setup_test_db().await;
    let service = VendorsService::new(&db);

    let (user, _) = insert_user_with_auth(
        &db,
        UserFixture::new().email("a@example.com"),
    )
    .await;
    insert_vendor(&db, VendorFixture::new(user.id).store_name("Gadget Grove")).await;

    let (_, other) = insert_user_with_auth(
        &db,
        UserFixture::new().email("b@example.com"),
    )
    .await;
    let err = service
        .register(&other, &register_request("GADGET grove"))
        .await
        .expect_err("case-insensitive collision");
    assert!(matches!(err, MarketError::Conflict { .. }));
}

#[tokio::test]
async fn test_one_vendor_profile_per_user() {
    let db = setup_test_db().await;
    let service = VendorsService::new(&db);
    let (_, auth) = insert_user_with_auth(&db, UserFixture::new()).await;

    service
        .register(&auth, &register_request("First Store"))
        .await
        .expect("first register");
    let err = service
        .register(&auth, &register_request("Second Store"))
        .await
        .expect_err("second register");
    assert!(matches!(err, MarketError::Conflict { .. }));
}

#[tokio::test]
async fn test_set_status_actions() {
    let db = setup_test_db().await;
    let service = VendorsService::new(&db);

    let (_, admin) = insert_user_with_auth(
        &db,
        UserFixture::new().email("admin@example.com").admin(),
    )
    .await;
    let (user, _) = insert_user_with_auth(
        &db,
        UserFixture::new().email("v@example.com").role(UserRole::Vendor),
    )
    .await;
    let vendor = insert_vendor(
        &db,
        VendorFixture::new(user.id).status(VendorStatus::Pending),
    )
    .await;

    let approved = service
        .set_status(&admin, vendor.id, "approve")
        .await
        .expect("approve");
    assert_eq!(approved.data.status, "approved");

    let suspended = service
        .set_status(&admin, vendor.id, "suspend")
        .await
        .expect("suspend");
    assert_eq!(suspended.data.status, "suspended");

    let err = service
        .set_status(&admin, vendor.id, "promote")
        .await
        .expect_err("unknown action");
    assert!(matches!(err, MarketError::Validation { .. }));
}

#[tokio::test]
async fn test_public_list_only_shows_approved() {
    let db = setup_test_db().await;
    let service = VendorsService::new(&db);

    let (u1, _) = insert_user_with_auth(
        &db,
        UserFixture::new().email("a@example.com"),
    )
    .await;
    insert_vendor(
        &db,
        VendorFixture::new(u1.id)
            .store_name("Approved Store")
            .featured(),
    )
    .await;

    let (u2, _) = insert_user_with_auth(
        &db,
        UserFixture::new().email("b@example.com"),
    )
    .await;
    let pending = insert_vendor(
        &db,
        VendorFixture::new(u2.id)
            .store_name("Pending Store")
            .status(VendorStatus::Pending),
    )
    .await;

    let listed = service
        .list_public(&VendorQuery::default())
        .await
        .expect("list public");
    assert_eq!(listed.pagination.total, 1);
    assert_eq!(listed.vendors[0].store_name, "Approved Store");

    let err = service.get_public(pending.id).await.expect_err("pending hidden");
    assert!(matches!(err, MarketError::NotFound { .. }));

    let featured_only = service
        .list_public(&VendorQuery {
            featured: Some(true),
            ..Default::default()
        })
        .await
        .expect("featured filter");
    assert_eq!(featured_only.pagination.total, 1);
}

#[tokio::test]
async fn test_admin_list_filters_by_status() {
    let db = setup_test_db().await;
    let service = VendorsService::new(&db);

    let (_, admin) = insert_user_with_auth(
        &db,
        UserFixture::new().email("admin@example.com").admin(),
    )
    .await;
    for (email, store, status) in [
        ("a@example.com", "Store A", VendorStatus::Approved),
        ("b@example.com", "Store B", VendorStatus::Pending),
        ("c@example.com", "Store C", VendorStatus::Pending),
    ] {
        let (user, _) =
            insert_user_with_auth(&db, UserFixture::new().email(email)).await;
        insert_vendor(
            &db,
            VendorFixture::new(user.id).store_name(store).status(status),
        )
        .await;
    }

    let pending = service
        .list_admin(
            &admin,
            &AdminVendorQuery {
                status: Some("pending".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("list pending");
    assert_eq!(pending.pagination.total, 2);
}

#[tokio::test]
async fn test_dashboard_empty_vendor_is_all_zero() {
    let db = setup_test_db().await;
    let service = VendorsService::new(&db);

    let (user, auth) = insert_user_with_auth(
        &db,
        UserFixture::new().role(UserRole::Vendor),
    )
    .await;
    insert_vendor(&db, VendorFixture::new(user.id)).await;

    let dashboard = service.dashboard(&auth).await.expect("dashboard");
    assert_eq!(dashboard.total_products, 0);
    assert_eq!(dashboard.active_products, 0);
    assert_eq!(dashboard.total_orders, 0);
    assert!(dashboard.item_status_counts.is_empty());
    assert_eq!(dashboard.revenue, rust_decimal::Decimal::ZERO);
}
