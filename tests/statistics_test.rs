//! 平台统计集成测试

use market_api::{
    MarketError,
    auth::UserRole,
    services::{
        CartService, OrdersService, StatisticsService,
        cart::CartOwner,
        orders::{CheckoutRequest, ShippingAddressInput},
    },
    testing::{
        ProductFixture, UserFixture, VendorFixture, insert_product, insert_user_with_auth,
        insert_vendor, setup_approved_vendor, setup_test_db,
    },
    types::VendorStatus,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

fn inline_checkout() -> CheckoutRequest {
    CheckoutRequest {
        address_id: None,
        address: Some(ShippingAddressInput {
            full_name: "Ada Lovelace".to_string(),
            phone: "555-0100".to_string(),
            address_line1: "1 Main St".to_string(),
            address_line2: String::new(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            postal_code: "62701".to_string(),
            country: "US".to_string(),
        }),
        save_address: false,
        note: String::new(),
    }
}

#[tokio::test]
async fn test_platform_requires_admin() {
    let db = setup_test_db().await;
    let service = StatisticsService::new(&db);
    let (_, customer) = insert_user_with_auth(&db, UserFixture::new()).await;

    let err = service.platform(&customer).await.expect_err("non-admin");
    assert!(matches!(err, MarketError::Permission { .. }));
}

#[tokio::test]
async fn test_platform_on_empty_database() {
    let db = setup_test_db().await;
    let service = StatisticsService::new(&db);
    let (_, admin) = insert_user_with_auth(
        &db,
        UserFixture::new().email("admin@example.com").admin(),
    )
    .await;

    let stats = service.platform(&admin).await.expect("stats");
    assert_eq!(stats.users.total, 1);
    assert_eq!(stats.users.customers, 0);
    assert_eq!(stats.users.vendors, 0);
    assert!(stats.vendors.is_empty());
    assert_eq!(stats.products.total, 0);
    assert_eq!(stats.products.active, 0);
    assert!(stats.orders.is_empty());
    assert_eq!(stats.revenue, Decimal::ZERO);
}

#[tokio::test]
async fn test_platform_counts_and_revenue() {
    let db = setup_test_db().await;
    let statistics = StatisticsService::new(&db);
    let cart = CartService::new(&db);
    let orders = OrdersService::new(&db);

    let (_, admin) = insert_user_with_auth(
        &db,
        UserFixture::new().email("admin@example.com").admin(),
    )
    .await;
    let (vendor, _) = setup_approved_vendor(&db, "v@example.com", "Store").await;

    let (pending_user, _) = insert_user_with_auth(
        &db,
        UserFixture::new()
            .email("pending@example.com")
            .role(UserRole::Vendor),
    )
    .await;
    insert_vendor(
        &db,
        VendorFixture::new(pending_user.id)
            .store_name("Pending Store")
            .status(VendorStatus::Pending),
    )
    .await;

    // 商品 20.00，两个订单各一件
    let product = insert_product(
        &db,
        ProductFixture::new(vendor.id, "Widget")
            .price(Decimal::new(2000, 2))
            .stock(10),
    )
    .await;
    insert_product(&db, ProductFixture::new(vendor.id, "Hidden").inactive()).await;

    let (_, buyer) = insert_user_with_auth(
        &db,
        UserFixture::new().email("buyer@example.com"),
    )
    .await;
    let owner = CartOwner::user(&buyer);

    let mut order_numbers = Vec::new();
    for _ in 0..2 {
        cart.add_item(&owner, product.id, 1).await.expect("add");
        let placed = orders
            .checkout(&buyer, &inline_checkout())
            .await
            .expect("checkout");
        order_numbers.push(placed.data.order_number);
    }

    // 只有第一单发货，收入只算它：20.00 + 税 2.00 + 运费 5.00
    orders
        .admin_update_status(&admin, &order_numbers[0], "shipped")
        .await
        .expect("ship first");

    let stats = statistics.platform(&admin).await.expect("stats");
    assert_eq!(stats.users.total, 4);
    assert_eq!(stats.users.customers, 1);
    assert_eq!(stats.users.vendors, 2);
    assert_eq!(stats.vendors.len(), 2);
    assert_eq!(stats.products.total, 2);
    assert_eq!(stats.products.active, 1);

    let pending_orders = stats
        .orders
        .iter()
        .find(|c| c.status == "pending")
        .expect("pending bucket");
    assert_eq!(pending_orders.count, 1);
    let shipped_orders = stats
        .orders
        .iter()
        .find(|c| c.status == "shipped")
        .expect("shipped bucket");
    assert_eq!(shipped_orders.count, 1);

    assert_eq!(stats.revenue, Decimal::new(2700, 2));
}
