//! 结账流程集成测试

use entity::products::Entity as Products;
use market_api::{
    MarketError,
    config::CheckoutConfig,
    services::{
        CartService, OrdersService,
        cart::{CartOwner, GuestCartLine},
        orders::{CheckoutRequest, GuestCheckoutRequest, ShippingAddressInput},
    },
    testing::{
        ProductFixture, UserFixture, insert_product, insert_user_with_auth,
        setup_approved_vendor, setup_test_db,
    },
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use sea_orm::EntityTrait;

fn shipping() -> ShippingAddressInput {
    ShippingAddressInput {
        full_name: "Ada Lovelace".to_string(),
        phone: "555-0100".to_string(),
        address_line1: "1 Main St".to_string(),
        address_line2: String::new(),
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        postal_code: "62701".to_string(),
        country: "US".to_string(),
    }
}

fn inline_checkout() -> CheckoutRequest {
    CheckoutRequest {
        address_id: None,
        address: Some(shipping()),
        save_address: false,
        note: String::new(),
    }
}

#[tokio::test]
async fn test_checkout_totals_below_free_shipping() {
    let db = setup_test_db().await;
    let cart = CartService::new(&db);
    let orders = OrdersService::new(&db);

    let (vendor, _) = setup_approved_vendor(&db, "v@example.com", "Store").await;
    let product = insert_product(
        &db,
        ProductFixture::new(vendor.id, "Mid Item")
            .price(Decimal::new(2000, 2))
            .stock(10),
    )
    .await;
    let (_, auth) = insert_user_with_auth(
        &db,
        UserFixture::new().email("buyer@example.com"),
    )
    .await;

    cart.add_item(&CartOwner::user(&auth), product.id, 2)
        .await
        .expect("add");

    // 小计 40.00：税 4.00，运费 5.00，总额 49.00
    let order = orders.checkout(&auth, &inline_checkout()).await.expect("checkout");
    assert_eq!(order.data.subtotal, Decimal::new(4000, 2));
    assert_eq!(order.data.tax, Decimal::new(400, 2));
    assert_eq!(order.data.shipping_cost, Decimal::new(500, 2));
    assert_eq!(order.data.total, Decimal::new(4900, 2));
    assert_eq!(order.data.status, "pending");
    assert!(order.data.order_number.starts_with("ORD-"));
    assert_eq!(order.data.order_number.len(), 12);

    // 结账后购物车清空
    let after = cart.get_cart(&CartOwner::user(&auth)).await.expect("cart");
    assert!(after.items.is_empty());
}

#[tokio::test]
async fn test_checkout_free_shipping_at_threshold() {
    let db = setup_test_db().await;
    let cart = CartService::new(&db);
    let orders = OrdersService::new(&db);

    let (vendor, _) = setup_approved_vendor(&db, "v@example.com", "Store").await;
    let product = insert_product(
        &db,
        ProductFixture::new(vendor.id, "Big Item")
            .price(Decimal::new(5000, 2))
            .stock(10),
    )
    .await;
    let (_, auth) = insert_user_with_auth(
        &db,
        UserFixture::new().email("buyer@example.com"),
    )
    .await;

    cart.add_item(&CartOwner::user(&auth), product.id, 1)
        .await
        .expect("add");

    let order = orders.checkout(&auth, &inline_checkout()).await.expect("checkout");
    assert_eq!(order.data.shipping_cost, Decimal::ZERO);
    assert_eq!(order.data.total, Decimal::new(5500, 2));
}

#[tokio::test]
async fn test_checkout_empty_cart_is_validation_error() {
    let db = setup_test_db().await;
    let orders = OrdersService::new(&db);
    let (_, auth) = insert_user_with_auth(&db, UserFixture::new()).await;

    let err = orders
        .checkout(&auth, &inline_checkout())
        .await
        .expect_err("empty cart");
    assert!(matches!(err, MarketError::Validation { .. }));
}

#[tokio::test]
async fn test_checkout_stock_violation_aborts_whole_order() {
    let db = setup_test_db().await;
    let cart = CartService::new(&db);
    let orders = OrdersService::new(&db);

    let (vendor, _) = setup_approved_vendor(&db, "v@example.com", "Store").await;
    let plenty = insert_product(
        &db,
        ProductFixture::new(vendor.id, "Plenty").stock(10),
    )
    .await;
    let scarce = insert_product(
        &db,
        ProductFixture::new(vendor.id, "Scarce").stock(5),
    )
    .await;
    let (_, auth) = insert_user_with_auth(
        &db,
        UserFixture::new().email("buyer@example.com"),
    )
    .await;
    let owner = CartOwner::user(&auth);

    cart.add_item(&owner, plenty.id, 2).await.expect("add plenty");
    cart.add_item(&owner, scarce.id, 5).await.expect("add scarce");

    // 加车后库存被其他订单买走
    let guest_order = GuestCheckoutRequest {
        email: "rival@example.com".to_string(),
        items: vec![GuestCartLine {
            product_id: scarce.id,
            quantity: 3,
        }],
        address: shipping(),
        note: String::new(),
    };
    orders.guest_checkout(&guest_order).await.expect("rival buys stock");

    let err = orders
        .checkout(&auth, &inline_checkout())
        .await
        .expect_err("stock violation");
    match err {
        MarketError::Stock { message, available } => {
            assert_eq!(available, 2);
            assert_eq!(message, "Only 2 of Scarce available.");
        }
        other => panic!("expected stock error, got {other:?}"),
    }

    // 整单回滚：没有扣减 Plenty 的库存，购物车保持不变
    let plenty_now = Products::find_by_id(plenty.id)
        .one(&db)
        .await
        .expect("query")
        .expect("exists");
    assert_eq!(plenty_now.stock, 10);
    let unchanged = cart.get_cart(&owner).await.expect("cart");
    assert_eq!(unchanged.total_items, 7);
}

#[tokio::test]
async fn test_last_unit_cannot_be_sold_twice() {
    let db = setup_test_db().await;
    let cart = CartService::new(&db);
    let orders = OrdersService::new(&db);

    let (vendor, _) = setup_approved_vendor(&db, "v@example.com", "Store").await;
    let product = insert_product(
        &db,
        ProductFixture::new(vendor.id, "Last One").stock(1),
    )
    .await;

    let (_, first) = insert_user_with_auth(
        &db,
        UserFixture::new().email("first@example.com"),
    )
    .await;
    let (_, second) = insert_user_with_auth(
        &db,
        UserFixture::new().email("second@example.com"),
    )
    .await;

    cart.add_item(&CartOwner::user(&first), product.id, 1)
        .await
        .expect("first add");
    cart.add_item(&CartOwner::user(&second), product.id, 1)
        .await
        .expect("second add");

    orders.checkout(&first, &inline_checkout()).await.expect("first wins");
    let err = orders
        .checkout(&second, &inline_checkout())
        .await
        .expect_err("second loses");
    assert!(matches!(err, MarketError::Stock { available: 0, .. }));

    let remaining = Products::find_by_id(product.id)
        .one(&db)
        .await
        .expect("query")
        .expect("exists");
    assert_eq!(remaining.stock, 0);
}

#[tokio::test]
async fn test_checkout_with_saved_address_and_ownership() {
    let db = setup_test_db().await;
    let cart = CartService::new(&db);
    let orders = OrdersService::new(&db);
    let addresses = market_api::services::AddressesService::new(&db);

    let (vendor, _) = setup_approved_vendor(&db, "v@example.com", "Store").await;
    let product =
        insert_product(&db, ProductFixture::new(vendor.id, "Item").stock(5)).await;
    let (_, auth) = insert_user_with_auth(
        &db,
        UserFixture::new().email("buyer@example.com"),
    )
    .await;
    let (_, stranger) = insert_user_with_auth(
        &db,
        UserFixture::new().email("stranger@example.com"),
    )
    .await;

    let saved = addresses
        .create(
            &auth,
            &market_api::services::addresses::AddressRequest {
                full_name: "Ada Lovelace".to_string(),
                phone: "555-0100".to_string(),
                address_line1: "1 Main St".to_string(),
                address_line2: String::new(),
                city: "Springfield".to_string(),
                state: "IL".to_string(),
                postal_code: "62701".to_string(),
                country: "US".to_string(),
                address_type: None,
                is_default: true,
            },
        )
        .await
        .expect("save address");

    cart.add_item(&CartOwner::user(&stranger), product.id, 1)
        .await
        .expect("stranger add");
    let err = orders
        .checkout(
            &stranger,
            &CheckoutRequest {
                address_id: Some(saved.data.id),
                address: None,
                save_address: false,
                note: String::new(),
            },
        )
        .await
        .expect_err("foreign address");
    assert!(matches!(err, MarketError::NotFound { .. }));

    cart.add_item(&CartOwner::user(&auth), product.id, 1)
        .await
        .expect("owner add");
    let order = orders
        .checkout(
            &auth,
            &CheckoutRequest {
                address_id: Some(saved.data.id),
                address: None,
                save_address: false,
                note: String::new(),
            },
        )
        .await
        .expect("checkout with saved address");
    assert_eq!(order.data.shipping_name, "Ada Lovelace");
    assert_eq!(order.data.shipping_city, "Springfield");
}

#[tokio::test]
async fn test_save_address_during_checkout() {
    let db = setup_test_db().await;
    let cart = CartService::new(&db);
    let orders = OrdersService::new(&db);
    let addresses = market_api::services::AddressesService::new(&db);

    let (vendor, _) = setup_approved_vendor(&db, "v@example.com", "Store").await;
    let product =
        insert_product(&db, ProductFixture::new(vendor.id, "Item").stock(5)).await;
    let (_, auth) = insert_user_with_auth(
        &db,
        UserFixture::new().email("buyer@example.com"),
    )
    .await;

    cart.add_item(&CartOwner::user(&auth), product.id, 1)
        .await
        .expect("add");
    orders
        .checkout(
            &auth,
            &CheckoutRequest {
                address_id: None,
                address: Some(shipping()),
                save_address: true,
                note: String::new(),
            },
        )
        .await
        .expect("checkout");

    let saved = addresses.list(&auth).await.expect("list");
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].full_name, "Ada Lovelace");
}

#[tokio::test]
async fn test_guest_checkout_and_lookup() {
    let db = setup_test_db().await;
    let orders = OrdersService::new(&db);

    let (vendor, _) = setup_approved_vendor(&db, "v@example.com", "Store").await;
    let product = insert_product(
        &db,
        ProductFixture::new(vendor.id, "Guest Buy")
            .price(Decimal::new(1000, 2))
            .stock(3),
    )
    .await;

    let placed = orders
        .guest_checkout(&GuestCheckoutRequest {
            email: "Guest@Example.com".to_string(),
            items: vec![GuestCartLine {
                product_id: product.id,
                quantity: 2,
            }],
            address: shipping(),
            note: String::new(),
        })
        .await
        .expect("guest checkout");
    assert_eq!(placed.data.user_id, None);
    assert_eq!(placed.data.guest_email.as_deref(), Some("guest@example.com"));

    let found = orders
        .guest_order(&placed.data.order_number, "guest@example.com")
        .await
        .expect("guest lookup");
    assert_eq!(found.items.len(), 1);

    // 订单号与邮箱必须同时匹配
    let err = orders
        .guest_order(&placed.data.order_number, "wrong@example.com")
        .await
        .expect_err("wrong email");
    assert!(matches!(err, MarketError::NotFound { .. }));
}

#[tokio::test]
async fn test_checkout_totals_follow_configured_pricing() {
    let db = setup_test_db().await;
    let cart = CartService::new(&db);
    // 税率 5%，运费 8.00，包邮门槛 120.00
    let orders = OrdersService::with_config(
        &db,
        CheckoutConfig {
            tax_rate: Decimal::new(5, 2),
            shipping_fee: Decimal::new(800, 2),
            free_shipping_threshold: Decimal::new(12000, 2),
        },
    );

    let (vendor, _) = setup_approved_vendor(&db, "v@example.com", "Store").await;
    let product = insert_product(
        &db,
        ProductFixture::new(vendor.id, "Config Item")
            .price(Decimal::new(4000, 2))
            .stock(10),
    )
    .await;
    let (_, auth) = insert_user_with_auth(
        &db,
        UserFixture::new().email("buyer@example.com"),
    )
    .await;

    cart.add_item(&CartOwner::user(&auth), product.id, 2)
        .await
        .expect("add");

    // 小计 80.00：税 4.00，运费 8.00（低于 120.00 门槛），总额 92.00
    let order = orders.checkout(&auth, &inline_checkout()).await.expect("checkout");
    assert_eq!(order.data.subtotal, Decimal::new(8000, 2));
    assert_eq!(order.data.tax, Decimal::new(400, 2));
    assert_eq!(order.data.shipping_cost, Decimal::new(800, 2));
    assert_eq!(order.data.total, Decimal::new(9200, 2));
}
