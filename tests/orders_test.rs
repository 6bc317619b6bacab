//! 订单生命周期集成测试

use entity::{products::Entity as Products, vendors::Entity as Vendors};
use market_api::{
    MarketError,
    auth::AuthContext,
    services::{
        CartService, OrdersService,
        cart::CartOwner,
        orders::{AdminOrderQuery, CheckoutRequest, ShippingAddressInput},
    },
    testing::{
        ProductFixture, UserFixture, insert_product, insert_user_with_auth,
        setup_approved_vendor, setup_test_db,
    },
};
use pretty_assertions::assert_eq;
use sea_orm::{DatabaseConnection, EntityTrait};

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

/// 加购并结账，返回订单号
async fn place_order(
    db: &DatabaseConnection,
    auth: &AuthContext,
    product_id: i32,
    quantity: i32,
) -> String {
    CartService::new(db)
        .add_item(&CartOwner::user(auth), product_id, quantity)
        .await
        .expect("add to cart");
    OrdersService::new(db)
        .checkout(auth, &inline_checkout())
        .await
        .expect("checkout")
        .data
        .order_number
}

#[tokio::test]
async fn test_cancel_restores_stock_but_not_sales_count() {
    let db = setup_test_db().await;
    let orders = OrdersService::new(&db);

    let (vendor, _) = setup_approved_vendor(&db, "v@example.com", "Store").await;
    let product =
        insert_product(&db, ProductFixture::new(vendor.id, "Widget").stock(10)).await;
    let (_, auth) = insert_user_with_auth(
        &db,
        UserFixture::new().email("buyer@example.com"),
    )
    .await;

    let order_number = place_order(&db, &auth, product.id, 3).await;
    let after_checkout = Products::find_by_id(product.id)
        .one(&db)
        .await
        .expect("query")
        .expect("exists");
    assert_eq!(after_checkout.stock, 7);
    assert_eq!(after_checkout.sales_count, 3);

    let cancelled = orders.cancel(&auth, &order_number).await.expect("cancel");
    assert_eq!(cancelled.data.status, "cancelled");
    // 条目状态级联
    assert!(cancelled.data.items.iter().all(|i| i.status == "cancelled"));

    // 库存退回，销量不回退
    let after_cancel = Products::find_by_id(product.id)
        .one(&db)
        .await
        .expect("query")
        .expect("exists");
    assert_eq!(after_cancel.stock, 10);
    assert_eq!(after_cancel.sales_count, 3);
}

#[tokio::test]
async fn test_cancel_rejected_once_processing() {
    let db = setup_test_db().await;
    let orders = OrdersService::new(&db);

    let (vendor, _) = setup_approved_vendor(&db, "v@example.com", "Store").await;
    let product =
        insert_product(&db, ProductFixture::new(vendor.id, "Widget").stock(5)).await;
    let (_, admin) = insert_user_with_auth(
        &db,
        UserFixture::new().email("admin@example.com").admin(),
    )
    .await;
    let (_, auth) = insert_user_with_auth(
        &db,
        UserFixture::new().email("buyer@example.com"),
    )
    .await;

    let order_number = place_order(&db, &auth, product.id, 1).await;
    orders
        .admin_update_status(&admin, &order_number, "processing")
        .await
        .expect("to processing");

    let err = orders
        .cancel(&auth, &order_number)
        .await
        .expect_err("not pending anymore");
    assert!(matches!(err, MarketError::Business { .. }));
}

#[tokio::test]
async fn test_order_ownership_hides_foreign_orders() {
    let db = setup_test_db().await;
    let orders = OrdersService::new(&db);

    let (vendor, _) = setup_approved_vendor(&db, "v@example.com", "Store").await;
    let product =
        insert_product(&db, ProductFixture::new(vendor.id, "Widget").stock(5)).await;
    let (_, owner) = insert_user_with_auth(
        &db,
        UserFixture::new().email("owner@example.com"),
    )
    .await;
    let (_, other) = insert_user_with_auth(
        &db,
        UserFixture::new().email("other@example.com"),
    )
    .await;

    let order_number = place_order(&db, &owner, product.id, 1).await;

    let err = orders.get(&other, &order_number).await.expect_err("foreign get");
    assert!(matches!(err, MarketError::NotFound { .. }));
    let err = orders
        .cancel(&other, &order_number)
        .await
        .expect_err("foreign cancel");
    assert!(matches!(err, MarketError::NotFound { .. }));

    assert_eq!(orders.my_orders(&other).await.expect("list").len(), 0);
    assert_eq!(orders.my_orders(&owner).await.expect("list").len(), 1);
}

#[tokio::test]
async fn test_admin_status_update_cascades_to_all_items() {
    let db = setup_test_db().await;
    let cart = CartService::new(&db);
    let orders = OrdersService::new(&db);

    // 同一订单含两个商户的条目
    let (v1, _) = setup_approved_vendor(&db, "v1@example.com", "First Store").await;
    let (v2, _) = setup_approved_vendor(&db, "v2@example.com", "Second Store").await;
    let p1 = insert_product(&db, ProductFixture::new(v1.id, "From First").stock(5)).await;
    let p2 = insert_product(&db, ProductFixture::new(v2.id, "From Second").stock(5)).await;

    let (_, admin) = insert_user_with_auth(
        &db,
        UserFixture::new().email("admin@example.com").admin(),
    )
    .await;
    let (_, buyer) = insert_user_with_auth(
        &db,
        UserFixture::new().email("buyer@example.com"),
    )
    .await;
    let owner = CartOwner::user(&buyer);
    cart.add_item(&owner, p1.id, 1).await.expect("add p1");
    cart.add_item(&owner, p2.id, 1).await.expect("add p2");
    let order_number = orders
        .checkout(&buyer, &inline_checkout())
        .await
        .expect("checkout")
        .data
        .order_number;

    let shipped = orders
        .admin_update_status(&admin, &order_number, "shipped")
        .await
        .expect("ship");
    assert_eq!(shipped.data.status, "shipped");
    assert_eq!(shipped.data.items.len(), 2);
    assert!(shipped.data.items.iter().all(|i| i.status == "shipped"));

    let err = orders
        .admin_update_status(&admin, &order_number, "teleported")
        .await
        .expect_err("unknown status");
    assert!(matches!(err, MarketError::Validation { .. }));

    // 已发货的订单不能再取消
    let err = orders
        .admin_update_status(&admin, &order_number, "cancelled")
        .await
        .expect_err("cancel after ship");
    assert!(matches!(err, MarketError::Business { .. }));
}

#[tokio::test]
async fn test_cancelled_order_is_terminal() {
    let db = setup_test_db().await;
    let orders = OrdersService::new(&db);

    let (vendor, _) = setup_approved_vendor(&db, "v@example.com", "Store").await;
    let product =
        insert_product(&db, ProductFixture::new(vendor.id, "Widget").stock(5)).await;
    let (_, admin) = insert_user_with_auth(
        &db,
        UserFixture::new().email("admin@example.com").admin(),
    )
    .await;
    let (_, buyer) = insert_user_with_auth(
        &db,
        UserFixture::new().email("buyer@example.com"),
    )
    .await;

    let order_number = place_order(&db, &buyer, product.id, 1).await;
    orders.cancel(&buyer, &order_number).await.expect("cancel");

    let err = orders
        .admin_update_status(&admin, &order_number, "processing")
        .await
        .expect_err("terminal state");
    assert!(matches!(err, MarketError::Business { .. }));
}

#[tokio::test]
async fn test_vendor_sees_only_own_items() {
    let db = setup_test_db().await;
    let cart = CartService::new(&db);
    let orders = OrdersService::new(&db);

    let (v1, v1_auth) = setup_approved_vendor(&db, "v1@example.com", "First Store").await;
    let (v2, v2_auth) = setup_approved_vendor(&db, "v2@example.com", "Second Store").await;
    let p1 = insert_product(&db, ProductFixture::new(v1.id, "From First").stock(5)).await;
    let p2 = insert_product(&db, ProductFixture::new(v2.id, "From Second").stock(5)).await;

    let (_, buyer) = insert_user_with_auth(
        &db,
        UserFixture::new().email("buyer@example.com"),
    )
    .await;
    let buyer_cart = CartOwner::user(&buyer);
    cart.add_item(&buyer_cart, p1.id, 1).await.expect("add p1");
    cart.add_item(&buyer_cart, p2.id, 2).await.expect("add p2");
    let order_number = orders
        .checkout(&buyer, &inline_checkout())
        .await
        .expect("checkout")
        .data
        .order_number;

    let v1_view = orders.vendor_orders(&v1_auth).await.expect("v1 orders");
    assert_eq!(v1_view.len(), 1);
    assert_eq!(v1_view[0].items.len(), 1);
    assert_eq!(v1_view[0].items[0].product_name, "From First");

    let v2_items = orders
        .vendor_order_items(&v2_auth, &order_number)
        .await
        .expect("v2 items");
    assert_eq!(v2_items.len(), 1);
    assert_eq!(v2_items[0].quantity, 2);

    // 订单里没有本商户条目时视同不存在
    let (v3, v3_auth) = setup_approved_vendor(&db, "v3@example.com", "Third Store").await;
    let _ = v3;
    let err = orders
        .vendor_order_items(&v3_auth, &order_number)
        .await
        .expect_err("no items for v3");
    assert!(matches!(err, MarketError::NotFound { .. }));
}

#[tokio::test]
async fn test_vendor_item_delivery_updates_sales_count() {
    let db = setup_test_db().await;
    let orders = OrdersService::new(&db);

    let (vendor, vendor_auth) =
        setup_approved_vendor(&db, "v@example.com", "Store").await;
    let product =
        insert_product(&db, ProductFixture::new(vendor.id, "Widget").stock(5)).await;
    let (_, buyer) = insert_user_with_auth(
        &db,
        UserFixture::new().email("buyer@example.com"),
    )
    .await;

    let order_number = place_order(&db, &buyer, product.id, 1).await;
    let items = orders
        .vendor_order_items(&vendor_auth, &order_number)
        .await
        .expect("items");

    // 他人条目不可见也不可改
    let (_, rival_auth) = setup_approved_vendor(&db, "r@example.com", "Rival").await;
    let err = orders
        .vendor_update_item_status(&rival_auth, items[0].id, "shipped")
        .await
        .expect_err("foreign item");
    assert!(matches!(err, MarketError::NotFound { .. }));

    let delivered = orders
        .vendor_update_item_status(&vendor_auth, items[0].id, "delivered")
        .await
        .expect("deliver");
    assert_eq!(delivered.data.status, "delivered");

    // 条目送达后成交计数重算
    let refreshed = Vendors::find_by_id(vendor.id)
        .one(&db)
        .await
        .expect("query")
        .expect("exists");
    assert_eq!(refreshed.total_orders, 1);
}

#[tokio::test]
async fn test_admin_list_filters_by_status() {
    let db = setup_test_db().await;
    let orders = OrdersService::new(&db);

    let (vendor, _) = setup_approved_vendor(&db, "v@example.com", "Store").await;
    let product =
        insert_product(&db, ProductFixture::new(vendor.id, "Widget").stock(10)).await;
    let (_, admin) = insert_user_with_auth(
        &db,
        UserFixture::new().email("admin@example.com").admin(),
    )
    .await;
    let (_, buyer) = insert_user_with_auth(
        &db,
        UserFixture::new().email("buyer@example.com"),
    )
    .await;

    let first = place_order(&db, &buyer, product.id, 1).await;
    let _second = place_order(&db, &buyer, product.id, 1).await;
    orders.cancel(&buyer, &first).await.expect("cancel first");

    let pending = orders
        .list_admin(
            &admin,
            &AdminOrderQuery {
                status: Some("pending".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("list pending");
    assert_eq!(pending.pagination.total, 1);

    let all = orders
        .list_admin(&admin, &AdminOrderQuery::default())
        .await
        .expect("list all");
    assert_eq!(all.pagination.total, 2);

    let err = orders
        .list_admin(&buyer, &AdminOrderQuery::default())
        .await
        .expect_err("non-admin");
    assert!(matches!(err, MarketError::Permission { .. }));
}
