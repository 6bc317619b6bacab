//! 商品目录集成测试：分类、商品与心愿单

use market_api::{
    MarketError,
    services::{
        CategoriesService, ProductsService, WishlistService,
        categories::CategoryCreateRequest,
        products::{ProductCreateRequest, ProductImageRequest, ProductQuery},
    },
    testing::{
        CategoryFixture, ProductFixture, UserFixture, insert_category, insert_product,
        insert_user_with_auth, setup_approved_vendor, setup_test_db,
    },
    types::VendorStatus,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

fn product_request(name: &str, cents: i64, stock: i32) -> ProductCreateRequest {
    ProductCreateRequest {
        name: name.to_string(),
        slug: None,
        description: String::new(),
        short_description: String::new(),
        price: Decimal::new(cents, 2),
        compare_price: None,
        stock,
        sku: String::new(),
        category_id: None,
        is_active: None,
    }
}

#[tokio::test]
async fn test_category_tree_lists_active_roots_with_children() {
    let db = setup_test_db().await;
    let service = CategoriesService::new(&db);

    let root = insert_category(&db, CategoryFixture::new("Electronics")).await;
    insert_category(&db, CategoryFixture::new("Laptops").parent(root.id)).await;
    insert_category(
        &db,
        CategoryFixture::new("Discontinued").parent(root.id).inactive(),
    )
    .await;
    insert_category(&db, CategoryFixture::new("Hidden Root").inactive()).await;

    let tree = service.list_tree().await.expect("tree");
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].name, "Electronics");
    assert_eq!(tree[0].subcategories.len(), 1);
    assert_eq!(tree[0].subcategories[0].name, "Laptops");
}

#[tokio::test]
async fn test_category_filter_descends_one_level_only() {
    let db = setup_test_db().await;
    let products = ProductsService::new(&db);

    let root = insert_category(&db, CategoryFixture::new("Electronics")).await;
    let child = insert_category(&db, CategoryFixture::new("Phones").parent(root.id)).await;
    let grandchild =
        insert_category(&db, CategoryFixture::new("Android").parent(child.id)).await;

    let (vendor, _) = setup_approved_vendor(&db, "v@example.com", "Store").await;
    insert_product(
        &db,
        ProductFixture::new(vendor.id, "Root Item").category(root.id),
    )
    .await;
    insert_product(
        &db,
        ProductFixture::new(vendor.id, "Child Item").category(child.id),
    )
    .await;
    insert_product(
        &db,
        ProductFixture::new(vendor.id, "Grandchild Item").category(grandchild.id),
    )
    .await;

    // 根分类筛选含直接子分类，但不含孙分类
    let listed = products
        .list_public(&ProductQuery {
            category: Some("electronics".to_string()),
            ..Default::default()
        })
        .await
        .expect("list by category");
    assert_eq!(listed.pagination.total, 2);
}

#[tokio::test]
async fn test_product_visibility_requires_active_and_approved_vendor() {
    let db = setup_test_db().await;
    let products = ProductsService::new(&db);

    let (approved, _) = setup_approved_vendor(&db, "ok@example.com", "Approved").await;
    insert_product(&db, ProductFixture::new(approved.id, "Visible")).await;
    insert_product(&db, ProductFixture::new(approved.id, "Disabled").inactive()).await;

    let (user, _) = insert_user_with_auth(
        &db,
        UserFixture::new().email("pending@example.com"),
    )
    .await;
    let pending_vendor = market_api::testing::insert_vendor(
        &db,
        market_api::testing::VendorFixture::new(user.id)
            .store_name("Pending Store")
            .status(VendorStatus::Pending),
    )
    .await;
    insert_product(&db, ProductFixture::new(pending_vendor.id, "Unreachable")).await;

    let listed = products
        .list_public(&ProductQuery::default())
        .await
        .expect("list");
    assert_eq!(listed.pagination.total, 1);
    assert_eq!(listed.products[0].name, "Visible");

    let err = products
        .get_by_slug("unreachable")
        .await
        .expect_err("pending vendor product hidden");
    assert!(matches!(err, MarketError::NotFound { .. }));
}

#[tokio::test]
async fn test_get_by_slug_increments_view_count() {
    let db = setup_test_db().await;
    let products = ProductsService::new(&db);

    let (vendor, _) = setup_approved_vendor(&db, "v@example.com", "Store").await;
    insert_product(&db, ProductFixture::new(vendor.id, "Popular Widget")).await;

    let first = products.get_by_slug("popular-widget").await.expect("first view");
    assert_eq!(first.product.view_count, 1);
    let second = products.get_by_slug("popular-widget").await.expect("second view");
    assert_eq!(second.product.view_count, 2);
}

#[tokio::test]
async fn test_vendor_create_derives_unique_slug() {
    let db = setup_test_db().await;
    let products = ProductsService::new(&db);
    let (_, auth) = setup_approved_vendor(&db, "v@example.com", "Store").await;

    let first = products
        .create(&auth, &product_request("Wireless Mouse", 1999, 5))
        .await
        .expect("first create");
    assert_eq!(first.data.slug, "wireless-mouse");

    let second = products
        .create(&auth, &product_request("Wireless Mouse", 2999, 5))
        .await
        .expect("second create");
    assert_eq!(second.data.slug, "wireless-mouse-2");

    let third = products
        .create(&auth, &product_request("Wireless Mouse", 3999, 5))
        .await
        .expect("third create");
    assert_eq!(third.data.slug, "wireless-mouse-3");

    // 显式 slug 冲突不自动加后缀
    let mut explicit = product_request("Another Mouse", 999, 5);
    explicit.slug = Some("wireless-mouse".to_string());
    let err = products.create(&auth, &explicit).await.expect_err("conflict");
    assert!(matches!(err, MarketError::Conflict { .. }));
}

#[tokio::test]
async fn test_unapproved_vendor_cannot_create_products() {
    let db = setup_test_db().await;
    let products = ProductsService::new(&db);

    let (user, auth) = insert_user_with_auth(&db, UserFixture::new()).await;
    market_api::testing::insert_vendor(
        &db,
        market_api::testing::VendorFixture::new(user.id)
            .status(VendorStatus::Pending),
    )
    .await;

    let err = products
        .create(&auth, &product_request("Early Bird", 1000, 1))
        .await
        .expect_err("pending vendor");
    assert!(matches!(err, MarketError::Permission { .. }));
}

#[tokio::test]
async fn test_product_count_follows_create_and_delete() {
    let db = setup_test_db().await;
    let products = ProductsService::new(&db);
    let (vendor, auth) = setup_approved_vendor(&db, "v@example.com", "Store").await;

    let created = products
        .create(&auth, &product_request("Gadget", 1500, 3))
        .await
        .expect("create");

    let vendors = market_api::services::VendorsService::new(&db);
    let profile = vendors.get_public(vendor.id).await.expect("profile");
    assert_eq!(profile.total_products, 1);

    products
        .delete(&auth, created.data.id)
        .await
        .expect("delete");
    let profile = vendors.get_public(vendor.id).await.expect("profile after delete");
    assert_eq!(profile.total_products, 0);
}

#[tokio::test]
async fn test_primary_image_is_exclusive() {
    let db = setup_test_db().await;
    let products = ProductsService::new(&db);
    let (vendor, auth) = setup_approved_vendor(&db, "v@example.com", "Store").await;
    let product = insert_product(&db, ProductFixture::new(vendor.id, "Pictured")).await;

    for (url, primary) in [
        ("https://img.example.com/1.jpg", true),
        ("https://img.example.com/2.jpg", true),
    ] {
        products
            .add_image(
                &auth,
                product.id,
                &ProductImageRequest {
                    image_url: url.to_string(),
                    alt_text: String::new(),
                    is_primary: primary,
                    sort_order: 0,
                },
            )
            .await
            .expect("add image");
    }

    let detail = products.get_public(product.id).await.expect("detail");
    assert_eq!(detail.images.len(), 2);
    let primaries: Vec<_> = detail.images.iter().filter(|i| i.is_primary).collect();
    assert_eq!(primaries.len(), 1);
    assert_eq!(primaries[0].image_url, "https://img.example.com/2.jpg");
}

#[tokio::test]
async fn test_wishlist_toggle_and_check() {
    let db = setup_test_db().await;
    let wishlist = WishlistService::new(&db);

    let (vendor, _) = setup_approved_vendor(&db, "v@example.com", "Store").await;
    let product = insert_product(&db, ProductFixture::new(vendor.id, "Wanted")).await;
    let (_, auth) = insert_user_with_auth(
        &db,
        UserFixture::new().email("buyer@example.com"),
    )
    .await;

    let added = wishlist.toggle(&auth, product.id).await.expect("toggle on");
    assert!(added.data.in_wishlist);
    assert!(wishlist.check(&auth, product.id).await.expect("check"));
    assert_eq!(wishlist.list(&auth).await.expect("list").len(), 1);

    let removed = wishlist.toggle(&auth, product.id).await.expect("toggle off");
    assert!(!removed.data.in_wishlist);
    assert!(!wishlist.check(&auth, product.id).await.expect("check again"));

    let err = wishlist
        .toggle(&auth, 9999)
        .await
        .expect_err("unknown product");
    assert!(matches!(err, MarketError::NotFound { .. }));
}

#[tokio::test]
async fn test_admin_category_crud() {
    let db = setup_test_db().await;
    let service = CategoriesService::new(&db);

    let (_, admin) = insert_user_with_auth(
        &db,
        UserFixture::new().email("admin@example.com").admin(),
    )
    .await;
    let (_, customer) = insert_user_with_auth(
        &db,
        UserFixture::new().email("c@example.com"),
    )
    .await;

    let request = CategoryCreateRequest {
        name: "Outdoor Gear".to_string(),
        slug: None,
        description: String::new(),
        icon: String::new(),
        parent_id: None,
        sort_order: 0,
        is_active: None,
    };

    let err = service.create(&customer, &request).await.expect_err("non-admin");
    assert!(matches!(err, MarketError::Permission { .. }));

    let created = service.create(&admin, &request).await.expect("create");
    assert_eq!(created.data.slug, "outdoor-gear");

    let err = service.create(&admin, &request).await.expect_err("slug conflict");
    assert!(matches!(err, MarketError::Conflict { .. }));

    service
        .delete(&admin, created.data.id)
        .await
        .expect("delete");
    let err = service.get_by_slug("outdoor-gear").await.expect_err("gone");
    assert!(matches!(err, MarketError::NotFound { .. }));
}
