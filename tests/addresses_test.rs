//! 地址服务集成测试

use market_api::{
    MarketError,
    services::{AddressesService, addresses::AddressRequest},
    testing::{UserFixture, insert_user_with_auth, setup_test_db},
};
use pretty_assertions::assert_eq;

fn address_request(name: &str, is_default: bool) -> AddressRequest {
    AddressRequest {
        full_name: name.to_string(),
        phone: "555-0100".to_string(),
        address_line1: "1 Main St".to_string(),
        address_line2: String::new(),
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        postal_code: "62701".to_string(),
        country: "US".to_string(),
        address_type: None,
        is_default,
    }
}

#[tokio::test]
async fn test_single_default_per_type() {
    let db = setup_test_db().await;
    let service = AddressesService::new(&db);
    let (_, auth) = insert_user_with_auth(&db, UserFixture::new()).await;

    service
        .create(&auth, &address_request("First", true))
        .await
        .expect("create first");
    service
        .create(&auth, &address_request("Second", true))
        .await
        .expect("create second");

    let addresses = service.list(&auth).await.expect("list");
    assert_eq!(addresses.len(), 2);
    let defaults: Vec<_> = addresses.iter().filter(|a| a.is_default).collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].full_name, "Second");
}

#[tokio::test]
async fn test_default_is_scoped_by_type() {
    let db = setup_test_db().await;
    let service = AddressesService::new(&db);
    let (_, auth) = insert_user_with_auth(&db, UserFixture::new()).await;

    service
        .create(&auth, &address_request("Ship", true))
        .await
        .expect("create shipping");
    let mut billing = address_request("Bill", true);
    billing.address_type = Some("billing".to_string());
    service.create(&auth, &billing).await.expect("create billing");

    // 两种类型各自保留一个默认
    let addresses = service.list(&auth).await.expect("list");
    assert_eq!(addresses.iter().filter(|a| a.is_default).count(), 2);
}

#[tokio::test]
async fn test_foreign_address_reports_not_found() {
    let db = setup_test_db().await;
    let service = AddressesService::new(&db);
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

    let created = service
        .create(&owner, &address_request("Mine", false))
        .await
        .expect("create");

    let err = service
        .get(&other, created.data.id)
        .await
        .expect_err("foreign access");
    assert!(matches!(err, MarketError::NotFound { .. }));

    let err = service
        .delete(&other, created.data.id)
        .await
        .expect_err("foreign delete");
    assert!(matches!(err, MarketError::NotFound { .. }));
}

#[tokio::test]
async fn test_invalid_address_type_rejected() {
    let db = setup_test_db().await;
    let service = AddressesService::new(&db);
    let (_, auth) = insert_user_with_auth(&db, UserFixture::new()).await;

    let mut request = address_request("Bad", false);
    request.address_type = Some("warehouse".to_string());
    let err = service.create(&auth, &request).await.expect_err("bad type");
    assert!(matches!(err, MarketError::Validation { .. }));
}

#[tokio::test]
async fn test_full_address_rendering() {
    let db = setup_test_db().await;
    let service = AddressesService::new(&db);
    let (_, auth) = insert_user_with_auth(&db, UserFixture::new()).await;

    let created = service
        .create(&auth, &address_request("Render", false))
        .await
        .expect("create");
    assert_eq!(
        created.data.full_address,
        "1 Main St, Springfield, IL, 62701, US"
    );
}
