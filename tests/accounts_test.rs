//! 账户服务集成测试

use std::sync::Arc;

use market_api::{
    MarketError,
    auth::{AuthConfig, AuthContext, JwtManager, UserRole},
    services::{
        AccountsService,
        accounts::{ChangePasswordRequest, LoginRequest, RegisterRequest, UserQuery},
    },
    testing::{UserFixture, insert_user, insert_user_with_auth, setup_test_db},
};
use pretty_assertions::assert_eq;

fn jwt_manager() -> JwtManager {
    JwtManager::new(Arc::new(AuthConfig::default())).expect("create jwt manager")
}

fn register_request(email: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        password: "password123".to_string(),
        password2: "password123".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        phone: None,
        role: None,
    }
}

#[tokio::test]
async fn test_register_and_login() {
    let db = setup_test_db().await;
    let jwt = jwt_manager();
    let service = AccountsService::new(&db, &jwt);

    let response = service
        .register(&register_request("Ada@Example.com"))
        .await
        .expect("register");
    // 邮箱归一化为小写
    assert_eq!(response.user.email, "ada@example.com");
    assert_eq!(response.user.role, "customer");
    assert_eq!(response.user.full_name, "Ada Lovelace");

    let login = service
        .login(&LoginRequest {
            email: "ada@example.com".to_string(),
            password: "password123".to_string(),
        })
        .await
        .expect("login");
    assert!(!login.tokens.access_token.is_empty());
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let db = setup_test_db().await;
    let jwt = jwt_manager();
    let service = AccountsService::new(&db, &jwt);

    service
        .register(&register_request("dup@example.com"))
        .await
        .expect("first register");
    let err = service
        .register(&register_request("dup@example.com"))
        .await
        .expect_err("duplicate register");
    assert!(matches!(err, MarketError::Conflict { .. }));
}

#[tokio::test]
async fn test_register_password_mismatch() {
    let db = setup_test_db().await;
    let jwt = jwt_manager();
    let service = AccountsService::new(&db, &jwt);

    let mut request = register_request("mismatch@example.com");
    request.password2 = "different456".to_string();
    let err = service.register(&request).await.expect_err("mismatch");
    assert!(matches!(
        err,
        MarketError::Validation { field: Some(ref f), .. } if f == "password"
    ));
}

#[tokio::test]
async fn test_login_wrong_password_is_generic() {
    let db = setup_test_db().await;
    let jwt = jwt_manager();
    let service = AccountsService::new(&db, &jwt);

    service
        .register(&register_request("user@example.com"))
        .await
        .expect("register");

    // 未知邮箱与错误密码返回同一句提示
    for (email, password) in [
        ("user@example.com", "wrong-password"),
        ("nobody@example.com", "password123"),
    ] {
        let err = service
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await
            .expect_err("login should fail");
        match err {
            MarketError::Auth { message, .. } => {
                assert_eq!(message, "Invalid email or password");
            }
            other => panic!("expected auth error, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_login_disabled_account() {
    let db = setup_test_db().await;
    let jwt = jwt_manager();
    let service = AccountsService::new(&db, &jwt);

    insert_user(
        &db,
        UserFixture::new().email("off@example.com").inactive(),
    )
    .await;

    let err = service
        .login(&LoginRequest {
            email: "off@example.com".to_string(),
            password: "password123".to_string(),
        })
        .await
        .expect_err("disabled login");
    assert!(matches!(err, MarketError::Auth { .. }));
}

#[tokio::test]
async fn test_change_password_requires_current() {
    let db = setup_test_db().await;
    let jwt = jwt_manager();
    let service = AccountsService::new(&db, &jwt);

    let registered = service
        .register(&register_request("pw@example.com"))
        .await
        .expect("register");
    let auth = AuthContext::new(registered.user.id, UserRole::Customer);

    let err = service
        .change_password(
            &auth,
            &ChangePasswordRequest {
                old_password: "wrong-old".to_string(),
                new_password: "newpassword1".to_string(),
                new_password2: "newpassword1".to_string(),
            },
        )
        .await
        .expect_err("wrong current password");
    assert!(matches!(err, MarketError::Auth { .. }));

    service
        .change_password(
            &auth,
            &ChangePasswordRequest {
                old_password: "password123".to_string(),
                new_password: "newpassword1".to_string(),
                new_password2: "newpassword1".to_string(),
            },
        )
        .await
        .expect("change password");

    service
        .login(&LoginRequest {
            email: "pw@example.com".to_string(),
            password: "newpassword1".to_string(),
        })
        .await
        .expect("login with new password");
}

#[tokio::test]
async fn test_admin_list_filters_and_permissions() {
    let db = setup_test_db().await;
    let jwt = jwt_manager();
    let service = AccountsService::new(&db, &jwt);

    let (_, admin) = insert_user_with_auth(
        &db,
        UserFixture::new().email("admin@example.com").admin(),
    )
    .await;
    let (_, customer) = insert_user_with_auth(
        &db,
        UserFixture::new().email("c1@example.com"),
    )
    .await;
    insert_user(
        &db,
        UserFixture::new().email("v1@example.com").role(UserRole::Vendor),
    )
    .await;
    insert_user(
        &db,
        UserFixture::new().email("c2@example.com").inactive(),
    )
    .await;

    let err = service
        .list(&customer, &UserQuery::default())
        .await
        .expect_err("customer cannot list users");
    assert!(matches!(err, MarketError::Permission { .. }));

    let all = service
        .list(&admin, &UserQuery::default())
        .await
        .expect("list all");
    assert_eq!(all.pagination.total, 4);

    let vendors_only = service
        .list(
            &admin,
            &UserQuery {
                role: Some("vendor".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("list vendors");
    assert_eq!(vendors_only.pagination.total, 1);

    let inactive = service
        .list(
            &admin,
            &UserQuery {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .expect("list inactive");
    assert_eq!(inactive.pagination.total, 1);
}

#[tokio::test]
async fn test_admin_cannot_deactivate_self() {
    let db = setup_test_db().await;
    let jwt = jwt_manager();
    let service = AccountsService::new(&db, &jwt);

    let (admin_user, admin) = insert_user_with_auth(
        &db,
        UserFixture::new().email("admin@example.com").admin(),
    )
    .await;

    let err = service
        .deactivate(&admin, admin_user.id)
        .await
        .expect_err("self deactivation");
    assert!(matches!(err, MarketError::Business { .. }));
}

#[tokio::test]
async fn test_refresh_issues_new_token_pair() {
    let db = setup_test_db().await;
    let jwt = jwt_manager();
    let service = AccountsService::new(&db, &jwt);

    let registered = service
        .register(&register_request("ada@example.com"))
        .await
        .expect("register");

    let pair = service
        .refresh(&registered.tokens.refresh_token)
        .await
        .expect("refresh");
    assert!(jwt.validate_token(&pair.access_token).is_ok());
    assert!(jwt.validate_token(&pair.refresh_token).is_ok());
}

#[tokio::test]
async fn test_logout_blocks_refresh_token_reuse() {
    let db = setup_test_db().await;
    let jwt = jwt_manager();
    let service = AccountsService::new(&db, &jwt);

    let registered = service
        .register(&register_request("ada@example.com"))
        .await
        .expect("register");
    let refresh_token = registered.tokens.refresh_token;

    // 登出前刷新令牌可用
    service
        .refresh(&refresh_token)
        .await
        .expect("refresh before logout");

    service.logout(&refresh_token).await.expect("logout");
    // 重复登出幂等
    service.logout(&refresh_token).await.expect("second logout");

    let err = service
        .refresh(&refresh_token)
        .await
        .expect_err("refresh after logout");
    assert!(matches!(err, MarketError::Auth { .. }));
}

#[tokio::test]
async fn test_logout_rejects_malformed_token() {
    let db = setup_test_db().await;
    let jwt = jwt_manager();
    let service = AccountsService::new(&db, &jwt);

    let err = service
        .logout("not-a-token")
        .await
        .expect_err("logout with garbage");
    assert!(matches!(err, MarketError::Auth { .. }));
}
