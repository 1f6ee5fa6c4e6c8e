//! Integration tests for bearer attachment and token refresh
use futures::future::join_all;
use mockito::Matcher;
use serde_json::json;

use alacena::navigation::AUTH_SCREEN;
use alacena::AlacenaError;

use crate::test_harness::{expired_token, fresh_token, product_json, TestEnvironment};

#[tokio::test]
async fn test_valid_token_is_attached() {
    let mut env = TestEnvironment::new().await;
    let access = fresh_token("ana");
    env.sign_in(&access, "refresh-1").await;

    let refresh = env.mock_refresh("refresh-1", 200, json!({}), 0).await;
    let products = env
        .mock_products(
            &access,
            json!([product_json("p-1", "Leche", "dairy", "2025-08-30")]),
            1,
        )
        .await;

    let listed = env.api.products().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].unit_label(), "litros");

    products.assert_async().await;
    refresh.assert_async().await;
}

#[tokio::test]
async fn test_expired_token_is_refreshed_once() {
    let mut env = TestEnvironment::new().await;
    let renewed = fresh_token("ana-renewed");
    env.sign_in(&expired_token("ana"), "refresh-1").await;

    let refresh = env
        .mock_refresh("refresh-1", 200, json!({ "access": renewed }), 1)
        .await;
    let products = env.mock_products(&renewed, json!([]), 2).await;

    assert!(env.api.products().await.unwrap().is_empty());
    // The renewed token is reused without another refresh
    assert!(env.api.products().await.unwrap().is_empty());

    assert_eq!(env.stored("access").await.as_deref(), Some(renewed.as_str()));
    assert_eq!(env.stored("refresh").await.as_deref(), Some("refresh-1"));
    assert!(env.navigator.calls().is_empty());

    refresh.assert_async().await;
    products.assert_async().await;
}

#[tokio::test]
async fn test_concurrent_requests_share_one_refresh() {
    let mut env = TestEnvironment::new().await;
    let renewed = fresh_token("ana-renewed");
    env.sign_in(&expired_token("ana"), "refresh-1").await;

    let refresh = env
        .mock_refresh("refresh-1", 200, json!({ "access": renewed }), 1)
        .await;
    let products = env.mock_products(&renewed, json!([]), 5).await;

    let api = &env.api;
    let results = join_all((0..5).map(|_| api.products())).await;
    assert!(results.iter().all(Result::is_ok));

    refresh.assert_async().await;
    products.assert_async().await;
}

#[tokio::test]
async fn test_rejected_refresh_signs_out() {
    let mut env = TestEnvironment::new().await;
    env.sign_in(&expired_token("ana"), "refresh-stale").await;

    let refresh = env
        .mock_refresh(
            "refresh-stale",
            401,
            json!({ "detail": "Token is invalid or expired" }),
            1,
        )
        .await;
    let products = env
        .server
        .mock("GET", "/api/products/")
        .expect(0)
        .create_async()
        .await;

    let err = env.api.products().await.unwrap_err();
    assert!(matches!(err, AlacenaError::RefreshFailed { .. }), "{err:?}");
    assert!(err.category().forces_logout());

    assert_eq!(env.stored("access").await, None);
    assert_eq!(env.stored("refresh").await, None);
    assert_eq!(env.navigator.count(AUTH_SCREEN), 1);

    refresh.assert_async().await;
    products.assert_async().await;
}

#[tokio::test]
async fn test_concurrent_failures_sign_out_once() {
    let mut env = TestEnvironment::new().await;
    env.sign_in(&expired_token("ana"), "refresh-stale").await;

    let refresh = env
        .mock_refresh("refresh-stale", 401, json!({ "detail": "blacklisted" }), 1)
        .await;

    let api = &env.api;
    let results = join_all((0..4).map(|_| api.products())).await;
    assert!(results.iter().all(Result::is_err));
    assert_eq!(env.navigator.count(AUTH_SCREEN), 1);

    refresh.assert_async().await;
}

#[tokio::test]
async fn test_garbled_refresh_response_signs_out() {
    let mut env = TestEnvironment::new().await;
    env.sign_in(&expired_token("ana"), "refresh-1").await;

    let refresh = env
        .server
        .mock("POST", "/api/token/refresh/")
        .with_status(200)
        .with_body("<html>gateway</html>")
        .expect(1)
        .create_async()
        .await;

    let err = env.api.products().await.unwrap_err();
    assert!(matches!(err, AlacenaError::RefreshFailed { .. }));
    assert_eq!(env.navigator.count(AUTH_SCREEN), 1);

    refresh.assert_async().await;
}

#[tokio::test]
async fn test_login_bypasses_authentication() {
    let mut env = TestEnvironment::new().await;
    // A stale session must not trigger a refresh on the login route
    env.sign_in(&expired_token("old"), "refresh-old").await;

    let refresh = env.mock_refresh("refresh-old", 200, json!({}), 0).await;
    let access = fresh_token("ana");
    let login = env
        .server
        .mock("POST", "/api/login/")
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::Json(json!({ "username": "ana", "password": "secreto" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "access": access, "refresh": "refresh-new" }).to_string())
        .expect(1)
        .create_async()
        .await;

    env.api.login("ana", "secreto").await.unwrap();

    assert_eq!(env.stored("access").await.as_deref(), Some(access.as_str()));
    assert_eq!(env.stored("refresh").await.as_deref(), Some("refresh-new"));
    assert!(env.navigator.calls().is_empty());

    login.assert_async().await;
    refresh.assert_async().await;
}

#[tokio::test]
async fn test_login_bypass_under_path_prefix() {
    let mut env = TestEnvironment::mounted_at("/v1").await;
    let access = fresh_token("ana");
    let login = env
        .server
        .mock("POST", "/v1/api/login/")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "access": access, "refresh": "refresh-1" }).to_string())
        .expect(1)
        .create_async()
        .await;
    let products = env
        .server
        .mock("GET", "/v1/api/products/")
        .match_header("authorization", format!("Bearer {access}").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "results": [] }).to_string())
        .expect(1)
        .create_async()
        .await;

    env.api.login("ana", "secreto").await.unwrap();
    assert!(env.api.products().await.unwrap().is_empty());

    assert_eq!(env.stored("access").await.as_deref(), Some(access.as_str()));
    assert!(env.navigator.calls().is_empty());

    login.assert_async().await;
    products.assert_async().await;
}
