use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt; // for oneshot

#[path = "common.rs"]
mod common;

#[tokio::test]
async fn health_ok() {
    let (_state, app) = common::build_test_app();

    let res = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = to_bytes(res.into_body(), 1024 * 1024).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["endpoints"]["authorize"], "/oauth/authorize");
    assert_eq!(json["endpoints"]["token"], "/oauth/token");
    assert_eq!(json["endpoints"]["userinfo"], "/oauth/userinfo");
}

#[tokio::test]
async fn index_lists_users_and_endpoints() {
    let (_state, app) = common::build_test_app();

    let res = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = to_bytes(res.into_body(), 1024 * 1024).await.unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("Mock SSO Server"));
    assert!(html.contains("test@company.com"));
    assert!(html.contains("/oauth/authorize"));
}
