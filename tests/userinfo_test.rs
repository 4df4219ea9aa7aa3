use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use time::{Duration, OffsetDateTime};
use tower::ServiceExt; // for oneshot

use mock_sso::models::access_token::AccessToken;

#[path = "common.rs"]
mod common;

async fn json_body(res: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(res.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn missing_bearer_scheme_rejected() {
    let (_state, app) = common::build_test_app();

    let res = app
        .clone()
        .oneshot(Request::get("/oauth/userinfo").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["error"], "invalid_request");

    let res = app
        .oneshot(
            Request::get("/oauth/userinfo")
                .header("authorization", "Token abc123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["error"], "invalid_request");
}

#[tokio::test]
async fn unknown_token_rejected() {
    let (_state, app) = common::build_test_app();

    let res = app
        .oneshot(
            Request::get("/oauth/userinfo")
                .header("authorization", "Bearer not-a-real-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(res).await["error"], "invalid_token");
}

#[tokio::test]
async fn expired_token_rejected() {
    let (state, app) = common::build_test_app();

    state.store.create_token(
        "stale-token".into(),
        AccessToken {
            user_email: "test@company.com".into(),
            expires_at: OffsetDateTime::now_utc() - Duration::seconds(5),
            scope: "aaabbbccc".into(),
        },
    );

    let res = app
        .oneshot(
            Request::get("/oauth/userinfo")
                .header("authorization", "Bearer stale-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(res).await["error"], "invalid_token");
}

#[tokio::test]
async fn valid_token_returns_full_profile() {
    let (state, app) = common::build_test_app();

    state.store.create_token(
        "fresh-token".into(),
        AccessToken {
            user_email: "admin@company.com".into(),
            expires_at: OffsetDateTime::now_utc() + Duration::seconds(3600),
            scope: "aaabbbccc".into(),
        },
    );

    let res = app
        .oneshot(
            Request::get("/oauth/userinfo")
                .header("authorization", "Bearer fresh-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        json_body(res).await,
        serde_json::json!({
            "id": "67890",
            "sub": "67890",
            "name": "Admin User",
            "email": "admin@company.com",
            "company": "Test Company Ltd",
            "username": "admin"
        })
    );
}
