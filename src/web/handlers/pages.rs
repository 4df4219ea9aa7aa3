use axum::{http::StatusCode, response::{Html, IntoResponse}, Json};
use serde::Serialize;

pub async fn index() -> Html<String> {
    Html(include_str!("../../../views/index.html").to_string())
}

#[derive(Serialize)]
struct HealthEndpoints {
    authorize: &'static str,
    token: &'static str,
    userinfo: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    endpoints: HealthEndpoints,
}

/// Liveness probe for the flow driver; reads no state.
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            service: "Mock SSO Server",
            endpoints: HealthEndpoints {
                authorize: "/oauth/authorize",
                token: "/oauth/token",
                userinfo: "/oauth/userinfo",
            },
        }),
    )
}
