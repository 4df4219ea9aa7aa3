use axum::Router;
use mock_sso::{app::{build_router, AppState}, config::AppConfig};

pub fn test_config() -> AppConfig {
    AppConfig {
        bind_addr: "127.0.0.1:0".into(),
        public_url: "http://localhost:8000".into(),
        client_id: "test_client_id".into(),
        client_secret: "test_client_secret".into(),
    }
}

/// Returns the state alongside the router so tests can reach into the store
/// (for example to plant an already-expired code).
pub fn build_test_app() -> (AppState, Router) {
    let state = AppState::new(test_config());
    (state.clone(), build_router(state))
}

pub fn form_body(pairs: &[(&str, &str)]) -> String {
    let mut ser = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in pairs {
        ser.append_pair(k, v);
    }
    ser.finish()
}

pub fn query_string(pairs: &[(&str, &str)]) -> String {
    form_body(pairs)
}
