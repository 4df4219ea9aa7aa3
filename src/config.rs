use std::env;

/// Runtime configuration, read once at startup.
///
/// Every key has a default matching the values the flow driver and the
/// downstream application are wired for, so a bare `cargo run` works without
/// any environment setup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub public_url: String,
    pub client_id: String,
    pub client_secret: String,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        Ok(Self {
            bind_addr: env_or("SSO_BIND_ADDR", "0.0.0.0:8000"),
            public_url: env_or("SSO_PUBLIC_URL", "http://localhost:8000"),
            client_id: env_or("SSO_CLIENT_ID", "test_client_id"),
            client_secret: env_or("SSO_CLIENT_SECRET", "test_client_secret"),
        })
    }
}
