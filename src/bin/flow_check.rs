//! Drives the OAuth 2.0 authorization-code flow end-to-end against a running
//! mock SSO server, and optionally probes a downstream application for its
//! SSO configuration. Each stage reports pass/fail on its own; a stage that
//! depends on an earlier failure is skipped.

use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use serde::Deserialize;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "sso-flow-check", about = "Exercises the mock SSO server's OAuth flow")]
struct Args {
    /// Base URL of the mock SSO server
    #[arg(long, env = "SSO_BASE_URL", default_value = "http://localhost:8000")]
    sso_base_url: String,

    /// Base URL of the downstream application; skips that stage when unset
    #[arg(long, env = "APP_BASE_URL")]
    app_base_url: Option<String>,

    #[arg(long, env = "SSO_CLIENT_ID", default_value = "test_client_id")]
    client_id: String,

    #[arg(long, env = "SSO_CLIENT_SECRET", default_value = "test_client_secret")]
    client_secret: String,

    /// Redirect URI registered with the downstream application
    #[arg(long, default_value = "http://localhost:5001/console/api/oauth/authorize/sso")]
    redirect_uri: String,

    /// Seeded user to authorize as
    #[arg(long, default_value = "test@company.com")]
    user_email: String,
}

const STATE: &str = "test_state_12345";
const SCOPE: &str = "openid email profile";

#[derive(Debug, Deserialize)]
struct TokenBody {
    access_token: String,
    token_type: String,
    expires_in: i64,
    #[allow(dead_code)]
    scope: String,
}

#[derive(Debug, Deserialize)]
struct UserInfoBody {
    id: String,
    name: String,
    email: String,
    company: String,
}

#[derive(Debug, Deserialize)]
struct SystemFeatures {
    #[serde(default)]
    enable_custom_sso: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Redirects stay unfollowed so the authorize 302 can be inspected.
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(10))
        .build()?;

    let mut results: Vec<(&str, bool)> = Vec::new();

    let healthy = report(&mut results, "health", check_health(&client, &args).await);

    let form_ok = report(&mut results, "authorize form", check_authorize_form(&client, &args).await);

    if healthy && form_ok {
        report(&mut results, "oauth flow", run_oauth_flow(&client, &args).await);
    } else {
        println!("SKIP oauth flow (earlier stage failed)");
        results.push(("oauth flow", false));
    }

    if let Some(app_base_url) = &args.app_base_url {
        report(
            &mut results,
            "downstream system features",
            check_system_features(&client, app_base_url).await,
        );
    }

    let passed = results.iter().filter(|(_, ok)| *ok).count();
    println!("\n{passed}/{} stages passed", results.len());
    if passed != results.len() {
        std::process::exit(1);
    }
    Ok(())
}

fn report(results: &mut Vec<(&'static str, bool)>, name: &'static str, outcome: anyhow::Result<()>) -> bool {
    let ok = match outcome {
        Ok(()) => {
            println!("PASS {name}");
            true
        }
        Err(e) => {
            println!("FAIL {name}: {e:#}");
            false
        }
    };
    results.push((name, ok));
    ok
}

async fn check_health(client: &reqwest::Client, args: &Args) -> anyhow::Result<()> {
    let resp = client
        .get(format!("{}/health", args.sso_base_url))
        .send()
        .await
        .context("mock SSO server not reachable")?;
    if resp.status() != 200 {
        bail!("unexpected status {}", resp.status());
    }
    let body: serde_json::Value = resp.json().await?;
    if body["status"] != "ok" {
        bail!("health body was {body}");
    }
    Ok(())
}

async fn check_authorize_form(client: &reqwest::Client, args: &Args) -> anyhow::Result<()> {
    let resp = client
        .get(format!("{}/oauth/authorize", args.sso_base_url))
        .query(&[
            ("client_id", args.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", args.redirect_uri.as_str()),
            ("state", STATE),
            ("scope", SCOPE),
        ])
        .send()
        .await?;
    if resp.status() != 200 {
        bail!("unexpected status {}", resp.status());
    }
    let body = resp.text().await?;
    if !body.contains("Select Test User") {
        bail!("login form not rendered");
    }
    if !body.contains("test@company.com") || !body.contains("admin@company.com") {
        bail!("seeded users missing from form");
    }
    Ok(())
}

async fn run_oauth_flow(client: &reqwest::Client, args: &Args) -> anyhow::Result<()> {
    // User selection, in place of a browser submitting the form
    let resp = client
        .post(format!("{}/oauth/authorize", args.sso_base_url))
        .form(&[
            ("client_id", args.client_id.as_str()),
            ("redirect_uri", args.redirect_uri.as_str()),
            ("response_type", "code"),
            ("state", STATE),
            ("scope", SCOPE),
            ("user_email", args.user_email.as_str()),
        ])
        .send()
        .await?;
    if resp.status() != 302 {
        bail!("authorize submission returned {}", resp.status());
    }
    let location = resp
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .context("redirect without Location header")?;
    let url = Url::parse(location).context("unparseable Location header")?;

    let mut code = None;
    let mut state = None;
    for (k, v) in url.query_pairs() {
        match k.as_ref() {
            "code" => code = Some(v.into_owned()),
            "state" => state = Some(v.into_owned()),
            _ => {}
        }
    }
    let code = code.context("no authorization code in redirect")?;
    if state.as_deref() != Some(STATE) {
        bail!("state came back as {state:?}");
    }
    println!("  received authorization code ({}... )", &code[..8.min(code.len())]);

    // Code for token
    let resp = client
        .post(format!("{}/oauth/token", args.sso_base_url))
        .form(&[
            ("client_id", args.client_id.as_str()),
            ("client_secret", args.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", args.redirect_uri.as_str()),
        ])
        .send()
        .await?;
    if resp.status() != 200 {
        bail!("token exchange returned {}: {}", resp.status(), resp.text().await?);
    }
    let token: TokenBody = resp.json().await?;
    if token.token_type != "Bearer" {
        bail!("token_type was {}", token.token_type);
    }
    println!("  received access token (expires in {}s)", token.expires_in);

    // Token for profile
    let resp = client
        .get(format!("{}/oauth/userinfo", args.sso_base_url))
        .bearer_auth(&token.access_token)
        .send()
        .await?;
    if resp.status() != 200 {
        bail!("userinfo returned {}: {}", resp.status(), resp.text().await?);
    }
    let user: UserInfoBody = resp.json().await?;
    if user.email != args.user_email {
        bail!("userinfo email {} does not match selected user", user.email);
    }
    println!("  userinfo: {} <{}> ({}, id {})", user.name, user.email, user.company, user.id);
    Ok(())
}

async fn check_system_features(client: &reqwest::Client, app_base_url: &str) -> anyhow::Result<()> {
    let resp = client
        .get(format!("{app_base_url}/console/api/system-features"))
        .send()
        .await
        .context("downstream application not reachable")?;
    if resp.status() != 200 {
        bail!("unexpected status {}", resp.status());
    }
    let features: SystemFeatures = resp.json().await?;
    if !features.enable_custom_sso {
        bail!("custom SSO is not enabled downstream");
    }
    Ok(())
}
