use axum::{
    extract::{Form, Query, State},
    http::{HeaderMap, StatusCode, header::{AUTHORIZATION, LOCATION}},
    response::{Html, IntoResponse, Response},
    Json,
};
use base64::Engine as _;
use rand::RngCore;
use serde::Deserialize;
use serde_json::json;
use time::{Duration, OffsetDateTime};
use url::Url;

use crate::{
    app::AppState,
    models::{access_token::AccessToken, oauth_code::AuthorizationCode, user::UserRecord},
};

const AUTH_CODE_TTL_SECONDS: i64 = 600;
const ACCESS_TOKEN_TTL_SECONDS: i64 = 3600;
const TOKEN_SCOPE: &str = "aaabbbccc";

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub response_type: Option<String>,
    pub state: Option<String>,
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeForm {
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub response_type: Option<String>,
    pub state: Option<String>,
    pub scope: Option<String>,
    pub user_email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub grant_type: Option<String>,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub scope: String,
}

pub async fn authorize_get(
    State(state): State<AppState>,
    Query(q): Query<AuthorizeQuery>,
) -> Response {
    let ctx = match validate_authorize(&state, &q) {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };

    tracing::info!(client_id = %ctx.client_id, redirect_uri = %ctx.redirect_uri, "authorization request");

    let users = state.store.list_users();
    Html(render_login_page(&ctx, &users)).into_response()
}

pub async fn authorize_post(
    State(state): State<AppState>,
    Form(form): Form<AuthorizeForm>,
) -> Response {
    let q = AuthorizeQuery {
        client_id: form.client_id.clone(),
        redirect_uri: form.redirect_uri.clone(),
        response_type: form.response_type.clone(),
        state: form.state.clone(),
        scope: form.scope.clone(),
    };
    let ctx = match validate_authorize(&state, &q) {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };

    let user = match form.user_email.as_deref().and_then(|e| state.store.find_user(e)) {
        Some(user) => user,
        None => {
            tracing::warn!(user_email = ?form.user_email, "unknown user selected");
            return error_json(StatusCode::BAD_REQUEST, "invalid_request");
        }
    };

    let code = generate_token(32);
    let now = OffsetDateTime::now_utc();
    state.store.create_code(
        code.clone(),
        AuthorizationCode {
            client_id: ctx.client_id.clone(),
            redirect_uri: ctx.redirect_uri.clone(),
            user_email: user.email.clone(),
            expires_at: now + Duration::seconds(AUTH_CODE_TTL_SECONDS),
            used: false,
        },
    );

    tracing::info!(user_email = %user.email, "issued authorization code");

    build_redirect_response(&ctx.redirect_uri, vec![
        ("code".to_string(), code),
        ("state".to_string(), ctx.state.clone().unwrap_or_default()),
    ])
}

pub async fn token(
    State(state): State<AppState>,
    Form(req): Form<TokenRequest>,
) -> Response {
    if req.grant_type.as_deref() != Some("authorization_code") {
        tracing::warn!(grant_type = ?req.grant_type, "unsupported grant type");
        return error_json(StatusCode::BAD_REQUEST, "unsupported_grant_type");
    }

    let client_id = req.client_id.unwrap_or_default();
    let client_secret = req.client_secret.unwrap_or_default();
    if client_id != state.config.client_id || client_secret != state.config.client_secret {
        tracing::warn!(%client_id, "client authentication failed");
        return error_json(StatusCode::UNAUTHORIZED, "invalid_client");
    }

    let Some(code) = req.code else {
        return error_json(StatusCode::BAD_REQUEST, "invalid_grant");
    };
    let redirect_uri = req.redirect_uri.unwrap_or_default();

    let now = OffsetDateTime::now_utc();
    let code_row = match state.store.redeem_code(&code, &client_id, &redirect_uri, now) {
        Ok(row) => row,
        Err(err) => {
            tracing::warn!(reason = ?err, "code redemption refused");
            return error_json(StatusCode::BAD_REQUEST, "invalid_grant");
        }
    };

    let access_token = generate_token(64);
    state.store.create_token(
        access_token.clone(),
        AccessToken {
            user_email: code_row.user_email.clone(),
            expires_at: now + Duration::seconds(ACCESS_TOKEN_TTL_SECONDS),
            scope: TOKEN_SCOPE.to_string(),
        },
    );

    tracing::info!(user_email = %code_row.user_email, "issued access token");

    Json(TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: ACCESS_TOKEN_TTL_SECONDS,
        scope: TOKEN_SCOPE.to_string(),
    })
    .into_response()
}

pub async fn userinfo(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let Some(access_token) = bearer else {
        return error_json(StatusCode::BAD_REQUEST, "invalid_request");
    };

    let Some(token_row) = state.store.get_token(access_token) else {
        return error_json(StatusCode::UNAUTHORIZED, "invalid_token");
    };

    if token_row.is_expired(OffsetDateTime::now_utc()) {
        tracing::debug!("expired access token presented");
        return error_json(StatusCode::UNAUTHORIZED, "invalid_token");
    }

    // Can only fail if the seed data changed underneath us; treated the same
    // as an unknown token.
    let Some(user) = state.store.find_user(&token_row.user_email) else {
        return error_json(StatusCode::UNAUTHORIZED, "invalid_token");
    };

    tracing::info!(user_email = %user.email, "userinfo lookup");
    Json(user).into_response()
}

struct AuthorizeContext {
    client_id: String,
    redirect_uri: String,
    response_type: String,
    state: Option<String>,
    scope: Option<String>,
}

fn validate_authorize(state: &AppState, q: &AuthorizeQuery) -> Result<AuthorizeContext, Response> {
    let (Some(client_id), Some(redirect_uri)) = (q.client_id.clone(), q.redirect_uri.clone())
    else {
        return Err(error_json(StatusCode::BAD_REQUEST, "invalid_request"));
    };

    if client_id != state.config.client_id {
        tracing::warn!(%client_id, "unknown client on authorize");
        return Err(error_json(StatusCode::BAD_REQUEST, "invalid_client"));
    }

    // Absent response_type is treated as the one supported value.
    let response_type = q.response_type.clone().unwrap_or_else(|| "code".to_string());
    if response_type != "code" {
        return Err(error_json(StatusCode::BAD_REQUEST, "unsupported_response_type"));
    }

    Ok(AuthorizeContext {
        client_id,
        redirect_uri,
        response_type,
        state: q.state.clone(),
        scope: q.scope.clone(),
    })
}

/// 302 with `params` appended to the redirect URI. Empty values are
/// dropped, so an absent `state` never shows up in the callback.
fn build_redirect_response(redirect_uri: &str, params: Vec<(String, String)>) -> Response {
    let Ok(mut url) = Url::parse(redirect_uri) else {
        return error_json(StatusCode::BAD_REQUEST, "invalid_request");
    };
    {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in params {
            if !v.is_empty() {
                pairs.append_pair(&k, &v);
            }
        }
    }
    (StatusCode::FOUND, [(LOCATION, url.to_string())]).into_response()
}

fn error_json(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({ "error": error }))).into_response()
}

fn generate_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf)
}

fn render_login_page(ctx: &AuthorizeContext, users: &[UserRecord]) -> String {
    let client_id = escape_html(&ctx.client_id);
    let redirect_uri = escape_html(&ctx.redirect_uri);
    let response_type = escape_html(&ctx.response_type);
    let state_value = escape_html(&ctx.state.clone().unwrap_or_default());
    let scope_value = escape_html(&ctx.scope.clone().unwrap_or_default());

    let options: String = users
        .iter()
        .map(|u| {
            format!(
                r#"<option value="{email}">{email} ({name})</option>"#,
                email = escape_html(&u.email),
                name = escape_html(&u.name),
            )
        })
        .collect();

    format!(
        r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>Mock SSO Login</title>
  <style>
    body {{ font-family: system-ui, -apple-system, Segoe UI, Roboto, Ubuntu, Cantarell, Noto Sans, Helvetica, Arial, sans-serif; max-width: 560px; margin: 10vh auto; padding: 24px; }}
    .info {{ background: #f0f8ff; padding: 15px; border-left: 4px solid #007cba; margin: 20px 0; }}
    label {{ display: block; margin-bottom: 5px; font-weight: bold; }}
    select, button {{ width: 100%; padding: 10px; font-size: 16px; }}
    button {{ background: #007cba; color: white; border: none; cursor: pointer; margin-top: 20px; }}
  </style>
</head>
<body>
  <h2>Mock SSO Server - Login</h2>
  <div class="info">
    Client ID: {client_id}<br>
    Redirect URI: {redirect_uri}
  </div>
  <form method="post" action="/oauth/authorize">
    <input type="hidden" name="client_id" value="{client_id}" />
    <input type="hidden" name="redirect_uri" value="{redirect_uri}" />
    <input type="hidden" name="response_type" value="{response_type}" />
    <input type="hidden" name="state" value="{state}" />
    <input type="hidden" name="scope" value="{scope}" />
    <label for="user_email">Select Test User:</label>
    <select name="user_email" id="user_email" required>
      <option value="">-- Select a user --</option>
      {options}
    </select>
    <button type="submit">Login &amp; Authorize</button>
  </form>
  <div class="info">
    This is a mock server for integration testing. In production, users
    would enter real credentials here.
  </div>
</body>
</html>"#,
        client_id = client_id,
        redirect_uri = redirect_uri,
        response_type = response_type,
        state = state_value,
        scope = scope_value,
        options = options,
    )
}

pub(crate) fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_html_neutralizes_markup() {
        assert_eq!(
            escape_html(r#"<a href="x">&'"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;"
        );
    }

    #[test]
    fn generated_tokens_are_url_safe_and_distinct() {
        let a = generate_token(32);
        let b = generate_token(32);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
