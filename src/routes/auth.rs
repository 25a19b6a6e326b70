// SPDX-License-Identifier: MIT

//! Google OAuth authentication routes.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{AppError, Result};
use crate::models::user::UserProfile;
use crate::services::OAuthError;
use crate::session::SESSION_COOKIE;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/begin", get(auth_begin))
        .route("/auth/callback", get(auth_callback))
        .route("/auth/logout", get(logout))
        .route("/auth/me", get(me))
}

/// Start OAuth flow - redirect to the Google consent screen.
async fn auth_begin(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> Result<Redirect> {
    let nonce = state.sessions.generate_id()?;

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis();

    // Payload is "nonce|timestamp_hex", signed so the callback can reject a
    // tampered state parameter.
    let state_payload = format!("{}|{:x}", nonce, timestamp);

    let mut mac = HmacSha256::new_from_slice(&state.config.oauth_state_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(state_payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    let signed_state = format!("{}|{}", state_payload, hex::encode(signature));
    let oauth_state = URL_SAFE_NO_PAD.encode(signed_state.as_bytes());

    let callback_url = callback_url_from_headers(&headers);
    let auth_url = state.oauth.authorize_url(&callback_url, &oauth_state);

    tracing::info!(
        client_id = %state.config.google_client_id,
        "Starting OAuth flow, redirecting to Google"
    );

    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code for tokens, upsert the user, create a
/// session, and send the browser back to the frontend.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> (CookieJar, Redirect) {
    let frontend = state.config.frontend_url.clone();
    let login_error = |code: &str| Redirect::temporary(&format!("{}/login?error={}", frontend, code));

    // Errors reported by Google short-circuit the whole flow.
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        return (jar, login_error("authentication_failed"));
    }

    let (code, oauth_state) = match (params.code, params.state) {
        (Some(code), Some(oauth_state)) => (code, oauth_state),
        _ => return (jar, login_error("authentication_failed")),
    };

    if !verify_state(&oauth_state, &state.config.oauth_state_key) {
        tracing::warn!("Invalid or tampered OAuth state parameter");
        return (jar, login_error("authentication_failed"));
    }

    tracing::info!("Exchanging authorization code for tokens");

    let callback_url = callback_url_from_headers(&headers);
    let user = match state.oauth.handle_callback(&code, &callback_url).await {
        Ok(user) => user,
        Err(OAuthError::IncompleteProfile) => {
            tracing::warn!("Google profile missing email");
            return (jar, login_error("no_user"));
        }
        Err(OAuthError::ExchangeFailed(msg)) => {
            tracing::error!(error = %msg, "Authorization code exchange failed");
            return (jar, login_error("authentication_failed"));
        }
        Err(OAuthError::Other(e)) => {
            tracing::error!(error = %e, "OAuth callback failed");
            return (jar, login_error("login_failed"));
        }
    };

    let session_id = match state.sessions.create_session(&user.id) {
        Ok(session_id) => session_id,
        Err(e) => {
            tracing::error!(error = %e, "Session creation failed");
            return (jar, login_error("login_failed"));
        }
    };

    tracing::info!(user_id = %user.id, "OAuth successful, session created");

    let jar = jar.add(session_cookie(&state, session_id));
    (jar, Redirect::temporary(&frontend))
}

/// Logout - destroy the session and clear the cookie. Idempotent.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.destroy_session(cookie.value());
    }

    let jar = jar.add(removal_cookie(&state));
    let frontend = state.config.frontend_url.clone();
    (jar, Redirect::temporary(&frontend))
}

/// Get the current user's profile, 401 when no session resolves.
async fn me(State(state): State<Arc<AppState>>, jar: CookieJar) -> Result<Json<UserProfile>> {
    let session_id = jar.get(SESSION_COOKIE).ok_or(AppError::Unauthorized)?;
    let user_id = state
        .sessions
        .resolve_session(session_id.value())
        .ok_or(AppError::Unauthorized)?;

    let user = state
        .db
        .get_user(&user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(UserProfile::from(&user)))
}

// ─── Cookie helpers ──────────────────────────────────────────

/// Whether cookies must be marked Secure / cross-site for this deployment.
fn cross_site(state: &AppState) -> bool {
    state.config.frontend_url.starts_with("https://")
}

/// Build the session cookie with attributes matching the deployment.
fn session_cookie(state: &AppState, session_id: String) -> Cookie<'static> {
    let secure = cross_site(state);
    let mut cookie = Cookie::new(SESSION_COOKIE, session_id);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(secure);
    // Cross-site frontends need SameSite=None to send the cookie at all.
    cookie.set_same_site(if secure { SameSite::None } else { SameSite::Lax });
    cookie.set_max_age(time::Duration::seconds(state.config.session_ttl_secs));
    cookie
}

/// Removal cookie with the same attributes as creation.
fn removal_cookie(state: &AppState) -> Cookie<'static> {
    let mut cookie = session_cookie(state, String::new());
    cookie.set_max_age(time::Duration::ZERO);
    cookie
}

/// Derive the OAuth callback URL from the request's Host header.
fn callback_url_from_headers(headers: &axum::http::HeaderMap) -> String {
    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| {
            std::env::var("API_HOST").unwrap_or_else(|_| "localhost:3001".to_string())
        });

    let scheme = if host.contains("localhost") || host.contains("127.0.0.1") {
        "http"
    } else {
        "https"
    };

    format!("{}://{}/auth/callback", scheme, host)
}

/// Verify the HMAC signature on the OAuth state parameter.
fn verify_state(state: &str, secret: &[u8]) -> bool {
    let Ok(bytes) = URL_SAFE_NO_PAD.decode(state) else {
        return false;
    };
    let Ok(state_str) = String::from_utf8(bytes) else {
        return false;
    };

    // Format is "nonce|timestamp_hex|signature_hex"
    let parts: Vec<&str> = state_str.splitn(3, '|').collect();
    if parts.len() != 3 {
        return false;
    }

    let payload = format!("{}|{}", parts[0], parts[1]);
    let Ok(signature) = hex::decode(parts[2]) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return false;
    }

    true
}
