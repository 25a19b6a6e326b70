// SPDX-License-Identifier: MIT

//! Google OAuth authorization-code flow.
//!
//! Builds the consent URL, exchanges the authorization code for tokens,
//! fetches the userinfo profile, and upserts the credential record.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::User;

/// OAuth scopes requested from Google: profile, email, read-only video
/// access, full video management (comment posting).
pub const OAUTH_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/userinfo.profile",
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/youtube.readonly",
    "https://www.googleapis.com/auth/youtube.force-ssl",
];

/// Failure modes of the OAuth callback, distinguished so the route handler
/// can redirect with the matching error code.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("token exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("Google profile has no email address")]
    IncompleteProfile,

    #[error(transparent)]
    Other(#[from] AppError),
}

/// Google OAuth client.
#[derive(Clone)]
pub struct GoogleOAuthService {
    http: reqwest::Client,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
    client_id: String,
    client_secret: String,
    db: FirestoreDb,
    rng: SystemRandom,
}

impl GoogleOAuthService {
    pub fn new(client_id: String, client_secret: String, db: FirestoreDb) -> Self {
        Self {
            http: reqwest::Client::new(),
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
            client_id,
            client_secret,
            db,
            rng: SystemRandom::new(),
        }
    }

    /// Override the Google endpoints (tests point these at a local server).
    pub fn with_endpoints(mut self, token_url: String, userinfo_url: String) -> Self {
        self.token_url = token_url;
        self.userinfo_url = userinfo_url;
        self
    }

    /// Build the consent-screen URL for the given signed state.
    pub fn authorize_url(&self, callback_url: &str, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&state={}",
            self.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(callback_url),
            urlencoding::encode(&OAUTH_SCOPES.join(" ")),
            urlencoding::encode(state),
        )
    }

    /// Handle the OAuth callback: exchange the code, fetch the profile, and
    /// create or update the credential record.
    ///
    /// The record write is a single upsert, so a failed exchange or an
    /// incomplete profile never leaves a half-initialized user behind.
    pub async fn handle_callback(
        &self,
        code: &str,
        callback_url: &str,
    ) -> Result<User, OAuthError> {
        let tokens = self.exchange_code(code, callback_url).await?;
        let profile = self.fetch_profile(&tokens.access_token).await?;

        let email = match profile.email {
            Some(email) if !email.is_empty() => email,
            _ => return Err(OAuthError::IncompleteProfile),
        };

        let now = chrono::Utc::now().to_rfc3339();

        let user = match self.db.find_user_by_google_id(&profile.id).await? {
            Some(mut user) => {
                user.access_token = tokens.access_token;
                // A refresh token is only issued on first consent; never
                // clear a stored one just because this exchange had none.
                if let Some(refresh_token) = tokens.refresh_token {
                    user.refresh_token = Some(refresh_token);
                }
                user.updated_at = now;
                user
            }
            None => User {
                id: self.new_user_id()?,
                google_id: profile.id,
                email,
                name: profile.name,
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
                created_at: now.clone(),
                updated_at: now,
            },
        };

        self.db.upsert_user(&user).await?;

        tracing::info!(user_id = %user.id, email = %user.email, "OAuth callback handled");

        Ok(user)
    }

    /// Exchange an authorization code for tokens.
    async fn exchange_code(
        &self,
        code: &str,
        callback_url: &str,
    ) -> Result<TokenExchangeResponse, OAuthError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", callback_url),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| OAuthError::ExchangeFailed(format!("Token exchange failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Google token exchange failed");
            return Err(OAuthError::ExchangeFailed(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| OAuthError::ExchangeFailed(format!("Failed to parse token response: {}", e)))
    }

    /// Fetch the userinfo profile for a freshly issued access token.
    async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile, OAuthError> {
        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| OAuthError::ExchangeFailed(format!("Userinfo request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(OAuthError::ExchangeFailed(format!(
                "Userinfo request failed with status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| OAuthError::ExchangeFailed(format!("Failed to parse userinfo: {}", e)))
    }

    /// Generate a process-assigned user ID.
    fn new_user_id(&self) -> Result<String, AppError> {
        let mut bytes = [0u8; 16];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}

/// Token exchange response from Google.
#[derive(Debug, Clone, Deserialize)]
struct TokenExchangeResponse {
    access_token: String,
    /// Only present when the consent screen granted offline access.
    refresh_token: Option<String>,
}

/// Userinfo profile fields this application uses.
#[derive(Debug, Clone, Deserialize)]
struct GoogleProfile {
    id: String,
    email: Option<String>,
    name: String,
}
