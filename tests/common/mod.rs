// SPDX-License-Identifier: MIT

use replix::config::Config;
use replix::db::FirestoreDb;
use replix::routes::create_router;
use replix::services::{AiService, GoogleOAuthService, YouTubeClient, YouTubeService};
use replix::session::{SessionStore, SESSION_COOKIE};
use replix::AppState;
use std::sync::Arc;

/// Check if the Firestore emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection (emulator).
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock dependencies and real endpoints.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    build_app(test_db_offline(), None)
}

/// Create a test app with offline db, external calls aimed at `upstream`.
#[allow(dead_code)]
pub fn create_test_app_with_upstream(upstream: &str) -> (axum::Router, Arc<AppState>) {
    build_app(test_db_offline(), Some(upstream))
}

/// Create a test app backed by the Firestore emulator, external calls aimed
/// at `upstream`.
#[allow(dead_code)]
pub async fn create_test_app_with_db(upstream: &str) -> (axum::Router, Arc<AppState>) {
    build_app(test_db().await, Some(upstream))
}

fn build_app(db: FirestoreDb, upstream: Option<&str>) -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let sessions = SessionStore::new(config.session_ttl_secs);

    let mut oauth = GoogleOAuthService::new(
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
        db.clone(),
    );
    let mut youtube_client = YouTubeClient::new(
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
    );
    let mut ai = AiService::new(config.openai_api_key.clone());

    if let Some(upstream) = upstream {
        oauth = oauth.with_endpoints(
            format!("{}/token", upstream),
            format!("{}/userinfo", upstream),
        );
        youtube_client = youtube_client.with_endpoints(
            format!("{}/youtube/v3", upstream),
            format!("{}/token", upstream),
        );
        ai = ai.with_base_url(format!("{}/v1", upstream));
    }

    let youtube = YouTubeService::new(youtube_client, db.clone());

    let state = Arc::new(AppState {
        config,
        db,
        sessions,
        oauth,
        youtube,
        ai,
    });

    (create_router(state.clone()), state)
}

/// Create a session for `user_id` and return a Cookie header value for it.
#[allow(dead_code)]
pub fn session_cookie(state: &Arc<AppState>, user_id: &str) -> String {
    let session_id = state
        .sessions
        .create_session(user_id)
        .expect("session creation");
    format!("{}={}", SESSION_COOKIE, session_id)
}
