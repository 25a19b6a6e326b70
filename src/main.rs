// SPDX-License-Identifier: MIT

//! RepliX API Server
//!
//! Lets a YouTube channel owner sign in with Google, browse their videos and
//! comments, and post AI-assisted replies.

use replix::{
    config::Config,
    db::FirestoreDb,
    services::{AiService, GoogleOAuthService, YouTubeClient, YouTubeService},
    session::SessionStore,
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired sessions are swept out of the store.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting RepliX API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Session store with rolling expiry
    let sessions = SessionStore::new(config.session_ttl_secs);

    // OAuth exchange and YouTube gateway share the same client credentials
    let oauth = GoogleOAuthService::new(
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
        db.clone(),
    );
    let youtube = YouTubeService::new(
        YouTubeClient::new(
            config.google_client_id.clone(),
            config.google_client_secret.clone(),
        ),
        db.clone(),
    );

    let ai = AiService::new(config.openai_api_key.clone());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        sessions,
        oauth,
        youtube,
        ai,
    });

    // Periodic sweep of expired sessions
    let purge_sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let evicted = purge_sessions.purge_expired();
            if evicted > 0 {
                tracing::debug!(evicted, "Purged expired sessions");
            }
        }
    });

    // Build router
    let app = replix::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("replix=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
