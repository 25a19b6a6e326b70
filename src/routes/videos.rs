// SPDX-License-Identifier: MIT

//! Video and comment routes for authenticated users.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{CommentSummary, User, VideoSummary};
use crate::AppState;

/// Video routes (require authentication).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/videos", get(list_videos))
        .route(
            "/videos/{id}/comments",
            get(list_comments).post(post_comment),
        )
        .route(
            "/videos/{id}/comments/{comment_id}/reply",
            post(post_reply),
        )
}

#[derive(Deserialize)]
struct CommentBody {
    #[serde(default)]
    text: Option<String>,
}

impl CommentBody {
    /// Required non-empty text, validated before anything else runs.
    fn text(self) -> Result<String> {
        match self.text {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(AppError::BadRequest("Comment text is required".to_string())),
        }
    }
}

/// Load the credential record behind the session.
async fn current_user(state: &AppState, auth: &AuthUser) -> Result<User> {
    state
        .db
        .get_user(&auth.user_id)
        .await?
        .ok_or(AppError::Unauthorized)
}

/// List the channel's recent uploads, newest first.
async fn list_videos(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<VideoSummary>>> {
    let user = current_user(&state, &auth).await?;
    let videos = state.youtube.list_videos(&user).await?;
    Ok(Json(videos))
}

/// List top-level comment threads for a video.
async fn list_comments(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(video_id): Path<String>,
) -> Result<Json<Vec<CommentSummary>>> {
    let user = current_user(&state, &auth).await?;
    let comments = state.youtube.list_comments(&user, &video_id).await?;
    Ok(Json(comments))
}

/// Post a new top-level comment on a video.
async fn post_comment(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(video_id): Path<String>,
    Json(body): Json<CommentBody>,
) -> Result<Json<serde_json::Value>> {
    let text = body.text()?;
    let user = current_user(&state, &auth).await?;
    let comment = state.youtube.post_comment(&user, &video_id, &text).await?;
    Ok(Json(comment))
}

/// Post a reply under an existing comment thread.
async fn post_reply(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((_video_id, comment_id)): Path<(String, String)>,
    Json(body): Json<CommentBody>,
) -> Result<Json<serde_json::Value>> {
    let text = body.text()?;
    let user = current_user(&state, &auth).await?;
    let reply = state.youtube.post_reply(&user, &comment_id, &text).await?;
    Ok(Json(reply))
}
