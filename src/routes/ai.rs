// SPDX-License-Identifier: MIT

//! AI reply generation and sentiment categorization routes.

use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::CommentSummary;
use crate::services::CategorizedComments;
use crate::AppState;

/// AI routes (require authentication).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ai/generate-reply", post(generate_reply))
        .route("/ai/categorize-comments", post(categorize_comments))
}

#[derive(Deserialize)]
struct GenerateReplyBody {
    #[serde(default)]
    comment: Option<String>,
}

#[derive(Serialize)]
struct GenerateReplyResponse {
    reply: String,
}

/// Generate an AI-drafted reply to a comment.
async fn generate_reply(
    State(state): State<Arc<AppState>>,
    Extension(_auth): Extension<AuthUser>,
    Json(body): Json<GenerateReplyBody>,
) -> Result<Json<GenerateReplyResponse>> {
    let comment = match body.comment {
        Some(comment) if !comment.trim().is_empty() => comment,
        _ => return Err(AppError::BadRequest("Comment text is required".to_string())),
    };

    let reply = state.ai.generate_reply(&comment).await;
    Ok(Json(GenerateReplyResponse { reply }))
}

#[derive(Deserialize)]
struct CategorizeBody {
    #[serde(default)]
    comments: Vec<CommentSummary>,
}

/// Bulk-categorize comments by sentiment.
async fn categorize_comments(
    State(state): State<Arc<AppState>>,
    Extension(_auth): Extension<AuthUser>,
    Json(body): Json<CategorizeBody>,
) -> Result<Json<CategorizedComments>> {
    let categorized = state.ai.categorize_comments(body.comments).await;
    Ok(Json(categorized))
}
