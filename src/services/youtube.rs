// SPDX-License-Identifier: MIT

//! YouTube Data API client for channel videos and comments.
//!
//! Handles:
//! - Channel upload listing (reduced to video summaries)
//! - Top-level comment thread listing
//! - Comment and reply posting
//! - Access-token refresh on 401, persisted back to the credential store

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{CommentSummary, User, VideoSummary};
use serde::Deserialize;

const DEFAULT_MAX_RESULTS: u32 = 10;

/// Low-level YouTube Data API v3 client.
#[derive(Clone)]
pub struct YouTubeClient {
    http: reqwest::Client,
    base_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl YouTubeClient {
    /// Create a new client with OAuth credentials.
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            client_id,
            client_secret,
        }
    }

    /// Override API endpoints (tests point these at a local server).
    pub fn with_endpoints(mut self, base_url: String, token_url: String) -> Self {
        self.base_url = base_url;
        self.token_url = token_url;
        self
    }

    /// Resolve the authenticated user's uploads playlist.
    pub async fn get_uploads_playlist(&self, access_token: &str) -> Result<String, AppError> {
        let url = format!("{}/channels", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("part", "contentDetails"), ("mine", "true")])
            .send()
            .await
            .map_err(|e| AppError::YouTubeApi(e.to_string()))?;

        let channels: ChannelListResponse = self.check_response_json(response).await?;

        channels
            .items
            .into_iter()
            .next()
            .map(|channel| channel.content_details.related_playlists.uploads)
            .ok_or_else(|| {
                AppError::NotFound("No channel found for the authenticated user".to_string())
            })
    }

    /// List uploads from a playlist, reduced to video summaries.
    pub async fn list_playlist_videos(
        &self,
        access_token: &str,
        playlist_id: &str,
        max_results: u32,
    ) -> Result<Vec<VideoSummary>, AppError> {
        let url = format!("{}/playlistItems", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("part", "snippet"),
                ("playlistId", playlist_id),
                ("maxResults", &max_results.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::YouTubeApi(e.to_string()))?;

        let items: PlaylistItemsResponse = self.check_response_json(response).await?;

        let mut videos: Vec<VideoSummary> = items
            .items
            .into_iter()
            .map(|item| VideoSummary {
                id: item.snippet.resource_id.video_id,
                title: item.snippet.title,
                thumbnail: item
                    .snippet
                    .thumbnails
                    .medium
                    .or(item.snippet.thumbnails.default)
                    .map(|t| t.url)
                    .unwrap_or_default(),
                published_at: item.snippet.published_at,
            })
            .collect();

        videos.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(videos)
    }

    /// List top-level comment threads for a video, relevance order.
    pub async fn list_comment_threads(
        &self,
        access_token: &str,
        video_id: &str,
        max_results: u32,
    ) -> Result<Vec<CommentSummary>, AppError> {
        let url = format!("{}/commentThreads", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("part", "snippet"),
                ("videoId", video_id),
                ("maxResults", &max_results.to_string()),
                ("order", "relevance"),
            ])
            .send()
            .await
            .map_err(|e| AppError::YouTubeApi(e.to_string()))?;

        let threads: CommentThreadsResponse = self.check_response_json(response).await?;

        Ok(threads
            .items
            .into_iter()
            .map(|thread| {
                let snippet = thread.snippet.top_level_comment.snippet;
                CommentSummary {
                    id: thread.id,
                    author: snippet.author_display_name,
                    author_image: snippet.author_profile_image_url,
                    text: snippet.text_display,
                    published_at: snippet.published_at,
                    like_count: snippet.like_count,
                    sentiment: None,
                }
            })
            .collect())
    }

    /// Create a new top-level comment thread on a video.
    pub async fn insert_comment_thread(
        &self,
        access_token: &str,
        video_id: &str,
        text: &str,
    ) -> Result<serde_json::Value, AppError> {
        let url = format!("{}/commentThreads", self.base_url);

        let body = serde_json::json!({
            "snippet": {
                "videoId": video_id,
                "topLevelComment": {
                    "snippet": { "textOriginal": text }
                }
            }
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .query(&[("part", "snippet")])
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::YouTubeApi(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Insert a reply under an existing comment thread.
    pub async fn insert_reply(
        &self,
        access_token: &str,
        parent_id: &str,
        text: &str,
    ) -> Result<serde_json::Value, AppError> {
        let url = format!("{}/comments", self.base_url);

        let body = serde_json::json!({
            "snippet": {
                "parentId": parent_id,
                "textOriginal": text
            }
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .query(&[("part", "snippet")])
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::YouTubeApi(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Mint a new access token from a refresh token.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<String, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::YouTubeApi(format!("Token refresh request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            // A rejected refresh token means the grant itself is dead.
            if status.as_u16() == 400 || status.as_u16() == 401 {
                tracing::warn!(status = %status, "Refresh token rejected by Google");
                return Err(AppError::ReauthRequired);
            }
            return Err(AppError::YouTubeApi(format!("HTTP {}: {}", status, body)));
        }

        let refreshed: TokenRefreshResponse = response
            .json()
            .await
            .map_err(|e| AppError::YouTubeApi(format!("JSON parse error: {}", e)))?;

        Ok(refreshed.access_token)
    }

    /// Check response status and parse JSON body.
    ///
    /// 401 means the stored credential was rejected upstream; 404 means the
    /// referenced resource is gone. Everything else is an upstream failure.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 {
                return Err(AppError::ReauthRequired);
            }

            if status.as_u16() == 404 {
                return Err(AppError::NotFound(format!("YouTube resource: {}", body)));
            }

            return Err(AppError::YouTubeApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::YouTubeApi(format!("JSON parse error: {}", e)))
    }
}

// ─── Wire types (reduced to the fields this application reads) ───────────────

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Channel {
    content_details: ChannelContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemSnippet {
    title: String,
    published_at: String,
    resource_id: ResourceId,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct CommentThreadsResponse {
    #[serde(default)]
    items: Vec<CommentThread>,
}

#[derive(Debug, Deserialize)]
struct CommentThread {
    id: String,
    snippet: CommentThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadSnippet {
    top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    author_display_name: String,
    author_profile_image_url: String,
    text_display: String,
    published_at: String,
    #[serde(default)]
    like_count: i64,
}

/// Token refresh response from Google.
#[derive(Debug, Deserialize)]
struct TokenRefreshResponse {
    access_token: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// YouTubeService - per-user credential handling around the client
// ─────────────────────────────────────────────────────────────────────────────

/// High-level YouTube service that attaches stored credentials to calls.
///
/// Every call runs with the user's stored access token. When the token is
/// rejected upstream and a refresh token exists, the service mints a new
/// access token, persists it back to the credential store, and retries the
/// call once. Overlapping refreshes for the same user are last-writer-wins.
#[derive(Clone)]
pub struct YouTubeService {
    client: YouTubeClient,
    db: FirestoreDb,
}

impl YouTubeService {
    pub fn new(client: YouTubeClient, db: FirestoreDb) -> Self {
        Self { client, db }
    }

    /// List the user's recent uploads, publish date descending.
    pub async fn list_videos(&self, user: &User) -> Result<Vec<VideoSummary>, AppError> {
        match self.list_videos_with_token(&user.access_token).await {
            Err(AppError::ReauthRequired) => {
                let token = self.refresh_and_persist(user).await?;
                self.list_videos_with_token(&token).await
            }
            other => other,
        }
    }

    async fn list_videos_with_token(
        &self,
        access_token: &str,
    ) -> Result<Vec<VideoSummary>, AppError> {
        let playlist_id = self.client.get_uploads_playlist(access_token).await?;
        self.client
            .list_playlist_videos(access_token, &playlist_id, DEFAULT_MAX_RESULTS)
            .await
    }

    /// List top-level comment threads for a video.
    pub async fn list_comments(
        &self,
        user: &User,
        video_id: &str,
    ) -> Result<Vec<CommentSummary>, AppError> {
        match self
            .client
            .list_comment_threads(&user.access_token, video_id, DEFAULT_MAX_RESULTS)
            .await
        {
            Err(AppError::ReauthRequired) => {
                let token = self.refresh_and_persist(user).await?;
                self.client
                    .list_comment_threads(&token, video_id, DEFAULT_MAX_RESULTS)
                    .await
            }
            other => other,
        }
    }

    /// Post a new top-level comment on a video.
    pub async fn post_comment(
        &self,
        user: &User,
        video_id: &str,
        text: &str,
    ) -> Result<serde_json::Value, AppError> {
        match self
            .client
            .insert_comment_thread(&user.access_token, video_id, text)
            .await
        {
            Err(AppError::ReauthRequired) => {
                let token = self.refresh_and_persist(user).await?;
                self.client.insert_comment_thread(&token, video_id, text).await
            }
            other => other,
        }
    }

    /// Post a reply under an existing comment thread.
    pub async fn post_reply(
        &self,
        user: &User,
        parent_id: &str,
        text: &str,
    ) -> Result<serde_json::Value, AppError> {
        match self
            .client
            .insert_reply(&user.access_token, parent_id, text)
            .await
        {
            Err(AppError::ReauthRequired) => {
                let token = self.refresh_and_persist(user).await?;
                self.client.insert_reply(&token, parent_id, text).await
            }
            other => other,
        }
    }

    /// Mint a fresh access token and write it back to the credential store.
    ///
    /// Without a refresh token the only way forward is re-authentication.
    async fn refresh_and_persist(&self, user: &User) -> Result<String, AppError> {
        let refresh_token = user
            .refresh_token
            .as_deref()
            .ok_or(AppError::ReauthRequired)?;

        tracing::info!(user_id = %user.id, "Access token rejected, refreshing");

        let access_token = self.client.refresh_access_token(refresh_token).await?;

        let mut updated = user.clone();
        updated.access_token = access_token.clone();
        updated.updated_at = chrono::Utc::now().to_rfc3339();
        self.db.upsert_user(&updated).await?;

        tracing::info!(user_id = %user.id, "Refreshed access token persisted");

        Ok(access_token)
    }
}
