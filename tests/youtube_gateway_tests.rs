// SPDX-License-Identifier: MIT

//! YouTube gateway tests: credential attachment, failure classification,
//! and token refresh against a mock upstream.

use replix::db::FirestoreDb;
use replix::error::AppError;
use replix::models::User;
use replix::services::{YouTubeClient, YouTubeService};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

fn test_user(refresh_token: Option<&str>) -> User {
    test_user_with_id("user-1", refresh_token)
}

fn test_user_with_id(id: &str, refresh_token: Option<&str>) -> User {
    User {
        id: id.to_string(),
        google_id: format!("google-{}", id),
        email: "owner@example.com".to_string(),
        name: "Channel Owner".to_string(),
        access_token: "stored-access-token".to_string(),
        refresh_token: refresh_token.map(String::from),
        created_at: "2026-01-01T00:00:00Z".to_string(),
        updated_at: "2026-01-01T00:00:00Z".to_string(),
    }
}

fn gateway(server: &MockServer, db: FirestoreDb) -> YouTubeService {
    let client = YouTubeClient::new("client-id".to_string(), "client-secret".to_string())
        .with_endpoints(
            format!("{}/youtube/v3", server.uri()),
            format!("{}/token", server.uri()),
        );
    YouTubeService::new(client, db)
}

fn channel_body() -> serde_json::Value {
    serde_json::json!({
        "items": [
            {
                "contentDetails": {
                    "relatedPlaylists": { "uploads": "UU123" }
                }
            }
        ]
    })
}

#[tokio::test]
async fn test_upstream_401_without_refresh_token_is_reauth_required() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/channels"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let youtube = gateway(&server, FirestoreDb::new_mock());
    let result = youtube.list_videos(&test_user(None)).await;

    assert!(matches!(result, Err(AppError::ReauthRequired)));
}

#[tokio::test]
async fn test_channel_with_zero_uploads_yields_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/channels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(channel_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/playlistItems"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": []})))
        .mount(&server)
        .await;

    let youtube = gateway(&server, FirestoreDb::new_mock());
    let videos = youtube.list_videos(&test_user(None)).await.unwrap();

    assert!(videos.is_empty());
}

#[tokio::test]
async fn test_videos_are_reduced_and_sorted_newest_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/channels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(channel_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/playlistItems"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                {
                    "snippet": {
                        "title": "Older",
                        "publishedAt": "2026-01-01T00:00:00Z",
                        "resourceId": { "videoId": "v-old" },
                        "thumbnails": { "medium": { "url": "https://img/old.jpg" } }
                    }
                },
                {
                    "snippet": {
                        "title": "Newer",
                        "publishedAt": "2026-02-01T00:00:00Z",
                        "resourceId": { "videoId": "v-new" },
                        "thumbnails": { "medium": { "url": "https://img/new.jpg" } }
                    }
                }
            ]
        })))
        .mount(&server)
        .await;

    let youtube = gateway(&server, FirestoreDb::new_mock());
    let videos = youtube.list_videos(&test_user(None)).await.unwrap();

    assert_eq!(videos.len(), 2);
    assert_eq!(videos[0].id, "v-new");
    assert_eq!(videos[0].title, "Newer");
    assert_eq!(videos[0].thumbnail, "https://img/new.jpg");
    assert_eq!(videos[1].id, "v-old");
}

#[tokio::test]
async fn test_missing_channel_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/channels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": []})))
        .mount(&server)
        .await;

    let youtube = gateway(&server, FirestoreDb::new_mock());
    let result = youtube.list_videos(&test_user(None)).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_upstream_500_is_youtube_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/channels"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend blew up"))
        .mount(&server)
        .await;

    let youtube = gateway(&server, FirestoreDb::new_mock());
    let result = youtube.list_videos(&test_user(None)).await;

    assert!(matches!(result, Err(AppError::YouTubeApi(_))));
}

#[tokio::test]
async fn test_comments_are_reduced_to_summaries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/commentThreads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                {
                    "id": "thread-1",
                    "snippet": {
                        "topLevelComment": {
                            "snippet": {
                                "authorDisplayName": "Ada",
                                "authorProfileImageUrl": "https://img/ada.png",
                                "textDisplay": "great video",
                                "publishedAt": "2026-03-01T00:00:00Z",
                                "likeCount": 7
                            }
                        }
                    }
                }
            ]
        })))
        .mount(&server)
        .await;

    let youtube = gateway(&server, FirestoreDb::new_mock());
    let comments = youtube
        .list_comments(&test_user(None), "v1")
        .await
        .unwrap();

    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].id, "thread-1");
    assert_eq!(comments[0].author, "Ada");
    assert_eq!(comments[0].like_count, 7);
    assert!(comments[0].sentiment.is_none());
}

#[tokio::test]
async fn test_post_comment_sends_text_as_top_level() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/youtube/v3/commentThreads"))
        .and(body_string_contains("hello"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "thread-new",
            "snippet": {
                "topLevelComment": {
                    "snippet": { "textOriginal": "hello" }
                }
            }
        })))
        .mount(&server)
        .await;

    let youtube = gateway(&server, FirestoreDb::new_mock());
    let created = youtube
        .post_comment(&test_user(None), "v1", "hello")
        .await
        .unwrap();

    assert_eq!(
        created["snippet"]["topLevelComment"]["snippet"]["textOriginal"],
        "hello"
    );
}

#[tokio::test]
async fn test_post_reply_targets_parent_thread() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/youtube/v3/comments"))
        .and(body_string_contains("thread-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "reply-1",
            "snippet": { "parentId": "thread-1", "textOriginal": "thanks!" }
        })))
        .mount(&server)
        .await;

    let youtube = gateway(&server, FirestoreDb::new_mock());
    let created = youtube
        .post_reply(&test_user(None), "thread-1", "thanks!")
        .await
        .unwrap();

    assert_eq!(created["snippet"]["parentId"], "thread-1");
}

#[tokio::test]
async fn test_rejected_refresh_token_is_reauth_required() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/channels"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    // Google answers a dead refresh token with 400 invalid_grant.
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({"error": "invalid_grant"})),
        )
        .mount(&server)
        .await;

    let youtube = gateway(&server, FirestoreDb::new_mock());
    let result = youtube.list_videos(&test_user(Some("dead-refresh"))).await;

    assert!(matches!(result, Err(AppError::ReauthRequired)));
}

#[tokio::test]
async fn test_route_maps_upstream_401_to_reauth_required() {
    require_emulator!();

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/channels"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (app, state) = common::create_test_app_with_db(&server.uri()).await;
    state
        .db
        .upsert_user(&test_user_with_id("route-user", None))
        .await
        .unwrap();
    let cookie = common::session_cookie(&state, "route-user");

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/videos")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Not a generic 500: the client is told to restart OAuth.
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "reauth_required");
}

#[tokio::test]
async fn test_refresh_persists_new_access_token() {
    require_emulator!();

    let server = MockServer::start().await;
    let db = common::test_db().await;

    let user = test_user_with_id("refresh-user", Some("live-refresh"));
    db.upsert_user(&user).await.unwrap();

    // The stored token is rejected once; the refreshed one succeeds.
    Mock::given(method("GET"))
        .and(path("/youtube/v3/channels"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "fresh-access-token",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/channels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(channel_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/playlistItems"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": []})))
        .mount(&server)
        .await;

    let youtube = gateway(&server, db.clone());
    let videos = youtube.list_videos(&user).await.unwrap();
    assert!(videos.is_empty());

    // The refreshed token was written back to the credential store.
    let stored = db.get_user("refresh-user").await.unwrap().unwrap();
    assert_eq!(stored.access_token, "fresh-access-token");
    assert_eq!(stored.refresh_token.as_deref(), Some("live-refresh"));
}
