//! HTTP handlers for the feed API.
//!
//! Handlers translate between the wire and the feed service: they resolve
//! the client address, hand raw submissions to the service, and map domain
//! errors onto HTTP status codes. All feed semantics live in the library.

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use keluhkesah::service::{CommentView, FeedService, ListPostsQuery, PostView, SortOrder};
use keluhkesah::validation::{NewComment, NewPost};
use keluhkesah::FeedError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, instrument};

use crate::client_ip;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<FeedService>,
}

/// Query parameters for the post listing.
#[derive(Debug, Deserialize)]
pub struct ListPostsParams {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
}

/// Query parameters for comment listing.
#[derive(Debug, Deserialize)]
pub struct ListCommentsParams {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Body of a like request.
#[derive(Debug, Deserialize)]
pub struct LikeRequest {
    /// Opaque token identifying the liking device or browser.
    pub client_id: String,
}

/// Generic feed API response.
#[derive(Debug, Serialize)]
pub struct FeedApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<PostView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<CommentView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
}

impl FeedApiResponse {
    fn created_post(post: PostView) -> Self {
        Self {
            success: true,
            message: Some("Post created".to_string()),
            error: None,
            post: Some(post),
            comment: None,
            likes: None,
        }
    }

    fn created_comment(comment: CommentView) -> Self {
        Self {
            success: true,
            message: Some("Comment created".to_string()),
            error: None,
            post: None,
            comment: Some(comment),
            likes: None,
        }
    }

    fn liked(message: impl Into<String>, likes: u64) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            post: None,
            comment: None,
            likes: Some(likes),
        }
    }

    fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            post: None,
            comment: None,
            likes: None,
        }
    }
}

/// Maps a domain error to an HTTP response, logging server-side failures.
fn error_response(err: &FeedError) -> (StatusCode, Json<FeedApiResponse>) {
    if !err.is_client_error() {
        error!("Request failed: {}", err);
    }

    let status = match err {
        FeedError::Validation(_) => StatusCode::BAD_REQUEST,
        FeedError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        FeedError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(FeedApiResponse::error(err.to_string())))
}

/// Submit a new post.
#[instrument(skip(state, headers, request))]
pub async fn create_post(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<NewPost>,
) -> impl IntoResponse {
    let address = client_ip::resolve(&headers, peer);

    match state.service.create_post(&request, Some(&address)) {
        Ok(post) => (
            StatusCode::CREATED,
            Json(FeedApiResponse::created_post(post)),
        ),
        Err(e) => error_response(&e),
    }
}

/// Like a post on behalf of the calling client.
///
/// Likes are deduplicated per the token in the body, not per network
/// address.
#[instrument(skip(state, request))]
pub async fn like_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(request): Json<LikeRequest>,
) -> impl IntoResponse {
    match state.service.like_post(&post_id, &request.client_id) {
        Ok(outcome) => {
            let message = if outcome.newly_liked() {
                "Like recorded"
            } else {
                "Already liked"
            };
            (
                StatusCode::OK,
                Json(FeedApiResponse::liked(message, outcome.likes())),
            )
        }
        Err(e) => error_response(&e),
    }
}

/// List posts, newest first by default.
#[instrument(skip(state))]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListPostsParams>,
) -> Response {
    let query = ListPostsQuery {
        limit: params.limit,
        search: params.q,
        sort: SortOrder::from_param(params.sort.as_deref()),
    };

    match state.service.list_posts(&query) {
        Ok(posts) => Json(posts).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// Submit a comment on a post.
#[instrument(skip(state, headers, request))]
pub async fn create_comment(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<NewComment>,
) -> impl IntoResponse {
    let address = client_ip::resolve(&headers, peer);
    // The path names the post; any post id in the body is ignored.
    let submission = NewComment { post_id, ..request };

    match state.service.create_comment(&submission, Some(&address)) {
        Ok(comment) => (
            StatusCode::CREATED,
            Json(FeedApiResponse::created_comment(comment)),
        ),
        Err(e) => error_response(&e),
    }
}

/// List comments on a post, oldest first.
#[instrument(skip(state))]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Query(params): Query<ListCommentsParams>,
) -> Response {
    match state.service.list_comments(&post_id, params.limit) {
        Ok(comments) => Json(comments).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// Health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "keluhkesah-server",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Server stats endpoint.
#[instrument(skip(state))]
pub async fn stats(State(state): State<AppState>) -> Response {
    match state.service.stats() {
        Ok(stats) => Json(serde_json::json!({
            "posts": stats.posts,
            "comments": stats.comments,
            "likes": stats.likes
        }))
        .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}
