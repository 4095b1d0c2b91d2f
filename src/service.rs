//! Feed orchestration.
//!
//! [`FeedService`] ties the pieces together and owns the write pipeline.
//! Every submission runs the same fixed sequence, short-circuiting on the
//! first failure:
//!
//! 1. hash the caller's network address into a client identity
//! 2. validate and normalize the submission
//! 3. consult the rate limiter for the action type
//! 4. mask profanity in free-text content
//! 5. persist with a server-assigned id and timestamp
//! 6. invalidate the cached post listing
//!
//! Likes sit outside that pipeline: they carry a caller-supplied device
//! token that keys the dedup marker, and touch only the marker and counter.
//!
//! Reads go through the listing cache where applicable and return view
//! structs with timestamps rendered as ISO-8601 text. Views never carry the
//! stored identity hash.

use crate::cache::ListingCache;
use crate::error::{FeedError, Result};
use crate::feed::types::{current_timestamp_millis, generate_record_id, to_iso8601, Mood};
use crate::feed::{Comment, Post};
use crate::identity::hash_identity;
use crate::moderation::mask_profanity;
use crate::ratelimit::{RateLimitAction, RateLimitConfig, RateLimiter};
use crate::store::{FeedStore, LikeOutcome, StoreStats};
use crate::validation::{NewComment, NewPost, Validator};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Listing order for posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Newest first by creation time.
    #[default]
    Newest,
    /// Most likes first; ties stay newest first.
    Top,
}

impl SortOrder {
    /// Parses the wire value. Anything other than an explicit `top` falls
    /// back to the default ordering.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("top") => SortOrder::Top,
            _ => SortOrder::Newest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Newest => "new",
            SortOrder::Top => "top",
        }
    }
}

/// Parameters for listing posts.
#[derive(Debug, Clone, Default)]
pub struct ListPostsQuery {
    /// Page size; absent means the default, out-of-range values are clamped.
    pub limit: Option<usize>,
    /// Case-insensitive content filter applied to the fetched page.
    pub search: Option<String>,
    pub sort: SortOrder,
}

/// Post shaped for the outside world.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: String,
    pub content: String,
    pub mood: Mood,
    pub name: String,
    pub likes: u64,
    /// ISO-8601 creation time, or null when the timestamp is unrepresentable.
    pub created_at: Option<String>,
}

impl PostView {
    fn from_post(post: &Post) -> Self {
        Self {
            id: post.id().to_string(),
            content: post.content().to_string(),
            mood: post.mood(),
            name: post.name().to_string(),
            likes: post.likes(),
            created_at: to_iso8601(post.created_at()),
        }
    }
}

/// Comment shaped for the outside world.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: String,
    pub post_id: String,
    pub content: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub likes: u64,
    pub created_at: Option<String>,
}

impl CommentView {
    fn from_comment(comment: &Comment) -> Self {
        Self {
            id: comment.id().to_string(),
            post_id: comment.post_id().to_string(),
            content: comment.content().to_string(),
            parent_id: comment.parent_id().map(String::from),
            name: comment.name().to_string(),
            likes: comment.likes(),
            created_at: to_iso8601(comment.created_at()),
        }
    }
}

/// Orchestrates validation, moderation, rate limiting, and persistence.
pub struct FeedService {
    store: Arc<dyn FeedStore>,
    limiter: RateLimiter,
    listing_cache: ListingCache<Vec<PostView>>,
}

impl FeedService {
    pub fn new(store: Arc<dyn FeedStore>, rate_limits: RateLimitConfig) -> Self {
        let limiter = RateLimiter::new(Arc::clone(&store), rate_limits);
        Self {
            store,
            limiter,
            listing_cache: ListingCache::new(),
        }
    }

    /// Creates a post from a raw submission.
    ///
    /// `client_address` is the caller's network address as resolved by the
    /// transport; it is hashed before any further use.
    pub fn create_post(&self, input: &NewPost, client_address: Option<&str>) -> Result<PostView> {
        let ip_hash = client_address.and_then(hash_identity);
        let draft = Validator::validate_post(input)?;
        self.limiter
            .check(ip_hash.as_deref(), RateLimitAction::Post)?;

        let content = mask_profanity(&draft.content);
        let post = Post::new(
            generate_record_id(),
            content,
            draft.mood,
            draft.name,
            ip_hash,
            current_timestamp_millis(),
        )?;

        self.store.put_post(&post)?;
        self.listing_cache.invalidate();

        info!(post_id = %post.id(), mood = %post.mood(), "Post created");
        Ok(PostView::from_post(&post))
    }

    /// Records a like on a post for the calling client.
    ///
    /// `client_id` is the caller's own device token, hashed into the marker
    /// key. Idempotent per token: a repeated like is a successful no-op and
    /// the counter moves by at most one, regardless of which address the
    /// requests arrive from.
    pub fn like_post(&self, post_id: &str, client_id: &str) -> Result<LikeOutcome> {
        let client_key = hash_identity(client_id)
            .ok_or_else(|| FeedError::validation("client_id must not be empty"))?;

        let outcome = self
            .store
            .apply_like(post_id, &client_key, current_timestamp_millis())?;

        if outcome.newly_liked() {
            self.listing_cache.invalidate();
        }

        debug!(
            post_id,
            newly_liked = outcome.newly_liked(),
            likes = outcome.likes(),
            "Like processed"
        );
        Ok(outcome)
    }

    /// Lists posts for the feed.
    ///
    /// The store supplies the newest posts up to the limit; the search
    /// filter and `top` ordering are applied to that page in memory, so a
    /// search can return fewer matches than exist overall.
    pub fn list_posts(&self, query: &ListPostsQuery) -> Result<Vec<PostView>> {
        let limit = Validator::clamp_fetch_limit(query.limit);
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        let cache_key = format!(
            "limit={}|q={}|sort={}",
            limit,
            search.as_deref().unwrap_or(""),
            query.sort.as_str()
        );

        let generation = self.listing_cache.generation();
        if let Some(cached) = self.listing_cache.get(&cache_key) {
            debug!(%cache_key, "Post listing served from cache");
            return Ok(cached);
        }

        let mut posts = self.store.list_posts(limit)?;

        if let Some(needle) = &search {
            posts.retain(|post| post.content().to_lowercase().contains(needle));
        }
        if query.sort == SortOrder::Top {
            // Stable sort: equal like counts keep their newest-first order.
            posts.sort_by(|a, b| b.likes().cmp(&a.likes()));
        }

        let views: Vec<PostView> = posts.iter().map(PostView::from_post).collect();
        self.listing_cache.put(&cache_key, views.clone(), generation);

        debug!(returned = views.len(), limit, "Post listing fetched");
        Ok(views)
    }

    /// Creates a comment on an existing post.
    pub fn create_comment(
        &self,
        input: &NewComment,
        client_address: Option<&str>,
    ) -> Result<CommentView> {
        let ip_hash = client_address.and_then(hash_identity);
        let draft = Validator::validate_comment(input)?;

        if self.store.get_post(&draft.post_id)?.is_none() {
            return Err(FeedError::not_found(format!(
                "Post {} not found",
                draft.post_id
            )));
        }

        self.limiter
            .check(ip_hash.as_deref(), RateLimitAction::Comment)?;

        let content = mask_profanity(&draft.content);
        let comment = Comment::new(
            generate_record_id(),
            draft.post_id,
            content,
            draft.parent_id,
            draft.name,
            ip_hash,
            current_timestamp_millis(),
        )?;

        self.store.put_comment(&comment)?;
        self.listing_cache.invalidate();

        info!(
            comment_id = %comment.id(),
            post_id = %comment.post_id(),
            "Comment created"
        );
        Ok(CommentView::from_comment(&comment))
    }

    /// Lists comments on a post, oldest first.
    ///
    /// An unknown post yields an empty list rather than an error, matching
    /// the listing semantics of a post with no comments yet.
    pub fn list_comments(
        &self,
        post_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<CommentView>> {
        let comments = self.store.list_comments(post_id, limit)?;
        Ok(comments.iter().map(CommentView::from_comment).collect())
    }

    /// Aggregate counters for monitoring.
    pub fn stats(&self) -> Result<StoreStats> {
        self.store.stats()
    }
}
