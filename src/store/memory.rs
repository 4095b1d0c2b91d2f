//! In-memory [`FeedStore`] backed by hash maps behind a single mutex.
//!
//! Used by the test suite and by servers started without a data directory.
//! The single lock makes every operation, including the conditional
//! like and rate-limit updates, trivially atomic.

use crate::error::{FeedError, Result};
use crate::feed::{Comment, Post};
use crate::ratelimit::{evaluate, RateLimitDecision, RateLimitRecord};
use crate::store::{FeedStore, LikeOutcome, StoreStats};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct MemoryState {
    posts: HashMap<String, Post>,
    comments: HashMap<String, Vec<Comment>>,
    /// Like markers keyed `{post_id}_{client_key}`, value is the like time.
    likes: HashMap<String, u64>,
    rate_limits: HashMap<String, RateLimitRecord>,
}

/// Volatile store for tests and ephemeral deployments.
#[derive(Default)]
pub struct MemoryFeedStore {
    state: Mutex<MemoryState>,
}

impl MemoryFeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| FeedError::storage("Memory store lock poisoned"))
    }
}

fn like_marker_key(post_id: &str, client_key: &str) -> String {
    format!("{}_{}", post_id, client_key)
}

impl FeedStore for MemoryFeedStore {
    fn put_post(&self, post: &Post) -> Result<()> {
        let mut state = self.lock()?;
        state.posts.insert(post.id().to_string(), post.clone());
        Ok(())
    }

    fn get_post(&self, id: &str) -> Result<Option<Post>> {
        let state = self.lock()?;
        Ok(state.posts.get(id).cloned())
    }

    fn list_posts(&self, limit: usize) -> Result<Vec<Post>> {
        let state = self.lock()?;
        let mut posts: Vec<Post> = state.posts.values().cloned().collect();
        // Newest first; ties broken by id so paging is deterministic.
        posts.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        posts.truncate(limit);
        Ok(posts)
    }

    fn put_comment(&self, comment: &Comment) -> Result<()> {
        let mut state = self.lock()?;
        state
            .comments
            .entry(comment.post_id().to_string())
            .or_default()
            .push(comment.clone());
        Ok(())
    }

    fn list_comments(&self, post_id: &str, limit: Option<usize>) -> Result<Vec<Comment>> {
        let state = self.lock()?;
        let mut comments = state.comments.get(post_id).cloned().unwrap_or_default();
        comments.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        if let Some(limit) = limit {
            comments.truncate(limit);
        }
        Ok(comments)
    }

    fn apply_like(&self, post_id: &str, client_key: &str, now_ms: u64) -> Result<LikeOutcome> {
        let mut state = self.lock()?;
        if !state.posts.contains_key(post_id) {
            return Err(FeedError::not_found(format!("Post {} not found", post_id)));
        }

        let marker = like_marker_key(post_id, client_key);
        if state.likes.contains_key(&marker) {
            let likes = state
                .posts
                .get(post_id)
                .map(Post::likes)
                .unwrap_or_default();
            return Ok(LikeOutcome::AlreadyLiked { likes });
        }

        state.likes.insert(marker, now_ms);
        let post = state
            .posts
            .get_mut(post_id)
            .ok_or_else(|| FeedError::storage("Post vanished during like"))?;
        post.increment_likes();
        Ok(LikeOutcome::Liked {
            likes: post.likes(),
        })
    }

    fn apply_rate_limit(
        &self,
        key: &str,
        ceiling: u32,
        window_ms: u64,
        now_ms: u64,
    ) -> Result<RateLimitDecision> {
        let mut state = self.lock()?;
        let previous = state.rate_limits.get(key).copied();
        let decision = evaluate(previous, ceiling, window_ms, now_ms);
        if let RateLimitDecision::Allowed { record } = decision {
            state.rate_limits.insert(key.to_string(), record);
        }
        Ok(decision)
    }

    fn stats(&self) -> Result<StoreStats> {
        let state = self.lock()?;
        Ok(StoreStats {
            posts: state.posts.len() as u64,
            comments: state.comments.values().map(Vec::len).sum::<usize>() as u64,
            likes: state.likes.len() as u64,
        })
    }
}
