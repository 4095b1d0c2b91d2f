//! Persistence layer for the feed.
//!
//! Everything above this module talks to storage through the [`FeedStore`]
//! trait, so the service layer runs unchanged against the in-memory store
//! used by tests and the RocksDB store used in production:
//!
//! ```text
//! FeedService
//!     |
//! FeedStore (trait)
//!     |-- MemoryFeedStore   (HashMaps behind a mutex)
//!     `-- RocksFeedStore    (column families, persistent)
//! ```
//!
//! Stores own the atomic sections: `apply_like` and `apply_rate_limit` are
//! conditional read-modify-write operations and each implementation must
//! make them safe against concurrent callers.

pub mod memory;
pub mod rocksdb;

pub use memory::MemoryFeedStore;
pub use rocksdb::{RocksDbConfig, RocksFeedStore};

use crate::error::Result;
use crate::feed::{Comment, Post};
use crate::ratelimit::RateLimitDecision;

/// Outcome of a like request for one (post, client) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    /// First like from this client; the counter was incremented.
    Liked { likes: u64 },
    /// The client had liked this post before; nothing changed.
    AlreadyLiked { likes: u64 },
}

impl LikeOutcome {
    /// Like counter after the operation.
    pub fn likes(&self) -> u64 {
        match self {
            LikeOutcome::Liked { likes } | LikeOutcome::AlreadyLiked { likes } => *likes,
        }
    }

    /// Whether this request created the like.
    pub fn newly_liked(&self) -> bool {
        matches!(self, LikeOutcome::Liked { .. })
    }
}

/// Aggregate counters over the whole store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub posts: u64,
    pub comments: u64,
    pub likes: u64,
}

/// Storage operations required by the feed service.
///
/// Implementations must be safe to share across threads; all methods take
/// `&self` and synchronize internally.
pub trait FeedStore: Send + Sync {
    /// Persists a new post.
    fn put_post(&self, post: &Post) -> Result<()>;

    /// Fetches a single post by id.
    fn get_post(&self, id: &str) -> Result<Option<Post>>;

    /// Returns up to `limit` posts, newest first.
    fn list_posts(&self, limit: usize) -> Result<Vec<Post>>;

    /// Persists a new comment.
    fn put_comment(&self, comment: &Comment) -> Result<()>;

    /// Returns comments on a post in ascending creation order, capped at
    /// `limit` when given.
    fn list_comments(&self, post_id: &str, limit: Option<usize>) -> Result<Vec<Comment>>;

    /// Records a like from `client_key` on `post_id`, incrementing the
    /// post's counter at most once per client.
    ///
    /// Fails with [`FeedError::NotFound`](crate::FeedError::NotFound) when
    /// the post does not exist.
    fn apply_like(&self, post_id: &str, client_key: &str, now_ms: u64) -> Result<LikeOutcome>;

    /// Evaluates and persists one rate-limit step for `key` as a single
    /// atomic conditional update.
    fn apply_rate_limit(
        &self,
        key: &str,
        ceiling: u32,
        window_ms: u64,
        now_ms: u64,
    ) -> Result<RateLimitDecision>;

    /// Aggregate counters for monitoring.
    fn stats(&self) -> Result<StoreStats>;
}
