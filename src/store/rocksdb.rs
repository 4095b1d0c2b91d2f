//! Persistent [`FeedStore`] backed by RocksDB.
//!
//! ## Storage Layout
//!
//! Uses column families for logical separation:
//! - `posts`: `{post_id}` -> serialized Post
//! - `idx_posts_created`: `{inverted_timestamp}{post_id}` -> () (sorted newest first)
//! - `comments`: `{post_id}:{timestamp}{comment_id}` -> serialized Comment (sorted oldest first)
//! - `likes`: `{post_id}:{client_key}` -> like timestamp
//! - `rate_limits`: `{identity}_{action}` -> window record
//! - `meta`: running totals for monitoring
//!
//! RocksDB sorts keys in ascending byte order. The post index stores
//! `u64::MAX - timestamp` so newer posts appear first when iterating, while
//! comment keys use the plain timestamp for chronological reading order.
//!
//! A single mutation lock serializes all writes. The like and rate-limit
//! operations are conditional read-modify-write updates, and the running
//! totals must move together with the records they count; reads bypass the
//! lock entirely.

use crate::error::{FeedError, Result};
use crate::feed::constants::MAX_POST_FETCH_LIMIT;
use crate::feed::{Comment, Post};
use crate::ratelimit::{evaluate, RateLimitDecision, RateLimitRecord};
use crate::store::{FeedStore, LikeOutcome, StoreStats};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, MultiThreaded, Options,
};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, trace, warn};

/// Default data directory name.
pub const DEFAULT_DATA_DIR: &str = "keluhkesah_data";

/// Database subdirectory.
const DB_DIR: &str = "feed_db";

/// Column family names.
const CF_POSTS: &str = "posts";
const CF_IDX_POSTS_CREATED: &str = "idx_posts_created";
const CF_COMMENTS: &str = "comments";
const CF_LIKES: &str = "likes";
const CF_RATE_LIMITS: &str = "rate_limits";
const CF_META: &str = "meta";

const COLUMN_FAMILIES: &[&str] = &[
    CF_POSTS,
    CF_IDX_POSTS_CREATED,
    CF_COMMENTS,
    CF_LIKES,
    CF_RATE_LIMITS,
    CF_META,
];

/// Counter keys in the meta column family.
const META_POSTS_TOTAL: &[u8] = b"posts_total";
const META_COMMENTS_TOTAL: &[u8] = b"comments_total";
const META_LIKES_TOTAL: &[u8] = b"likes_total";

/// Length of the inverted-timestamp prefix on post index keys.
const IDX_TS_LEN: usize = 8;

// =============================================================================
// RocksDB Configuration
// =============================================================================

/// Configuration for RocksDB storage.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Maximum number of open files.
    pub max_open_files: i32,
    /// Number of log files to keep.
    pub keep_log_file_num: usize,
    /// Maximum WAL size in bytes.
    pub max_wal_size: u64,
    /// Write buffer size in bytes.
    pub write_buffer_size: usize,
    /// Maximum number of write buffers.
    pub max_write_buffer_number: i32,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            max_open_files: 128,
            keep_log_file_num: 2,
            max_wal_size: 32 * 1024 * 1024,      // 32MB
            write_buffer_size: 32 * 1024 * 1024, // 32MB
            max_write_buffer_number: 2,
        }
    }
}

impl RocksDbConfig {
    /// Creates a configuration sized for server workloads.
    pub fn for_server() -> Self {
        Self {
            max_open_files: 256,
            keep_log_file_num: 3,
            max_wal_size: 64 * 1024 * 1024,      // 64MB
            write_buffer_size: 64 * 1024 * 1024, // 64MB
            max_write_buffer_number: 3,
        }
    }

    /// Builds RocksDB Options from this configuration.
    fn build_options(&self) -> Options {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_max_open_files(self.max_open_files);
        opts.set_keep_log_file_num(self.keep_log_file_num);
        opts.set_max_total_wal_size(self.max_wal_size);
        opts.increase_parallelism(num_cpus::get() as i32);
        opts.set_write_buffer_size(self.write_buffer_size);
        opts.set_max_write_buffer_number(self.max_write_buffer_number);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }
}

// =============================================================================
// Key Builders
// =============================================================================

/// Inverts a timestamp so newer timestamps sort first in byte order.
fn invert_timestamp(timestamp: u64) -> [u8; 8] {
    (u64::MAX - timestamp).to_be_bytes()
}

/// Post index key: inverted timestamp + post id.
fn post_index_key(created_at: u64, post_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(IDX_TS_LEN + post_id.len());
    key.extend_from_slice(&invert_timestamp(created_at));
    key.extend_from_slice(post_id.as_bytes());
    key
}

/// Comment key: post id + separator + timestamp + comment id.
///
/// The separator keeps one post's comment range from bleeding into another's
/// during prefix iteration.
fn comment_key(post_id: &str, created_at: u64, comment_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(post_id.len() + 1 + 8 + comment_id.len());
    key.extend_from_slice(post_id.as_bytes());
    key.push(b':');
    key.extend_from_slice(&created_at.to_be_bytes());
    key.extend_from_slice(comment_id.as_bytes());
    key
}

/// Prefix covering all comments of one post.
fn comment_prefix(post_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(post_id.len() + 1);
    key.extend_from_slice(post_id.as_bytes());
    key.push(b':');
    key
}

/// Like marker key: post id + separator + client key.
fn like_key(post_id: &str, client_key: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(post_id.len() + 1 + client_key.len());
    key.extend_from_slice(post_id.as_bytes());
    key.push(b':');
    key.extend_from_slice(client_key.as_bytes());
    key
}

// =============================================================================
// Store
// =============================================================================

/// RocksDB-backed feed store.
pub struct RocksFeedStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    /// Serializes writes; see module docs.
    mutations: Mutex<()>,
}

impl RocksFeedStore {
    /// Opens the store under the default data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(DEFAULT_DATA_DIR, &RocksDbConfig::default())
    }

    /// Opens the store under a custom data directory.
    pub fn open(data_dir: impl AsRef<Path>, config: &RocksDbConfig) -> Result<Self> {
        let db_path = data_dir.as_ref().join(DB_DIR);
        let opts = config.build_options();
        let cf_opts = Options::default();

        let cf_descriptors: Vec<_> = COLUMN_FAMILIES
            .iter()
            .map(|cf| ColumnFamilyDescriptor::new(*cf, cf_opts.clone()))
            .collect();

        let db = DBWithThreadMode::<MultiThreaded>::open_cf_descriptors(
            &opts,
            &db_path,
            cf_descriptors,
        )
        .map_err(|e| FeedError::storage(format!("Failed to open RocksDB: {}", e)))?;

        info!("Opened feed RocksDB at {:?}", db_path);

        Ok(Self {
            db: Arc::new(db),
            mutations: Mutex::new(()),
        })
    }

    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| FeedError::storage(format!("Column family '{}' not found", name)))
    }

    fn write_lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.mutations
            .lock()
            .map_err(|_| FeedError::storage("Store mutation lock poisoned"))
    }

    /// Stores a serializable value at the given key.
    fn put<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = bincode::serialize(value)
            .map_err(|e| FeedError::serialization(format!("Failed to serialize: {}", e)))?;

        trace!(
            cf = cf_name,
            key_len = key.len(),
            value_bytes = bytes.len(),
            "db_put: storing serialized value"
        );

        self.db
            .put_cf(&cf, key, &bytes)
            .map_err(|e| FeedError::storage(format!("Failed to write: {}", e)))?;
        Ok(())
    }

    /// Loads and deserializes a value from the given key.
    fn get<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(&cf, key) {
            Ok(Some(bytes)) => {
                let value: T = bincode::deserialize(&bytes).map_err(|e| {
                    FeedError::serialization(format!("Failed to deserialize: {}", e))
                })?;
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(FeedError::storage(format!("Failed to read: {}", e))),
        }
    }

    /// Checks if a key exists.
    fn exists(&self, cf_name: &str, key: &[u8]) -> Result<bool> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map(|v| v.is_some())
            .map_err(|e| FeedError::storage(format!("Failed to check key: {}", e)))
    }

    /// Iterates over entries with the given prefix in key order.
    ///
    /// The callback returns true to continue or false to stop.
    fn prefix_iterate<F>(&self, cf_name: &str, prefix: &[u8], mut callback: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> bool,
    {
        let cf = self.cf(cf_name)?;
        let iter = self.db.prefix_iterator_cf(&cf, prefix);

        for item in iter {
            match item {
                Ok((key, value)) => {
                    if !key.starts_with(prefix) {
                        break;
                    }
                    if !callback(&key, &value) {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Iterator error: {}", e);
                }
            }
        }
        Ok(())
    }

    fn read_counter(&self, key: &[u8]) -> Result<u64> {
        Ok(self.get::<u64>(CF_META, key)?.unwrap_or(0))
    }

    /// Adds to a running total. Callers hold the mutation lock.
    fn bump_counter(&self, key: &[u8], delta: u64) -> Result<()> {
        let next = self.read_counter(key)?.saturating_add(delta);
        self.put(CF_META, key, &next)
    }
}

impl FeedStore for RocksFeedStore {
    fn put_post(&self, post: &Post) -> Result<()> {
        let _guard = self.write_lock()?;
        self.put(CF_POSTS, post.id().as_bytes(), post)?;
        let cf = self.cf(CF_IDX_POSTS_CREATED)?;
        self.db
            .put_cf(&cf, post_index_key(post.created_at(), post.id()), [])
            .map_err(|e| FeedError::storage(format!("Failed to write post index: {}", e)))?;
        self.bump_counter(META_POSTS_TOTAL, 1)
    }

    fn get_post(&self, id: &str) -> Result<Option<Post>> {
        self.get(CF_POSTS, id.as_bytes())
    }

    fn list_posts(&self, limit: usize) -> Result<Vec<Post>> {
        // Two-phase read: collect ids from the sorted index, then load the
        // full records.
        let mut ids: Vec<String> = Vec::with_capacity(limit.min(MAX_POST_FETCH_LIMIT));
        self.prefix_iterate(CF_IDX_POSTS_CREATED, &[], |key, _| {
            if ids.len() >= limit {
                return false;
            }
            if key.len() > IDX_TS_LEN {
                if let Ok(id) = std::str::from_utf8(&key[IDX_TS_LEN..]) {
                    ids.push(id.to_string());
                }
            }
            ids.len() < limit
        })?;

        let mut posts = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.get_post(id)? {
                Some(post) => posts.push(post),
                None => warn!(post_id = %id, "Post index entry without record"),
            }
        }
        Ok(posts)
    }

    fn put_comment(&self, comment: &Comment) -> Result<()> {
        let _guard = self.write_lock()?;
        let key = comment_key(comment.post_id(), comment.created_at(), comment.id());
        self.put(CF_COMMENTS, &key, comment)?;
        self.bump_counter(META_COMMENTS_TOTAL, 1)
    }

    fn list_comments(&self, post_id: &str, limit: Option<usize>) -> Result<Vec<Comment>> {
        let mut comments = Vec::new();
        self.prefix_iterate(CF_COMMENTS, &comment_prefix(post_id), |_, value| {
            if limit.map_or(false, |cap| comments.len() >= cap) {
                return false;
            }
            match bincode::deserialize::<Comment>(value) {
                Ok(comment) => comments.push(comment),
                Err(e) => warn!("Failed to deserialize comment: {}", e),
            }
            limit.map_or(true, |cap| comments.len() < cap)
        })?;
        Ok(comments)
    }

    fn apply_like(&self, post_id: &str, client_key: &str, now_ms: u64) -> Result<LikeOutcome> {
        let _guard = self.write_lock()?;

        let mut post: Post = self
            .get(CF_POSTS, post_id.as_bytes())?
            .ok_or_else(|| FeedError::not_found(format!("Post {} not found", post_id)))?;

        let marker = like_key(post_id, client_key);
        if self.exists(CF_LIKES, &marker)? {
            return Ok(LikeOutcome::AlreadyLiked {
                likes: post.likes(),
            });
        }

        self.put(CF_LIKES, &marker, &now_ms)?;
        post.increment_likes();
        self.put(CF_POSTS, post_id.as_bytes(), &post)?;
        self.bump_counter(META_LIKES_TOTAL, 1)?;

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
        let _guard = self.write_lock()?;

        let previous: Option<RateLimitRecord> = self.get(CF_RATE_LIMITS, key.as_bytes())?;
        let decision = evaluate(previous, ceiling, window_ms, now_ms);
        if let RateLimitDecision::Allowed { record } = decision {
            self.put(CF_RATE_LIMITS, key.as_bytes(), &record)?;
        }
        Ok(decision)
    }

    fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            posts: self.read_counter(META_POSTS_TOTAL)?,
            comments: self.read_counter(META_COMMENTS_TOTAL)?,
            likes: self.read_counter(META_LIKES_TOTAL)?,
        })
    }
}

impl std::fmt::Debug for RocksFeedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksFeedStore")
            .field("db", &"RocksDB")
            .finish()
    }
}
