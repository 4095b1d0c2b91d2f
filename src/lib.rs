//! # KeluhKesah - Anonymous Confession Feed
//!
//! Core library for an anonymous social feed: short mood-tagged posts,
//! threaded comments, and per-client likes, with content moderation and
//! per-client rate limiting applied before anything is persisted.
//!
//! ## Features
//!
//! - **Anonymous by default**: submissions need no account; the display name
//!   falls back to `Anonim` and client addresses are stored only as short
//!   one-way hashes
//! - **Moderated content**: a fixed profanity list is masked in every post
//!   and comment before persistence
//! - **Abuse limits**: fixed one-hour rate windows per client and action,
//!   enforced through an atomic store update
//! - **Pluggable persistence**: the same service runs against RocksDB or an
//!   in-memory store via the [`store::FeedStore`] trait
//!
//! ## Examples
//!
//! ### Posting to an in-memory feed
//!
//! ```rust
//! use keluhkesah::ratelimit::RateLimitConfig;
//! use keluhkesah::service::FeedService;
//! use keluhkesah::store::MemoryFeedStore;
//! use keluhkesah::validation::NewPost;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = FeedService::new(Arc::new(MemoryFeedStore::new()), RateLimitConfig::default());
//!
//! let submission = NewPost {
//!     content: "hari ini berat banget rasanya".to_string(),
//!     mood: Some("curhat".to_string()),
//!     name: None,
//! };
//! let post = service.create_post(&submission, Some("203.0.113.7"))?;
//! assert_eq!(post.name, "Anonim");
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod feed;
pub mod identity;
pub mod moderation;
pub mod ratelimit;
pub mod service;
pub mod store;
pub mod validation;

pub use error::{FeedError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
