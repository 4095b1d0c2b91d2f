//! Domain model for the anonymous feed.
//!
//! Entities are plain data with server-assigned fields; all free text is
//! profanity-masked before an entity is constructed.
//!
//! ## Hierarchy
//!
//! ```text
//! Post
//!  ├── Comment
//!  │       └── Comment (threaded reply via parent_id)
//!  └── like marker (one per client id)
//! ```
//!
//! Posts list newest-first, comments oldest-first. Like markers are the
//! source of truth for "has this client already liked this post"; the post's
//! like counter tracks their count.

pub mod comment;
pub mod constants;
pub mod post;
pub mod types;

pub use comment::Comment;
pub use post::Post;
pub use types::{current_timestamp_millis, generate_record_id, to_iso8601, Mood, PostStatus};
