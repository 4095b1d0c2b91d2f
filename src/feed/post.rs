//! Post entity for the anonymous feed.
//!
//! A post is a short piece of free text tagged with a [`Mood`]. Posts are
//! created once and never mutated except for the like counter, which only
//! increases. The stored content is always the profanity-masked form of the
//! submitted text; masking happens before construction.

use crate::error::{FeedError, Result};
use crate::feed::constants::{MAX_NAME_CHARS, MAX_POST_CONTENT_CHARS, MIN_POST_CONTENT_CHARS};
use crate::feed::types::{Mood, PostStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A stored post.
///
/// Serialized with bincode for storage. The `ip_hash` field is a truncated
/// one-way digest of the submitter's address, kept for abuse tracing; it is
/// never exposed through read views.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    id: String,
    content: String,
    mood: Mood,
    name: String,
    ip_hash: Option<String>,
    likes: u64,
    created_at: u64,
    status: PostStatus,
}

impl fmt::Debug for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Post")
            .field("id", &self.id)
            .field("content_len", &self.content.len())
            .field("mood", &self.mood)
            .field("likes", &self.likes)
            .field("created_at", &self.created_at)
            .field("has_ip_hash", &self.ip_hash.is_some())
            .finish()
    }
}

impl Post {
    /// Creates a new post with server-assigned defaults (zero likes,
    /// published status).
    ///
    /// # Errors
    /// Returns an error if:
    /// - Content is shorter than 5 or longer than 1000 characters
    /// - Name is empty or longer than 64 characters
    pub fn new(
        id: String,
        content: String,
        mood: Mood,
        name: String,
        ip_hash: Option<String>,
        created_at: u64,
    ) -> Result<Self> {
        let content_chars = content.chars().count();
        if content_chars < MIN_POST_CONTENT_CHARS {
            return Err(FeedError::validation(format!(
                "Post content too short: {} characters, minimum is {}",
                content_chars, MIN_POST_CONTENT_CHARS
            )));
        }
        if content_chars > MAX_POST_CONTENT_CHARS {
            return Err(FeedError::validation(format!(
                "Post content too long: {} characters, maximum is {}",
                content_chars, MAX_POST_CONTENT_CHARS
            )));
        }

        let name_chars = name.chars().count();
        if name_chars == 0 {
            return Err(FeedError::validation("Display name cannot be empty"));
        }
        if name_chars > MAX_NAME_CHARS {
            return Err(FeedError::validation(format!(
                "Display name too long: {} characters, maximum is {}",
                name_chars, MAX_NAME_CHARS
            )));
        }

        Ok(Self {
            id,
            content,
            mood,
            name,
            ip_hash,
            likes: 0,
            created_at,
            status: PostStatus::Published,
        })
    }

    /// Returns the post identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the stored (masked) content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the mood tag.
    pub fn mood(&self) -> Mood {
        self.mood
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the hashed submitter identity, if any.
    pub fn ip_hash(&self) -> Option<&str> {
        self.ip_hash.as_deref()
    }

    /// Returns the like count.
    pub fn likes(&self) -> u64 {
        self.likes
    }

    /// Returns the creation timestamp in milliseconds.
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Returns the moderation status.
    pub fn status(&self) -> PostStatus {
        self.status
    }

    /// Increments the like counter. The counter only ever increases.
    pub fn increment_likes(&mut self) {
        self.likes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post(content: &str) -> Result<Post> {
        Post::new(
            "a1b2c3".to_string(),
            content.to_string(),
            Mood::Curhat,
            "Anonim".to_string(),
            Some("deadbeef01234567".to_string()),
            1_704_067_200_000,
        )
    }

    #[test]
    fn test_post_creation_defaults() {
        let post = sample_post("hari ini hujan deras").unwrap();
        assert_eq!(post.likes(), 0);
        assert_eq!(post.status(), PostStatus::Published);
        assert_eq!(post.mood(), Mood::Curhat);
        assert_eq!(post.name(), "Anonim");
        assert_eq!(post.ip_hash(), Some("deadbeef01234567"));
    }

    #[test]
    fn test_post_content_too_short_rejected() {
        assert!(sample_post("abcd").is_err());
        assert!(sample_post("").is_err());
    }

    #[test]
    fn test_post_content_at_bounds() {
        assert!(sample_post("abcde").is_ok());
        let max = "x".repeat(MAX_POST_CONTENT_CHARS);
        assert!(sample_post(&max).is_ok());
        let over = "x".repeat(MAX_POST_CONTENT_CHARS + 1);
        assert!(sample_post(&over).is_err());
    }

    #[test]
    fn test_post_content_counts_chars_not_bytes() {
        // Five multibyte characters are five characters, not ten bytes.
        let content = "ééééé";
        assert_eq!(content.chars().count(), 5);
        assert!(sample_post(content).is_ok());
    }

    #[test]
    fn test_post_name_bounds() {
        let long_name = "n".repeat(MAX_NAME_CHARS + 1);
        let result = Post::new(
            "id".to_string(),
            "cukup panjang kok".to_string(),
            Mood::Saran,
            long_name,
            None,
            0,
        );
        assert!(result.is_err());

        let empty_name = Post::new(
            "id".to_string(),
            "cukup panjang kok".to_string(),
            Mood::Saran,
            String::new(),
            None,
            0,
        );
        assert!(empty_name.is_err());
    }

    #[test]
    fn test_increment_likes() {
        let mut post = sample_post("besok pasti lebih baik").unwrap();
        post.increment_likes();
        post.increment_likes();
        assert_eq!(post.likes(), 2);
    }

    #[test]
    fn test_post_serialization_roundtrip() {
        let post = sample_post("serialization check content").unwrap();
        let bytes = bincode::serialize(&post).expect("Failed to serialize");
        let decoded: Post = bincode::deserialize(&bytes).expect("Failed to deserialize");
        assert_eq!(post, decoded);
    }
}
