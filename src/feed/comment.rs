//! Comment entity for the anonymous feed.
//!
//! A comment belongs to exactly one post and may reference a parent comment
//! for threading. Comments are created once and never mutated; when listed
//! they are ordered by creation time ascending.

use crate::error::{FeedError, Result};
use crate::feed::constants::{
    MAX_COMMENT_CONTENT_CHARS, MAX_NAME_CHARS, MIN_COMMENT_CONTENT_CHARS,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A stored comment.
///
/// The `likes` field mirrors the post document shape; it is stored as zero
/// and there is currently no operation that increments it.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    id: String,
    post_id: String,
    content: String,
    parent_id: Option<String>,
    name: String,
    ip_hash: Option<String>,
    likes: u64,
    created_at: u64,
}

impl fmt::Debug for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Comment")
            .field("id", &self.id)
            .field("post_id", &self.post_id)
            .field("content_len", &self.content.len())
            .field("has_parent", &self.parent_id.is_some())
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl Comment {
    /// Creates a new comment with server-assigned defaults.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Content is shorter than 2 or longer than 500 characters
    /// - Name is empty or longer than 64 characters
    /// - The owning post id is empty
    pub fn new(
        id: String,
        post_id: String,
        content: String,
        parent_id: Option<String>,
        name: String,
        ip_hash: Option<String>,
        created_at: u64,
    ) -> Result<Self> {
        if post_id.is_empty() {
            return Err(FeedError::validation("Comment must reference a post"));
        }

        let content_chars = content.chars().count();
        if content_chars < MIN_COMMENT_CONTENT_CHARS {
            return Err(FeedError::validation("Comment content too short"));
        }
        if content_chars > MAX_COMMENT_CONTENT_CHARS {
            return Err(FeedError::validation(format!(
                "Comment content too long: {} characters, maximum is {}",
                content_chars, MAX_COMMENT_CONTENT_CHARS
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
            post_id,
            content,
            parent_id,
            name,
            ip_hash,
            likes: 0,
            created_at,
        })
    }

    /// Returns the comment identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the identifier of the owning post.
    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    /// Returns the stored (masked) content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the parent comment id for threaded replies, if any.
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the hashed submitter identity, if any.
    pub fn ip_hash(&self) -> Option<&str> {
        self.ip_hash.as_deref()
    }

    /// Returns the like count (currently always zero).
    pub fn likes(&self) -> u64 {
        self.likes
    }

    /// Returns the creation timestamp in milliseconds.
    pub fn created_at(&self) -> u64 {
        self.created_at
    }
}
