//! Shared constants for feed validation and limits.
//!
//! These constants are used by both the library and the server binary to
//! ensure consistent validation across all entry points.

// =============================================================================
// Content Size Limits
// =============================================================================

/// Minimum post content length in characters.
pub const MIN_POST_CONTENT_CHARS: usize = 5;

/// Maximum post content length in characters.
pub const MAX_POST_CONTENT_CHARS: usize = 1000;

/// Minimum comment content length in characters.
pub const MIN_COMMENT_CONTENT_CHARS: usize = 2;

/// Maximum comment content length in characters.
pub const MAX_COMMENT_CONTENT_CHARS: usize = 500;

/// Maximum display name length in characters.
pub const MAX_NAME_CHARS: usize = 64;

/// Display name stored when the submitter leaves the field empty.
pub const DEFAULT_DISPLAY_NAME: &str = "Anonim";

// =============================================================================
// Rate Limiting
// =============================================================================

/// Rolling window duration in milliseconds (one hour).
pub const RATE_LIMIT_WINDOW_MS: u64 = 60 * 60 * 1000;

/// Default ceiling for post creations per identity per window.
pub const DEFAULT_MAX_POSTS_PER_WINDOW: u32 = 5;

/// Default ceiling for comment creations per identity per window.
pub const DEFAULT_MAX_COMMENTS_PER_WINDOW: u32 = 10;

// =============================================================================
// Listing Limits
// =============================================================================

/// Default number of posts returned when the caller supplies no limit.
pub const DEFAULT_POST_FETCH_LIMIT: usize = 50;

/// Maximum number of posts returned in a single listing, regardless of the
/// caller-supplied limit.
pub const MAX_POST_FETCH_LIMIT: usize = 100;

// =============================================================================
// Identity
// =============================================================================

/// Length in hex characters of the truncated identity digest.
pub const IDENTITY_HASH_CHARS: usize = 16;

/// Length in hex characters of generated record identifiers.
pub const RECORD_ID_CHARS: usize = 32;
