//! Input validation and normalization for feed submissions.
//!
//! Raw submissions arrive as untrimmed strings with optional fields. This
//! module turns them into validated drafts: fields trimmed, defaults applied
//! (mood `curhat`, name `Anonim`), lengths and enum values checked. Drafts
//! carry text that has not yet been profanity-masked; masking happens in the
//! service layer after the rate-limit check.

use crate::error::{FeedError, Result};
use crate::feed::constants::{
    DEFAULT_DISPLAY_NAME, DEFAULT_POST_FETCH_LIMIT, MAX_COMMENT_CONTENT_CHARS, MAX_NAME_CHARS,
    MAX_POST_CONTENT_CHARS, MAX_POST_FETCH_LIMIT, MIN_COMMENT_CONTENT_CHARS,
    MIN_POST_CONTENT_CHARS,
};
use crate::feed::types::Mood;
use serde::Deserialize;

/// Raw post submission as received from the outside.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPost {
    /// Free-text content, untrimmed.
    pub content: String,
    /// Mood wire value; absent or blank selects the default.
    #[serde(default)]
    pub mood: Option<String>,
    /// Display name; absent or blank selects the default.
    #[serde(default)]
    pub name: Option<String>,
}

/// Raw comment submission as received from the outside.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewComment {
    /// Free-text content, untrimmed.
    pub content: String,
    /// Identifier of the post being commented on.
    #[serde(default)]
    pub post_id: String,
    /// Optional parent comment for threading; blank means none.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Display name; absent or blank selects the default.
    #[serde(default)]
    pub name: Option<String>,
}

/// A post submission that passed validation: trimmed, defaulted, in bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub content: String,
    pub mood: Mood,
    pub name: String,
}

/// A comment submission that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDraft {
    pub content: String,
    pub post_id: String,
    pub parent_id: Option<String>,
    pub name: String,
}

/// Validation functions for feed input.
pub struct Validator;

impl Validator {
    /// Validates and normalizes a post submission.
    pub fn validate_post(input: &NewPost) -> Result<PostDraft> {
        let content = input.content.trim().to_string();
        Self::check_no_null_bytes(&content)?;

        let content_chars = content.chars().count();
        if content_chars < MIN_POST_CONTENT_CHARS {
            return Err(FeedError::validation(format!(
                "Post content too short: minimum is {} characters",
                MIN_POST_CONTENT_CHARS
            )));
        }
        if content_chars > MAX_POST_CONTENT_CHARS {
            return Err(FeedError::validation(format!(
                "Post content too long: maximum is {} characters",
                MAX_POST_CONTENT_CHARS
            )));
        }

        let mood = Self::parse_mood(input.mood.as_deref())?;
        let name = Self::normalize_name(input.name.as_deref())?;

        Ok(PostDraft {
            content,
            mood,
            name,
        })
    }

    /// Validates and normalizes a comment submission.
    pub fn validate_comment(input: &NewComment) -> Result<CommentDraft> {
        let post_id = input.post_id.trim().to_string();
        if post_id.is_empty() {
            return Err(FeedError::validation("Comment must reference a post"));
        }

        let content = input.content.trim().to_string();
        Self::check_no_null_bytes(&content)?;

        let content_chars = content.chars().count();
        if content_chars < MIN_COMMENT_CONTENT_CHARS {
            return Err(FeedError::validation("Comment content too short"));
        }
        if content_chars > MAX_COMMENT_CONTENT_CHARS {
            return Err(FeedError::validation(format!(
                "Comment content too long: maximum is {} characters",
                MAX_COMMENT_CONTENT_CHARS
            )));
        }

        let parent_id = input
            .parent_id
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from);

        let name = Self::normalize_name(input.name.as_deref())?;

        Ok(CommentDraft {
            content,
            post_id,
            parent_id,
            name,
        })
    }

    /// Clamps a caller-supplied post listing limit to the allowed range,
    /// substituting the default when absent.
    pub fn clamp_fetch_limit(limit: Option<usize>) -> usize {
        limit
            .unwrap_or(DEFAULT_POST_FETCH_LIMIT)
            .clamp(1, MAX_POST_FETCH_LIMIT)
    }

    /// Parses a mood wire value, falling back to the default when absent
    /// or blank.
    fn parse_mood(raw: Option<&str>) -> Result<Mood> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Mood::default()),
            Some(value) => value.parse(),
        }
    }

    /// Trims a display name and applies the anonymous default; rejects
    /// over-long names and control characters.
    fn normalize_name(raw: Option<&str>) -> Result<String> {
        let trimmed = raw.map(str::trim).unwrap_or("");
        if trimmed.is_empty() {
            return Ok(DEFAULT_DISPLAY_NAME.to_string());
        }

        if trimmed.chars().count() > MAX_NAME_CHARS {
            return Err(FeedError::validation(format!(
                "Display name too long: maximum is {} characters",
                MAX_NAME_CHARS
            )));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(FeedError::validation(
                "Display name contains invalid control characters",
            ));
        }

        Ok(trimmed.to_string())
    }

    fn check_no_null_bytes(text: &str) -> Result<()> {
        if text.contains('\0') {
            return Err(FeedError::validation("Content contains null bytes"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_defaults_applied() {
        let input = NewPost {
            content: "  aku lg sedih banget hari ini  ".to_string(),
            mood: None,
            name: None,
        };
        let draft = Validator::validate_post(&input).unwrap();
        assert_eq!(draft.content, "aku lg sedih banget hari ini");
        assert_eq!(draft.mood, Mood::Curhat);
        assert_eq!(draft.name, "Anonim");
    }

    #[test]
    fn test_post_blank_fields_use_defaults() {
        let input = NewPost {
            content: "lima kata".to_string(),
            mood: Some("   ".to_string()),
            name: Some("".to_string()),
        };
        let draft = Validator::validate_post(&input).unwrap();
        assert_eq!(draft.mood, Mood::Curhat);
        assert_eq!(draft.name, "Anonim");
    }

    #[test]
    fn test_post_explicit_fields_kept() {
        let input = NewPost {
            content: "ada pertanyaan nih".to_string(),
            mood: Some("pertanyaan".to_string()),
            name: Some("  Budi ".to_string()),
        };
        let draft = Validator::validate_post(&input).unwrap();
        assert_eq!(draft.mood, Mood::Pertanyaan);
        assert_eq!(draft.name, "Budi");
    }

    #[test]
    fn test_post_content_bounds_after_trim() {
        let input = NewPost {
            content: "   abcd   ".to_string(),
            ..Default::default()
        };
        assert!(Validator::validate_post(&input).is_err());

        let over = NewPost {
            content: "x".repeat(MAX_POST_CONTENT_CHARS + 1),
            ..Default::default()
        };
        assert!(Validator::validate_post(&over).is_err());
    }

    #[test]
    fn test_post_unknown_mood_rejected() {
        let input = NewPost {
            content: "mood tidak dikenal".to_string(),
            mood: Some("bahagia".to_string()),
            name: None,
        };
        assert!(Validator::validate_post(&input).is_err());
    }

    #[test]
    fn test_post_name_with_control_chars_rejected() {
        let input = NewPost {
            content: "konten yang valid".to_string(),
            mood: None,
            name: Some("Budi\x01".to_string()),
        };
        assert!(Validator::validate_post(&input).is_err());
    }

    #[test]
    fn test_comment_validation() {
        let input = NewComment {
            content: " setuju ".to_string(),
            post_id: "p1".to_string(),
            parent_id: None,
            name: None,
        };
        let draft = Validator::validate_comment(&input).unwrap();
        assert_eq!(draft.content, "setuju");
        assert_eq!(draft.name, "Anonim");
        assert!(draft.parent_id.is_none());
    }

    #[test]
    fn test_comment_too_short_rejected() {
        let input = NewComment {
            content: "a".to_string(),
            post_id: "p1".to_string(),
            ..Default::default()
        };
        assert!(Validator::validate_comment(&input).is_err());
    }

    #[test]
    fn test_comment_requires_post_id() {
        let input = NewComment {
            content: "komentar valid".to_string(),
            post_id: "   ".to_string(),
            ..Default::default()
        };
        assert!(Validator::validate_comment(&input).is_err());
    }

    #[test]
    fn test_comment_blank_parent_becomes_none() {
        let input = NewComment {
            content: "balasan".to_string(),
            post_id: "p1".to_string(),
            parent_id: Some("   ".to_string()),
            name: None,
        };
        let draft = Validator::validate_comment(&input).unwrap();
        assert!(draft.parent_id.is_none());

        let with_parent = NewComment {
            parent_id: Some(" c9 ".to_string()),
            ..input
        };
        let draft = Validator::validate_comment(&with_parent).unwrap();
        assert_eq!(draft.parent_id.as_deref(), Some("c9"));
    }

    #[test]
    fn test_clamp_fetch_limit() {
        assert_eq!(Validator::clamp_fetch_limit(None), DEFAULT_POST_FETCH_LIMIT);
        assert_eq!(Validator::clamp_fetch_limit(Some(10)), 10);
        assert_eq!(Validator::clamp_fetch_limit(Some(0)), 1);
        assert_eq!(
            Validator::clamp_fetch_limit(Some(10_000)),
            MAX_POST_FETCH_LIMIT
        );
    }
}
