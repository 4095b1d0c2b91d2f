//! Feed-specific types shared across the crate.
//!
//! This module contains the small value types used by entities, storage, and
//! the service layer:
//! - `Mood`: category tag on a post
//! - `PostStatus`: moderation status on a post
//! - timestamp and identifier helpers

use crate::error::{FeedError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category tag on a post, used for display grouping.
///
/// The wire form is the lowercase Indonesian term; these values are part of
/// the stored data contract and are not translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Mood {
    /// Venting / sharing feelings. The default when no mood is supplied.
    Curhat = 1,
    /// A question to other readers.
    Pertanyaan = 2,
    /// A suggestion.
    Saran = 3,
    /// Praise or appreciation.
    Pujian = 4,
}

impl Mood {
    /// Returns the lowercase wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Curhat => "curhat",
            Mood::Pertanyaan => "pertanyaan",
            Mood::Saran => "saran",
            Mood::Pujian => "pujian",
        }
    }
}

impl Default for Mood {
    fn default() -> Self {
        Mood::Curhat
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Mood {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "curhat" => Ok(Mood::Curhat),
            "pertanyaan" => Ok(Mood::Pertanyaan),
            "saran" => Ok(Mood::Saran),
            "pujian" => Ok(Mood::Pujian),
            other => Err(FeedError::validation(format!("Unknown mood: {}", other))),
        }
    }
}

/// Moderation status on a post.
///
/// Every post is stored as `Published`; `Hidden` is reserved for moderation
/// and is currently never written. Listings do not filter on this field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum PostStatus {
    /// Visible in listings.
    Published = 1,
    /// Soft-hidden by moderation.
    Hidden = 2,
}

impl Default for PostStatus {
    fn default() -> Self {
        PostStatus::Published
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostStatus::Published => write!(f, "published"),
            PostStatus::Hidden => write!(f, "hidden"),
        }
    }
}

/// Returns the current Unix timestamp in milliseconds.
pub fn current_timestamp_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}

/// Formats a millisecond timestamp as an ISO-8601 string in UTC.
///
/// Returns `None` when the timestamp cannot be represented, which the view
/// layer surfaces as `null`.
pub fn to_iso8601(timestamp_ms: u64) -> Option<String> {
    chrono::DateTime::from_timestamp_millis(timestamp_ms as i64)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
}

/// Generates a random record identifier (32 hex characters).
pub fn generate_record_id() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let random_bytes: [u8; 16] = rng.gen();
    hex::encode(random_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_wire_form_roundtrip() {
        for mood in [Mood::Curhat, Mood::Pertanyaan, Mood::Saran, Mood::Pujian] {
            assert_eq!(mood.as_str().parse::<Mood>().unwrap(), mood);
        }
    }

    #[test]
    fn test_mood_parse_is_case_insensitive() {
        assert_eq!("Curhat".parse::<Mood>().unwrap(), Mood::Curhat);
        assert_eq!("  PUJIAN ".parse::<Mood>().unwrap(), Mood::Pujian);
    }

    #[test]
    fn test_mood_parse_rejects_unknown() {
        assert!("senang".parse::<Mood>().is_err());
        assert!("".parse::<Mood>().is_err());
    }

    #[test]
    fn test_mood_default_is_curhat() {
        assert_eq!(Mood::default(), Mood::Curhat);
    }

    #[test]
    fn test_mood_json_wire_form() {
        let json = serde_json::to_string(&Mood::Pertanyaan).unwrap();
        assert_eq!(json, "\"pertanyaan\"");
        let parsed: Mood = serde_json::from_str("\"saran\"").unwrap();
        assert_eq!(parsed, Mood::Saran);
    }

    #[test]
    fn test_to_iso8601_known_epoch() {
        // 2024-01-01 00:00:00 UTC
        let formatted = to_iso8601(1_704_067_200_000).unwrap();
        assert_eq!(formatted, "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_to_iso8601_preserves_millis() {
        let formatted = to_iso8601(1_704_067_200_123).unwrap();
        assert!(formatted.ends_with(".123Z"));
    }

    #[test]
    fn test_record_ids_are_hex_and_unique() {
        let a = generate_record_id();
        let b = generate_record_id();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_timestamps_are_monotonic_enough() {
        let t1 = current_timestamp_millis();
        let t2 = current_timestamp_millis();
        assert!(t2 >= t1);
    }
}
