//! Per-client rate limiting for feed writes.
//!
//! Each (client, action) pair gets a fixed one-hour window tracked by a
//! small persisted record. The decision logic lives in [`evaluate`], a pure
//! function over the previous record and the current time; stores call it
//! inside their own atomic read-modify-write section so two concurrent
//! submissions cannot both observe the same count.
//!
//! Window semantics:
//! - The first action opens a window anchored at its own timestamp.
//! - Later actions inside the window increment the count but never move the
//!   anchor, so a window always closes `window_ms` after the action that
//!   opened it.
//! - An action after the window has passed resets the record to a fresh
//!   window with count 1.
//! - An action at the ceiling is denied and leaves the record untouched,
//!   including its anchor.
//!
//! Clients without a resolvable identity are allowed through. Denying them
//! would collapse every anonymous client into one shared bucket.

use crate::error::{FeedError, Result};
use crate::feed::constants::{
    DEFAULT_MAX_COMMENTS_PER_WINDOW, DEFAULT_MAX_POSTS_PER_WINDOW, RATE_LIMIT_WINDOW_MS,
};
use crate::feed::types::current_timestamp_millis;
use crate::store::FeedStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Write actions that are rate limited independently of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitAction {
    Post,
    Comment,
}

impl RateLimitAction {
    /// Stable name used in rate-limit record keys and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitAction::Post => "post",
            RateLimitAction::Comment => "comment",
        }
    }
}

impl fmt::Display for RateLimitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ceilings and window length for the limiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Window length in milliseconds.
    pub window_ms: u64,
    /// Maximum posts per client per window.
    pub max_posts: u32,
    /// Maximum comments per client per window.
    pub max_comments: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: RATE_LIMIT_WINDOW_MS,
            max_posts: DEFAULT_MAX_POSTS_PER_WINDOW,
            max_comments: DEFAULT_MAX_COMMENTS_PER_WINDOW,
        }
    }
}

impl RateLimitConfig {
    /// Builds a config from the environment, falling back to defaults for
    /// absent or unparseable values.
    ///
    /// Recognized variables: `RATE_LIMIT_MAX_POSTS`, `RATE_LIMIT_MAX_COMMENTS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            window_ms: defaults.window_ms,
            max_posts: env_u32("RATE_LIMIT_MAX_POSTS").unwrap_or(defaults.max_posts),
            max_comments: env_u32("RATE_LIMIT_MAX_COMMENTS").unwrap_or(defaults.max_comments),
        }
    }

    /// Ceiling applying to the given action.
    pub fn ceiling_for(&self, action: RateLimitAction) -> u32 {
        match action {
            RateLimitAction::Post => self.max_posts,
            RateLimitAction::Comment => self.max_comments,
        }
    }
}

fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Persisted window state for one (client, action) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRecord {
    /// Actions counted in the current window.
    pub count: u32,
    /// Unix millis of the action that opened the window.
    pub window_start_ms: u64,
}

/// Outcome of evaluating one action against a window record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// The action may proceed; `record` is the state to persist.
    Allowed { record: RateLimitRecord },
    /// The ceiling is reached; nothing may be persisted.
    Denied { retry_after_ms: u64 },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }
}

/// Decides whether an action at `now_ms` passes the limiter.
///
/// Pure function of its inputs. Stores must call it with the freshest record
/// and persist the returned state in the same atomic section, otherwise two
/// racing actions can both be admitted at the ceiling.
pub fn evaluate(
    previous: Option<RateLimitRecord>,
    ceiling: u32,
    window_ms: u64,
    now_ms: u64,
) -> RateLimitDecision {
    let fresh = RateLimitRecord {
        count: 1,
        window_start_ms: now_ms,
    };

    let Some(record) = previous else {
        return RateLimitDecision::Allowed { record: fresh };
    };

    // Strictly greater: an action landing exactly at the window edge still
    // counts against the old window.
    let elapsed = now_ms.saturating_sub(record.window_start_ms);
    if elapsed > window_ms {
        return RateLimitDecision::Allowed { record: fresh };
    }

    if record.count >= ceiling {
        let retry_after_ms = (record.window_start_ms + window_ms).saturating_sub(now_ms);
        return RateLimitDecision::Denied { retry_after_ms };
    }

    RateLimitDecision::Allowed {
        record: RateLimitRecord {
            count: record.count + 1,
            window_start_ms: record.window_start_ms,
        },
    }
}

/// Storage key for one (client, action) pair.
pub fn rate_limit_key(identity: &str, action: RateLimitAction) -> String {
    format!("{}_{}", identity, action.as_str())
}

/// Applies the configured ceilings through a [`FeedStore`].
pub struct RateLimiter {
    store: Arc<dyn FeedStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn FeedStore>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Checks an action for the given client at the current time.
    ///
    /// Returns `Ok(())` when the action is admitted and
    /// [`FeedError::RateLimited`] when the client has hit the ceiling.
    pub fn check(&self, identity: Option<&str>, action: RateLimitAction) -> Result<()> {
        self.check_at(identity, action, current_timestamp_millis())
    }

    /// Clock-injectable variant of [`check`](Self::check).
    pub fn check_at(
        &self,
        identity: Option<&str>,
        action: RateLimitAction,
        now_ms: u64,
    ) -> Result<()> {
        let Some(identity) = identity.filter(|id| !id.trim().is_empty()) else {
            debug!(
                action = action.as_str(),
                "Rate limit skipped for client without identity"
            );
            return Ok(());
        };

        let key = rate_limit_key(identity, action);
        let ceiling = self.config.ceiling_for(action);
        let decision = self
            .store
            .apply_rate_limit(&key, ceiling, self.config.window_ms, now_ms)?;

        match decision {
            RateLimitDecision::Allowed { record } => {
                debug!(
                    action = action.as_str(),
                    count = record.count,
                    ceiling,
                    "Rate limit check passed"
                );
                Ok(())
            }
            RateLimitDecision::Denied { retry_after_ms } => {
                warn!(
                    action = action.as_str(),
                    ceiling, retry_after_ms, "Rate limit ceiling reached"
                );
                let message = match action {
                    RateLimitAction::Post => {
                        "Too many posts. Please wait a while before posting again"
                    }
                    RateLimitAction::Comment => {
                        "Too many comments. Please wait a while before commenting again"
                    }
                };
                Err(FeedError::rate_limited(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryFeedStore;

    const WINDOW: u64 = RATE_LIMIT_WINDOW_MS;

    #[test]
    fn test_first_action_opens_window() {
        let decision = evaluate(None, 5, WINDOW, 1_000);
        assert_eq!(
            decision,
            RateLimitDecision::Allowed {
                record: RateLimitRecord {
                    count: 1,
                    window_start_ms: 1_000,
                }
            }
        );
    }

    #[test]
    fn test_increment_keeps_window_anchor() {
        let prev = RateLimitRecord {
            count: 2,
            window_start_ms: 1_000,
        };
        let decision = evaluate(Some(prev), 5, WINDOW, 1_000 + WINDOW / 2);
        assert_eq!(
            decision,
            RateLimitDecision::Allowed {
                record: RateLimitRecord {
                    count: 3,
                    window_start_ms: 1_000,
                }
            }
        );
    }

    #[test]
    fn test_denied_at_ceiling() {
        let prev = RateLimitRecord {
            count: 5,
            window_start_ms: 1_000,
        };
        let decision = evaluate(Some(prev), 5, WINDOW, 2_000);
        assert_eq!(
            decision,
            RateLimitDecision::Denied {
                retry_after_ms: 1_000 + WINDOW - 2_000,
            }
        );
    }

    #[test]
    fn test_denied_is_stateless() {
        // Evaluating the same record twice after a denial gives the same
        // answer; denial must not consume anything.
        let prev = RateLimitRecord {
            count: 5,
            window_start_ms: 1_000,
        };
        let first = evaluate(Some(prev), 5, WINDOW, 2_000);
        let second = evaluate(Some(prev), 5, WINDOW, 2_000);
        assert_eq!(first, second);
    }

    #[test]
    fn test_window_edge_is_inclusive() {
        let prev = RateLimitRecord {
            count: 5,
            window_start_ms: 1_000,
        };
        // Exactly window_ms later still belongs to the old window.
        let at_edge = evaluate(Some(prev), 5, WINDOW, 1_000 + WINDOW);
        assert!(!at_edge.is_allowed());

        // One millisecond past the edge opens a fresh window.
        let past_edge = evaluate(Some(prev), 5, WINDOW, 1_000 + WINDOW + 1);
        assert_eq!(
            past_edge,
            RateLimitDecision::Allowed {
                record: RateLimitRecord {
                    count: 1,
                    window_start_ms: 1_000 + WINDOW + 1,
                }
            }
        );
    }

    #[test]
    fn test_expired_window_resets_even_below_ceiling() {
        let prev = RateLimitRecord {
            count: 3,
            window_start_ms: 1_000,
        };
        let decision = evaluate(Some(prev), 5, WINDOW, 1_000 + WINDOW + 500);
        assert_eq!(
            decision,
            RateLimitDecision::Allowed {
                record: RateLimitRecord {
                    count: 1,
                    window_start_ms: 1_000 + WINDOW + 500,
                }
            }
        );
    }

    #[test]
    fn test_clock_regression_does_not_reset() {
        let prev = RateLimitRecord {
            count: 5,
            window_start_ms: 10_000,
        };
        // A clock that moved backwards must not be read as an expired window.
        let decision = evaluate(Some(prev), 5, WINDOW, 9_000);
        assert!(!decision.is_allowed());
    }

    #[test]
    fn test_limiter_counts_per_action() {
        let store = Arc::new(MemoryFeedStore::new());
        let limiter = RateLimiter::new(
            store,
            RateLimitConfig {
                window_ms: WINDOW,
                max_posts: 2,
                max_comments: 3,
            },
        );

        let now = 50_000;
        assert!(limiter
            .check_at(Some("deadbeef"), RateLimitAction::Post, now)
            .is_ok());
        assert!(limiter
            .check_at(Some("deadbeef"), RateLimitAction::Post, now + 1)
            .is_ok());
        let denied = limiter.check_at(Some("deadbeef"), RateLimitAction::Post, now + 2);
        assert!(matches!(denied, Err(FeedError::RateLimited(_))));

        // Comments are tracked independently of posts.
        assert!(limiter
            .check_at(Some("deadbeef"), RateLimitAction::Comment, now + 3)
            .is_ok());
    }

    #[test]
    fn test_limiter_is_per_client() {
        let store = Arc::new(MemoryFeedStore::new());
        let limiter = RateLimiter::new(
            store,
            RateLimitConfig {
                window_ms: WINDOW,
                max_posts: 1,
                max_comments: 1,
            },
        );

        assert!(limiter
            .check_at(Some("client-a"), RateLimitAction::Post, 1_000)
            .is_ok());
        assert!(limiter
            .check_at(Some("client-a"), RateLimitAction::Post, 1_001)
            .is_err());
        assert!(limiter
            .check_at(Some("client-b"), RateLimitAction::Post, 1_002)
            .is_ok());
    }

    #[test]
    fn test_missing_identity_fails_open() {
        let store = Arc::new(MemoryFeedStore::new());
        let limiter = RateLimiter::new(
            store,
            RateLimitConfig {
                window_ms: WINDOW,
                max_posts: 0,
                max_comments: 0,
            },
        );

        // Unknown clients are admitted no matter the ceiling. An identified
        // client still gets the window-opening request and is held to the
        // zero ceiling from the second one.
        assert!(limiter
            .check_at(None, RateLimitAction::Post, 1_000)
            .is_ok());
        assert!(limiter
            .check_at(Some("  "), RateLimitAction::Post, 1_000)
            .is_ok());
        assert!(limiter
            .check_at(Some("abc123"), RateLimitAction::Post, 1_000)
            .is_ok());
        assert!(limiter
            .check_at(Some("abc123"), RateLimitAction::Post, 1_001)
            .is_err());
    }

    #[test]
    fn test_rate_limit_key_format() {
        assert_eq!(
            rate_limit_key("a1b2c3", RateLimitAction::Post),
            "a1b2c3_post"
        );
        assert_eq!(
            rate_limit_key("a1b2c3", RateLimitAction::Comment),
            "a1b2c3_comment"
        );
    }
}
