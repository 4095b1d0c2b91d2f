//! Error types for feed operations.

use thiserror::Error;

/// Result type alias for feed operations.
pub type Result<T> = std::result::Result<T, FeedError>;

/// Main error type for feed operations.
#[derive(Error, Debug)]
pub enum FeedError {
    /// Input validation errors (shape, length, enum violations)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Rate limit ceiling reached for an identity and action type
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Persistence gateway errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FeedError {
    /// Creates a new validation error.
    pub fn validation<T: ToString>(msg: T) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Creates a new rate-limited error.
    pub fn rate_limited<T: ToString>(msg: T) -> Self {
        Self::RateLimited(msg.to_string())
    }

    /// Creates a new not-found error.
    pub fn not_found<T: ToString>(msg: T) -> Self {
        Self::NotFound(msg.to_string())
    }

    /// Creates a new storage error.
    pub fn storage<T: ToString>(msg: T) -> Self {
        Self::Storage(msg.to_string())
    }

    /// Creates a new serialization error.
    pub fn serialization<T: ToString>(msg: T) -> Self {
        Self::Serialization(msg.to_string())
    }

    /// Creates a new configuration error.
    pub fn config<T: ToString>(msg: T) -> Self {
        Self::Config(msg.to_string())
    }

    /// Returns true if the error is caused by the caller's input rather
    /// than by the service itself.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::RateLimited(_) | Self::NotFound(_)
        )
    }
}
