//! Client identity hashing.
//!
//! Raw caller identifiers, network addresses and device tokens alike, never
//! reach storage. They are hashed with SHA3-256 and truncated to a short hex
//! prefix that is stable for the same input but useless for recovering it.
//! The hash keys rate-limit records and like markers, and is stored
//! alongside posts for abuse follow-up.

use crate::feed::constants::IDENTITY_HASH_CHARS;
use sha3::{Digest, Sha3_256};

/// Hashes a caller identifier into a short stable key.
///
/// Returns `None` when the input is empty or whitespace, which callers
/// treat as an unknown client.
pub fn hash_identity(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut hasher = Sha3_256::new();
    hasher.update(trimmed.as_bytes());
    let mut encoded = hex::encode(hasher.finalize());
    encoded.truncate(IDENTITY_HASH_CHARS);
    Some(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable() {
        let first = hash_identity("203.0.113.7").unwrap();
        let second = hash_identity("203.0.113.7").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_hash_is_truncated_hex() {
        let hash = hash_identity("198.51.100.23").unwrap();
        assert_eq!(hash.len(), IDENTITY_HASH_CHARS);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_distinct_addresses_differ() {
        let a = hash_identity("10.0.0.1").unwrap();
        let b = hash_identity("10.0.0.2").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_address_yields_none() {
        assert!(hash_identity("").is_none());
        assert!(hash_identity("   ").is_none());
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        assert_eq!(hash_identity(" 10.0.0.1 "), hash_identity("10.0.0.1"));
    }
}
