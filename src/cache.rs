//! Invalidation-driven cache for the rendered post listing.
//!
//! The feed serves one hot read, the post listing, and every write must be
//! visible on the next read. [`ListingCache`] holds the most recent listing
//! result keyed by its query fingerprint and stamps it with a generation
//! number. Writers call [`invalidate`](ListingCache::invalidate) to bump the
//! generation, which orphans whatever is cached without touching it.
//!
//! Readers snapshot the generation before going to the store and hand it
//! back when caching the result. A write that lands between those two points
//! bumps the generation and the stale result is rejected at `put` time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

struct CacheEntry<T> {
    generation: u64,
    key: String,
    value: T,
}

/// Single-entry cache invalidated by generation bumps.
pub struct ListingCache<T> {
    generation: AtomicU64,
    entry: Mutex<Option<CacheEntry<T>>>,
}

impl<T: Clone> ListingCache<T> {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            entry: Mutex::new(None),
        }
    }

    /// Current generation; pass to [`put`](Self::put) after reading through
    /// to the store.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Returns the cached value for `key`, if it is still current.
    pub fn get(&self, key: &str) -> Option<T> {
        let guard = self.entry.lock().ok()?;
        let entry = guard.as_ref()?;
        if entry.generation == self.generation() && entry.key == key {
            return Some(entry.value.clone());
        }
        None
    }

    /// Caches `value` under `key`, unless a write invalidated `generation`
    /// in the meantime.
    pub fn put(&self, key: &str, value: T, generation: u64) {
        if generation != self.generation() {
            return;
        }
        if let Ok(mut guard) = self.entry.lock() {
            *guard = Some(CacheEntry {
                generation,
                key: key.to_string(),
                value,
            });
        }
    }

    /// Drops whatever is cached by moving to a new generation.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

impl<T: Clone> Default for ListingCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_after_put() {
        let cache = ListingCache::new();
        let generation = cache.generation();
        cache.put("limit=50", vec![1, 2, 3], generation);

        assert_eq!(cache.get("limit=50"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_miss_on_different_key() {
        let cache = ListingCache::new();
        let generation = cache.generation();
        cache.put("limit=50", vec![1], generation);

        assert_eq!(cache.get("limit=10"), None);
    }

    #[test]
    fn test_invalidate_orphans_entry() {
        let cache = ListingCache::new();
        let generation = cache.generation();
        cache.put("limit=50", vec![1], generation);

        cache.invalidate();
        assert_eq!(cache.get("limit=50"), None);
    }

    #[test]
    fn test_stale_put_rejected() {
        let cache = ListingCache::new();
        let generation = cache.generation();

        // A write slips in between the store read and the cache fill.
        cache.invalidate();
        cache.put("limit=50", vec![1], generation);

        assert_eq!(cache.get("limit=50"), None);
    }

    #[test]
    fn test_newer_key_replaces_older() {
        let cache = ListingCache::new();
        let generation = cache.generation();
        cache.put("limit=50", vec![1], generation);
        cache.put("limit=10", vec![2], generation);

        assert_eq!(cache.get("limit=50"), None);
        assert_eq!(cache.get("limit=10"), Some(vec![2]));
    }
}
