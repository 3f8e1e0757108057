#![forbid(unsafe_code)]

//! Content-addressed result cache with TTL and capacity eviction
//!
//! The analyzer keys cached results by the SHA-256 of the artifact content
//! combined with the policy text and persona prompt, so any change to the
//! inputs yields a fresh key. Entries expire after a TTL and the map is
//! bounded; when full, the oldest entry by insertion time is evicted.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Default maximum number of cached entries
pub const DEFAULT_MAX_SIZE: usize = 1000;

/// Default entry time-to-live
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Derive the cache key for one artifact under the given analysis inputs
///
/// The combined bytes are hashed, never concatenated field names, so keys
/// cannot cross-contaminate between artifacts or policy sets.
pub fn cache_key(content: &str, policies_text: &str, persona_prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.update(policies_text.as_bytes());
    hasher.update(persona_prompt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Best-effort cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
}

struct CacheEntry<V> {
    value: V,
    created_at: Instant,
}

/// A concurrent in-memory cache from opaque key strings to values
///
/// Reads and writes may race; a `get` may or may not observe a concurrent
/// `set`. The map never returns a value for the wrong key and never panics
/// under concurrent access. Stale entries are removed opportunistically on
/// access.
pub struct ResultCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    max_size: usize,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> ResultCache<V> {
    /// Create a cache with the given capacity bound and TTL
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_size: max_size.max(1),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a key, returning `None` for absent, expired, or evicted entries
    pub fn get(&self, key: &str) -> Option<V> {
        let stale = {
            let entries = self.entries.read().expect("cache lock poisoned");
            match entries.get(key) {
                Some(entry) if entry.created_at.elapsed() <= self.ttl => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.value.clone());
                }
                Some(_) => true,
                None => false,
            }
        };

        if stale {
            let mut entries = self.entries.write().expect("cache lock poisoned");
            // Re-check under the write lock; a concurrent set may have refreshed it
            if let Some(entry) = entries.get(key) {
                if entry.created_at.elapsed() <= self.ttl {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.value.clone());
                }
                entries.remove(key);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Insert or overwrite a key, evicting the oldest entry when full
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let mut entries = self.entries.write().expect("cache lock poisoned");
        entries.insert(
            key,
            CacheEntry {
                value,
                created_at: Instant::now(),
            },
        );

        while entries.len() > self.max_size {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.created_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => entries.remove(&key),
                None => break,
            };
        }
    }

    /// Drop all entries; counters are preserved
    pub fn clear(&self) {
        self.entries.write().expect("cache lock poisoned").clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.read().expect("cache lock poisoned").len(),
            max_size: self.max_size,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl<V: Clone> Default for ResultCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE, DEFAULT_TTL)
    }
}
