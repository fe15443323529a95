//! LRU cache of compiled wildcard patterns
//!
//! Shared between threads; every operation takes the internal lock for the
//! duration of a single LRU lookup or insert.

use super::pattern::CompiledPattern;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Bounded map from pattern text to its compiled form
pub struct PatternCache {
    cache: Mutex<LruCache<String, Arc<CompiledPattern>>>,
}

impl PatternCache {
    /// Create a new pattern cache with given capacity
    pub fn new(capacity: NonZeroUsize) -> Self {
        PatternCache {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Get a compiled pattern, marking it most recently used
    pub fn get(&self, pattern: &str) -> Option<Arc<CompiledPattern>> {
        self.cache.lock().get(pattern).cloned()
    }

    /// Insert unless another caller got there first
    ///
    /// Returns whichever entry ends up cached, so all callers share one
    /// compiled form per pattern string.
    pub fn get_or_insert(&self, compiled: CompiledPattern) -> Arc<CompiledPattern> {
        let mut cache = self.cache.lock();
        if let Some(existing) = cache.get(compiled.source()) {
            return Arc::clone(existing);
        }

        let key = compiled.source().to_string();
        let entry = Arc::new(compiled);
        if let Some((evicted, _)) = cache.push(key, Arc::clone(&entry)) {
            tracing::debug!("Evicted pattern {:?} from cache", evicted);
        }
        entry
    }

    /// Check whether a pattern is cached without touching its recency
    pub fn contains(&self, pattern: &str) -> bool {
        self.cache.lock().contains(pattern)
    }

    /// Clear the cache
    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    /// Number of cached patterns
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.cache.lock().cap()
    }
}
