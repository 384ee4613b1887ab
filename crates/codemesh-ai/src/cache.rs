//! Cache for summary/answer results, keyed by content so re-indexing an
//! unchanged symbol skips the LLM call entirely.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: String,
    pub timestamp: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn is_expired(&self) -> bool {
        self.timestamp.elapsed() > self.ttl
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
struct CacheKey {
    qualified_name: u64,
    content_hash: u64,
}

/// TTL-based cache of summary/answer strings keyed by symbol identity
/// and a content hash of the prompt inputs.
pub struct ResponseCache {
    entries: HashMap<CacheKey, CacheEntry>,
    default_ttl: Duration,
}

impl ResponseCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            default_ttl,
        }
    }

    pub fn get(&self, qualified_name: &str, content_hash: u64) -> Option<&str> {
        let key = CacheKey {
            qualified_name: compute_content_hash(qualified_name),
            content_hash,
        };
        self.entries
            .get(&key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.as_str())
    }

    pub fn insert(&mut self, qualified_name: &str, content_hash: u64, value: String) {
        let key = CacheKey {
            qualified_name: compute_content_hash(qualified_name),
            content_hash,
        };
        let entry = CacheEntry {
            value,
            timestamp: Instant::now(),
            ttl: self.default_ttl,
        };
        self.entries.insert(key, entry);
    }

    pub fn cleanup_expired(&mut self) {
        self.entries.retain(|_, entry| !entry.is_expired());
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            total_entries: self.entries.len(),
            expired_entries: self.entries.values().filter(|e| e.is_expired()).count(),
        }
    }
}

#[derive(Debug)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
}

/// Simple content hash used for cache invalidation across both the
/// qualified-name and content-hash fields of the key.
pub fn compute_content_hash(content: &str) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caches_and_retrieves_by_name_and_hash() {
        let mut cache = ResponseCache::new(Duration::from_secs(60));
        let hash = compute_content_hash("fn foo() {}");
        cache.insert("Orders.Foo", hash, "does a thing".to_string());
        assert_eq!(cache.get("Orders.Foo", hash), Some("does a thing"));
        assert_eq!(cache.get("Orders.Foo", hash + 1), None);
    }

    #[test]
    fn expired_entries_are_not_returned() {
        let mut cache = ResponseCache::new(Duration::from_millis(0));
        let hash = compute_content_hash("x");
        cache.insert("Orders.Foo", hash, "stale".to_string());
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("Orders.Foo", hash), None);
    }

    #[test]
    fn cleanup_expired_removes_only_stale_entries() {
        let mut cache = ResponseCache::new(Duration::from_secs(60));
        cache.insert("a", 1, "a".to_string());
        cache.entries.values_mut().next().unwrap().ttl = Duration::from_millis(0);
        std::thread::sleep(Duration::from_millis(5));
        cache.insert("b", 2, "b".to_string());
        cache.cleanup_expired();
        assert_eq!(cache.stats().total_entries, 1);
    }
}
