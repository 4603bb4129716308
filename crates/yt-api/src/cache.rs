//! Whole-page response cache with a fixed TTL.
//!
//! Entries are never invalidated by writes; a page may be stale for up to
//! one TTL after the data behind it changes.

use std::time::{Duration, Instant};

use bytes::Bytes;
use dashmap::DashMap;

/// Pages kept at most; past this the oldest entry is evicted.
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

struct CachedPage {
    body: Bytes,
    stored_at: Instant,
}

pub struct PageCache {
    ttl: Duration,
    max_entries: usize,
    entries: DashMap<String, CachedPage>,
}

impl PageCache {
    /// A zero TTL disables caching.
    pub fn new(ttl: Duration) -> Self {
        Self::with_max_entries(ttl, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_max_entries(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries: max_entries.max(1),
            entries: DashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        if let Some(page) = self.entries.get(key) {
            if page.stored_at.elapsed() < self.ttl {
                return Some(page.body.clone());
            }
        }
        self.entries
            .remove_if(key, |_, page| page.stored_at.elapsed() >= self.ttl);
        None
    }

    pub fn insert(&self, key: String, body: Bytes) {
        if self.ttl.is_zero() {
            return;
        }
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.make_room();
        }
        self.entries.insert(
            key,
            CachedPage {
                body,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drops expired pages, then the oldest one if the cache is still full.
    fn make_room(&self) {
        self.entries
            .retain(|_, page| page.stored_at.elapsed() < self.ttl);
        if self.entries.len() < self.max_entries {
            return;
        }
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().stored_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_within_ttl() {
        let cache = PageCache::new(Duration::from_secs(60));
        cache.insert("/".into(), Bytes::from_static(b"<html>"));
        assert_eq!(cache.get("/"), Some(Bytes::from_static(b"<html>")));
        assert_eq!(cache.get("/?page=2"), None);
    }

    #[test]
    fn test_expired_entry_is_dropped() {
        let cache = PageCache::new(Duration::from_millis(1));
        cache.insert("/".into(), Bytes::from_static(b"<html>"));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("/"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_distinct_keys_stay_within_the_cap() {
        let cache = PageCache::with_max_entries(Duration::from_secs(20), 64);
        for i in 0..5000 {
            cache.insert(format!("/?junk={i}"), Bytes::from_static(b"<html>"));
        }
        assert_eq!(cache.len(), 64);
        assert!(cache.get("/?junk=4999").is_some());
    }

    #[test]
    fn test_full_cache_evicts_the_oldest_page() {
        let cache = PageCache::with_max_entries(Duration::from_secs(20), 2);
        cache.insert("a".into(), Bytes::from_static(b"a"));
        std::thread::sleep(Duration::from_millis(2));
        cache.insert("b".into(), Bytes::from_static(b"b"));
        std::thread::sleep(Duration::from_millis(2));
        cache.insert("c".into(), Bytes::from_static(b"c"));
        assert_eq!(cache.get("a"), None);
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_refreshing_a_key_does_not_evict() {
        let cache = PageCache::with_max_entries(Duration::from_secs(20), 2);
        cache.insert("a".into(), Bytes::from_static(b"a"));
        cache.insert("b".into(), Bytes::from_static(b"b"));
        cache.insert("b".into(), Bytes::from_static(b"b2"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("b"), Some(Bytes::from_static(b"b2")));
    }

    #[test]
    fn test_zero_ttl_disables() {
        let cache = PageCache::new(Duration::ZERO);
        cache.insert("/".into(), Bytes::from_static(b"<html>"));
        assert_eq!(cache.len(), 0);
    }
}
