//! In-process cache used by the style processor and the component loader.
//!
//! Entries live for the lifetime of the [`MemoryCache`] (normally the
//! process). Concurrent population of the same key is allowed; values are
//! pure functions of their key, so the last write wins without harm.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::{Cache, CacheBucket};

type Entries = HashMap<String, (String, Vec<u8>)>;

/// [`Cache`] backed by in-memory maps, one per bucket name.
#[derive(Default)]
pub struct MemoryCache {
    buckets: RwLock<HashMap<String, Arc<RwLock<Entries>>>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self, name: &str) -> Arc<RwLock<Entries>> {
        if let Some(entries) = self
            .buckets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Arc::clone(entries);
        }

        let mut buckets = self.buckets.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(buckets.entry(name.to_owned()).or_default())
    }
}

impl Cache for MemoryCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        Box::new(MemoryCacheBucket {
            entries: self.entries(name),
        })
    }
}

struct MemoryCacheBucket {
    entries: Arc<RwLock<Entries>>,
}

impl CacheBucket for MemoryCacheBucket {
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let (stored_etag, value) = entries.get(key)?;
        if !etag.is_empty() && stored_etag != etag {
            return None;
        }
        Some(value.clone())
    }

    fn set(&self, key: &str, etag: &str, value: &[u8]) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), (etag.to_owned(), value.to_vec()));
    }

    fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let cache = MemoryCache::new();
        let bucket = cache.bucket("styles");

        bucket.set("a", "v1", b"body{}");
        assert_eq!(bucket.get("a", "v1"), Some(b"body{}".to_vec()));
        assert_eq!(bucket.get("a", ""), Some(b"body{}".to_vec()));
        assert_eq!(bucket.get("a", "v2"), None);
        assert_eq!(bucket.get("missing", ""), None);
    }

    #[test]
    fn test_same_name_shares_storage() {
        let cache = MemoryCache::new();
        cache.bucket("components").set("hero", "", b"<section>");

        let again = cache.bucket("components");
        assert_eq!(again.get("hero", ""), Some(b"<section>".to_vec()));
    }

    #[test]
    fn test_buckets_are_isolated() {
        let cache = MemoryCache::new();
        cache.bucket("styles").set("key", "", b"css");

        assert_eq!(cache.bucket("components").get("key", ""), None);
    }

    #[test]
    fn test_clear_only_affects_one_bucket() {
        let cache = MemoryCache::new();
        let styles = cache.bucket("styles");
        let components = cache.bucket("components");
        styles.set("k", "", b"1");
        components.set("k", "", b"2");

        styles.clear();

        assert_eq!(styles.get("k", ""), None);
        assert_eq!(components.get("k", ""), Some(b"2".to_vec()));
    }

    #[test]
    fn test_concurrent_writers_last_write_wins() {
        let cache = Arc::new(MemoryCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.bucket("styles").set("same", "", b"value"))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.bucket("styles").get("same", ""), Some(b"value".to_vec()));
    }
}
