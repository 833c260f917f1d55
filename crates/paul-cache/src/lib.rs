//! Cache abstraction layer for paul.
//!
//! Consumers (the style processor, the dynamic component loader and the
//! build pipeline) talk to two traits and never to a storage mechanism:
//!
//! - [`Cache`]: factory for named buckets
//! - [`CacheBucket`]: key-value store with etag-based invalidation
//!
//! # Implementations
//!
//! - [`NullCache`]: always misses, for `--no-cache` style runs
//! - [`MemoryCache`]: process-lifetime maps shared by bucket name
//! - [`FileCache`]: on-disk entries with version validation
//!
//! # Example
//!
//! ```
//! use paul_cache::{Cache, CacheBucketExt, MemoryCache};
//!
//! let cache = MemoryCache::new();
//! let styles = cache.bucket("styles");
//! styles.set_string("hero.css", "", ".hero{color:red}");
//! assert_eq!(styles.get_string("hero.css", "").as_deref(), Some(".hero{color:red}"));
//! ```

mod ext;
mod file;
mod memory;

pub use ext::CacheBucketExt;
pub use file::FileCache;
pub use memory::MemoryCache;

/// A named partition within a [`Cache`].
///
/// Values are validated by an etag chosen by the caller (a file mtime, a
/// content hash). A hit requires both the key and the etag to match; an
/// empty `etag` on `get` skips validation.
pub trait CacheBucket: Send + Sync {
    /// Retrieve a cached value, or `None` on miss or etag mismatch.
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>>;

    /// Store a value, replacing any previous entry for `key`.
    fn set(&self, key: &str, etag: &str, value: &[u8]);

    /// Drop every entry in this bucket.
    fn clear(&self);
}

/// Factory for named cache [`CacheBucket`]s.
///
/// Buckets with different names are isolated. Opening the same name twice
/// yields handles over the same storage.
pub trait Cache: Send + Sync {
    /// Open or create a named bucket.
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket>;
}

/// No-op [`CacheBucket`]: every `get` misses, every `set` is discarded.
pub struct NullCacheBucket;

impl CacheBucket for NullCacheBucket {
    fn get(&self, _key: &str, _etag: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _etag: &str, _value: &[u8]) {}

    fn clear(&self) {}
}

/// No-op [`Cache`] that always returns [`NullCacheBucket`]s.
pub struct NullCache;

impl Cache for NullCache {
    fn bucket(&self, _name: &str) -> Box<dyn CacheBucket> {
        Box::new(NullCacheBucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_cache_always_misses() {
        let bucket = NullCache.bucket("styles");

        assert_eq!(bucket.get("key", "etag1"), None);

        bucket.set("key", "etag1", b"hello");
        assert_eq!(bucket.get("key", "etag1"), None);
        assert_eq!(bucket.get("key", ""), None);
    }

    #[test]
    fn test_null_cache_is_object_safe() {
        let cache: Box<dyn Cache> = Box::new(NullCache);
        let bucket = cache.bucket("components");
        bucket.clear();
        assert_eq!(bucket.get("k", ""), None);
    }
}
