//! Typed helpers layered over raw [`CacheBucket`] bytes.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::CacheBucket;

/// Typed convenience methods for every [`CacheBucket`].
///
/// Kept out of [`CacheBucket`] itself so the trait stays object-safe and
/// implementors only deal in bytes.
pub trait CacheBucketExt: CacheBucket {
    /// Retrieve and deserialize a JSON value. Decoding failures count as a miss.
    fn get_json<T: DeserializeOwned>(&self, key: &str, etag: &str) -> Option<T> {
        let bytes = self.get(key, etag)?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Store a value as JSON. Serialization failures are ignored.
    fn set_json<T: Serialize>(&self, key: &str, etag: &str, value: &T) {
        if let Ok(bytes) = serde_json::to_vec(value) {
            self.set(key, etag, &bytes);
        }
    }

    /// Retrieve a UTF-8 string. Invalid UTF-8 counts as a miss.
    fn get_string(&self, key: &str, etag: &str) -> Option<String> {
        let bytes = self.get(key, etag)?;
        String::from_utf8(bytes).ok()
    }

    fn set_string(&self, key: &str, etag: &str, value: &str) {
        self.set(key, etag, value.as_bytes());
    }
}

impl<B: CacheBucket + ?Sized> CacheBucketExt for B {}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::{Cache, MemoryCache};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Entry {
        hashed: String,
        size: u64,
    }

    #[test]
    fn test_json_helpers() {
        let cache = MemoryCache::new();
        let bucket = cache.bucket("manifest");
        let entry = Entry {
            hashed: "app-1a2b3c4d.js".to_owned(),
            size: 42,
        };

        bucket.set_json("app.js", "e", &entry);

        assert_eq!(bucket.get_json::<Entry>("app.js", "e"), Some(entry));
    }

    #[test]
    fn test_invalid_utf8_is_a_miss() {
        let cache = MemoryCache::new();
        let bucket = cache.bucket("raw");
        bucket.set("bin", "", &[0xFF, 0xFE]);

        assert_eq!(bucket.get_string("bin", ""), None);
    }
}
