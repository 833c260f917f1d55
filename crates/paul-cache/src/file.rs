//! On-disk cache used by the build pipeline.
//!
//! Each bucket is a subdirectory of the cache root and each entry a single
//! file laid out as:
//!
//! ```text
//! [etag_len: u32 LE][etag bytes][data bytes]
//! ```
//!
//! A read whose etag differs from the stored one is a miss. The root
//! carries a `VERSION` file; a missing or different version wipes the whole
//! directory so output from an older paul is never reused.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::{Cache, CacheBucket};

/// File-based [`Cache`] rooted at a directory on disk.
///
/// ```text
/// {root}/
/// +-- VERSION
/// +-- transforms/
///     +-- assets/app.js
/// ```
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    /// Open the cache at `root`, wiping it first if its `VERSION` differs
    /// from `version`. Failures are logged and never fatal.
    #[must_use]
    pub fn new(root: PathBuf, version: &str) -> Self {
        validate_version(&root, version);
        Self { root }
    }
}

impl Cache for FileCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        Box::new(FileCacheBucket {
            dir: self.root.join(name),
        })
    }
}

struct FileCacheBucket {
    dir: PathBuf,
}

impl FileCacheBucket {
    /// Entry file for `key`. Keys are relative `/`-separated paths; anything
    /// that could step outside the bucket directory is refused.
    fn entry_path(&self, key: &str) -> Option<PathBuf> {
        let relative = Path::new(key);
        let inside = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        inside.then(|| self.dir.join(relative))
    }
}

impl CacheBucket for FileCacheBucket {
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>> {
        let bytes = fs::read(self.entry_path(key)?).ok()?;
        let (stored_etag, data) = decode_entry(&bytes)?;
        (etag.is_empty() || stored_etag == etag.as_bytes()).then(|| data.to_vec())
    }

    fn set(&self, key: &str, etag: &str, value: &[u8]) {
        let Some(path) = self.entry_path(key) else {
            tracing::debug!(key, "refusing cache key outside bucket");
            return;
        };
        let Some(entry) = encode_entry(etag, value) else {
            return;
        };
        let written = path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| fs::write(&path, entry));
        if let Err(error) = written {
            tracing::debug!(path = %path.display(), %error, "Failed to write cache entry");
        }
    }

    fn clear(&self) {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => {}
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(error) => {
                tracing::warn!(path = %self.dir.display(), %error, "Failed to clear cache bucket");
            }
        }
    }
}

/// `[etag_len: u32 LE][etag][data]`. `None` for etags longer than `u32::MAX`.
fn encode_entry(etag: &str, data: &[u8]) -> Option<Vec<u8>> {
    let len = u32::try_from(etag.len()).ok()?;
    let mut entry = Vec::with_capacity(4 + etag.len() + data.len());
    entry.extend_from_slice(&len.to_le_bytes());
    entry.extend_from_slice(etag.as_bytes());
    entry.extend_from_slice(data);
    Some(entry)
}

/// Split an entry into etag and data. `None` for truncated entries.
fn decode_entry(entry: &[u8]) -> Option<(&[u8], &[u8])> {
    let (len, rest) = entry.split_first_chunk::<4>()?;
    let len = usize::try_from(u32::from_le_bytes(*len)).ok()?;
    (rest.len() >= len).then(|| rest.split_at(len))
}

/// Wipe `root` unless its `VERSION` file holds `version`, then make sure
/// the directory and the file exist.
fn validate_version(root: &Path, version: &str) {
    let version_file = root.join("VERSION");
    let stored = fs::read_to_string(&version_file).ok();
    if stored.as_deref() == Some(version) {
        tracing::debug!(version, "Cache version matches");
        return;
    }
    tracing::info!(
        stored = stored.as_deref().unwrap_or("none"),
        current = version,
        path = %root.display(),
        "Resetting build cache"
    );

    if let Err(error) = fs::remove_dir_all(root)
        && error.kind() != ErrorKind::NotFound
    {
        tracing::warn!(path = %root.display(), %error, "Failed to remove cache directory");
    }
    let initialized = fs::create_dir_all(root).and_then(|()| fs::write(&version_file, version));
    if let Err(error) = initialized {
        tracing::warn!(path = %root.display(), %error, "Failed to initialize cache directory");
    }
}
