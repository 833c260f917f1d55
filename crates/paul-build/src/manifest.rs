//! Content-hashed asset names.

use std::collections::BTreeMap;
use std::path::Path;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use crate::BuildError;

/// Name of the manifest written to the output root.
pub const MANIFEST_FILENAME: &str = "manifest.json";

/// Logical asset path → content-hashed path, both relative to the output
/// directory with `/` separators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetManifest {
    entries: BTreeMap<String, String>,
}

impl AssetManifest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, logical: impl Into<String>, hashed: impl Into<String>) {
        self.entries.insert(logical.into(), hashed.into());
    }

    /// Hashed path for a logical asset path.
    #[must_use]
    pub fn get(&self, logical: &str) -> Option<&str> {
        self.entries.get(logical).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Write the manifest as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Io`] if the file cannot be written.
    pub fn write(&self, path: &Path) -> Result<(), BuildError> {
        let mut json = serde_json::to_string_pretty(self).map_err(|e| BuildError::Io {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        json.push('\n');
        std::fs::write(path, json).map_err(BuildError::io(path))
    }
}

/// Insert the first 8 hex chars of the content's MD5 before the extension:
/// `js/app.js` → `js/app.5d41402a.js`.
#[must_use]
pub fn hashed_name(logical: &str, content: &[u8]) -> String {
    let hash = hex::encode(Md5::digest(content));
    let hash = &hash[..8];

    let (dir, file) = match logical.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, logical),
    };
    let file = match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}.{hash}.{ext}"),
        _ => format!("{file}.{hash}"),
    };
    match dir {
        Some(dir) => format!("{dir}/{file}"),
        None => file,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_hashed_name() {
        // md5("hello") = 5d41402abc4b2a76b9719d911017c592
        assert_eq!(hashed_name("app.js", b"hello"), "app.5d41402a.js");
        assert_eq!(hashed_name("css/main.css", b"hello"), "css/main.5d41402a.css");
        assert_eq!(hashed_name("LICENSE", b"hello"), "LICENSE.5d41402a");
        assert_eq!(hashed_name(".env", b"hello"), ".env.5d41402a");
    }

    #[test]
    fn test_hash_follows_content() {
        assert_ne!(hashed_name("app.js", b"a"), hashed_name("app.js", b"b"));
    }

    #[test]
    fn test_write_is_flat_json_object() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut manifest = AssetManifest::new();
        manifest.insert("main.css", "main.0cc175b9.css");
        manifest.insert("app.js", "app.92eb5ffe.js");

        let path = tmp.path().join(MANIFEST_FILENAME);
        manifest.write(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"app.js": "app.92eb5ffe.js", "main.css": "main.0cc175b9.css"})
        );
        assert_eq!(manifest.get("app.js"), Some("app.92eb5ffe.js"));
    }
}
