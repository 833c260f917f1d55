//! Stylesheet pipeline with result caching.

use std::path::{Path, PathBuf};
use std::time::Instant;

use paul_cache::{Cache, CacheBucket, CacheBucketExt, MemoryCache};
use sha2::{Digest, Sha256};

use crate::{
    Dialect, Prefixer, ScssCompiler, StyleCompiler, StyleError, StyleInput, StyleSource,
    UtilityGenerator,
};

const CACHE_BUCKET: &str = "styles";

/// Settings for a [`StyleProcessor`].
#[derive(Debug, Clone, Default)]
pub struct StyleOptions {
    /// Absolute globs scanned by the utility generator.
    pub content_globs: Vec<String>,
    /// Extra directories for Sass `@use`/`@import` resolution.
    pub load_paths: Vec<PathBuf>,
    /// Emit minified CSS.
    pub minify: bool,
    /// Directory relative file sources resolve against.
    pub base_dir: PathBuf,
}

/// Turns [`StyleSource`]s into browser-ready CSS.
pub struct StyleProcessor {
    base_dir: PathBuf,
    prefixer: Prefixer,
    preprocessor: Box<dyn StyleCompiler>,
    utilities: Box<dyn StyleCompiler>,
    cache: Box<dyn CacheBucket>,
}

impl StyleProcessor {
    /// Processor with a private in-memory cache.
    #[must_use]
    pub fn new(options: StyleOptions) -> Self {
        Self {
            prefixer: Prefixer::new().minified(options.minify),
            preprocessor: Box::new(ScssCompiler::new(options.load_paths)),
            utilities: Box::new(UtilityGenerator::new(options.content_globs)),
            cache: MemoryCache::new().bucket(CACHE_BUCKET),
            base_dir: options.base_dir,
        }
    }

    /// Store results in a bucket of `cache` instead.
    #[must_use]
    pub fn with_cache(mut self, cache: &dyn Cache) -> Self {
        self.cache = cache.bucket(CACHE_BUCKET);
        self
    }

    /// Replace the Sass stage.
    #[must_use]
    pub fn with_preprocessor(mut self, compiler: Box<dyn StyleCompiler>) -> Self {
        self.preprocessor = compiler;
        self
    }

    /// Replace the utility-class stage.
    #[must_use]
    pub fn with_utilities(mut self, compiler: Box<dyn StyleCompiler>) -> Self {
        self.utilities = compiler;
        self
    }

    /// Resolve a source to CSS.
    ///
    /// Identical `(path, content, dialect)` inputs are served from the cache
    /// without running any compiler stage.
    ///
    /// # Errors
    ///
    /// Returns [`StyleError::Io`] if a file source cannot be read and
    /// [`StyleError::Compile`] if a stage rejects the input.
    pub fn process(&self, source: &StyleSource) -> Result<String, StyleError> {
        let (path, content) = match &source.input {
            StyleInput::Inline(content) => (None, content.clone()),
            StyleInput::File(path) => {
                let path = self.base_dir.join(path);
                let content = std::fs::read_to_string(&path).map_err(|e| StyleError::Io {
                    path: path.clone(),
                    source: e,
                })?;
                (Some(path), content)
            }
        };

        let key = cache_key(path.as_deref(), &content, source.dialect);
        if let Some(css) = self.cache.get_string(&key, "") {
            return Ok(css);
        }

        let start = Instant::now();
        let origin = path.as_deref();
        let css = match source.dialect {
            Dialect::Plain => self.prefixer.compile(&content, origin)?,
            Dialect::Preprocessed => {
                let compiled = self.preprocessor.compile(&content, origin)?;
                self.prefixer.compile(&compiled, origin)?
            }
            Dialect::UtilityFirst => {
                let generated = self.utilities.compile(&content, origin)?;
                self.prefixer.compile(&generated, origin)?
            }
        };

        tracing::debug!(
            dialect = %source.dialect,
            origin = %crate::origin_label(origin),
            elapsed_ms = start.elapsed().as_millis(),
            "Processed styles"
        );
        self.cache.set_string(&key, "", &css);
        Ok(css)
    }

    /// Process every source and join the results with newlines.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered.
    pub fn process_all<'a>(
        &self,
        sources: impl IntoIterator<Item = &'a StyleSource>,
    ) -> Result<String, StyleError> {
        let mut parts = Vec::new();
        for source in sources {
            let css = self.process(source)?;
            if !css.trim().is_empty() {
                parts.push(css);
            }
        }
        Ok(parts.join("\n"))
    }

    /// Drop every cached result.
    pub fn invalidate(&self) {
        self.cache.clear();
    }
}

fn cache_key(path: Option<&Path>, content: &str, dialect: Dialect) -> String {
    let mut hasher = Sha256::new();
    if let Some(path) = path {
        hasher.update(path.to_string_lossy().as_bytes());
    }
    hasher.update([0]);
    hasher.update(content.as_bytes());
    hasher.update([0]);
    hasher.update(dialect.as_str().as_bytes());
    hex::encode(hasher.finalize())
}
