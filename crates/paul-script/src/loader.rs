//! File-based dynamic components.
//!
//! Loading is an explicit opt-in: nothing in a project directory is executed
//! unless a page references it and the loader is enabled.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use paul_cache::{Cache, CacheBucket, CacheBucketExt, MemoryCache};
use paul_components::{Component, ComponentError, Props, TemplateComponent};
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::{Sandbox, ScriptError, lower_module, transpile};

const CACHE_BUCKET: &str = "components";

/// How a component file is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum ScriptDialect {
    /// Plain JavaScript module (`.js`, `.mjs`, `.cjs`).
    Script,
    /// JSX or TypeScript (`.jsx`, `.tsx`, `.ts`).
    Component,
    /// minijinja markup (`.html`).
    Markup,
}

impl ScriptDialect {
    /// Dialect implied by a file extension.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::UnsupportedDialect`] for other extensions.
    pub fn from_path(path: &Path) -> Result<Self, ScriptError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "js" | "mjs" | "cjs" => Ok(Self::Script),
            "jsx" | "tsx" | "ts" => Ok(Self::Component),
            "html" | "htm" => Ok(Self::Markup),
            _ => Err(ScriptError::UnsupportedDialect(path.display().to_string())),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Component => "component",
            Self::Markup => "markup",
        }
    }
}

impl fmt::Display for ScriptDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScriptDialect {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "script" | "js" | "javascript" => Ok(Self::Script),
            "component" | "jsx" | "tsx" | "typescript" => Ok(Self::Component),
            "markup" | "html" | "template" => Ok(Self::Markup),
            _ => Err(ScriptError::UnsupportedDialect(s.to_owned())),
        }
    }
}

impl TryFrom<String> for ScriptDialect {
    type Error = ScriptError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Loads components from project files.
pub struct FileComponentLoader {
    base_dir: PathBuf,
    sandbox: Arc<Sandbox>,
    cache: Arc<dyn Cache>,
}

impl FileComponentLoader {
    /// Loader resolving relative paths against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Unavailable`] if the sandbox cannot start.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, ScriptError> {
        Ok(Self {
            base_dir: base_dir.into(),
            sandbox: Arc::new(Sandbox::new()?),
            cache: Arc::new(MemoryCache::new()),
        })
    }

    /// Keep render results in `cache` instead of a private memory cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Load the component defined in `path`.
    ///
    /// The dialect is inferred from the extension unless given.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, does not compile, imports a module
    /// outside the sandbox or does not export something renderable.
    pub fn load(
        &self,
        path: &Path,
        dialect: Option<ScriptDialect>,
    ) -> Result<Arc<dyn Component>, ScriptError> {
        let path = self.base_dir.join(path);
        let dialect = match dialect {
            Some(dialect) => dialect,
            None => ScriptDialect::from_path(&path)?,
        };

        if dialect == ScriptDialect::Markup {
            let component = TemplateComponent::from_file(&path, Value::Object(Props::new()))?;
            tracing::debug!(path = %path.display(), "Loaded markup component");
            return Ok(Arc::new(component));
        }

        let io_error = |source| ScriptError::Io {
            path: path.clone(),
            source,
        };
        let source = std::fs::read_to_string(&path).map_err(io_error)?;
        let etag = std::fs::metadata(&path)
            .and_then(|m| m.modified())
            .map(|modified| {
                modified
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_nanos().to_string())
                    .unwrap_or_default()
            })
            .map_err(io_error)?;

        let script = lower_module(&transpile(&source, &path)?, &path)?;
        let described = self.sandbox.describe(&script, &path)?;
        tracing::info!(
            path = %path.display(),
            dialect = %dialect,
            kind = %described.kind,
            "Loaded dynamic component"
        );

        Ok(Arc::new(ScriptComponent {
            alternate: (dialect == ScriptDialect::Component).then_some(source),
            path,
            script,
            defaults: described.default_props,
            etag,
            sandbox: Arc::clone(&self.sandbox),
            cache: self.cache.bucket(CACHE_BUCKET),
        }))
    }

    /// Drop every cached render result.
    pub fn invalidate(&self) {
        self.cache.bucket(CACHE_BUCKET).clear();
    }
}

/// A component evaluated in the [`Sandbox`] on every cache miss.
pub struct ScriptComponent {
    path: PathBuf,
    script: String,
    alternate: Option<String>,
    defaults: Value,
    etag: String,
    sandbox: Arc<Sandbox>,
    cache: Box<dyn CacheBucket>,
}

impl ScriptComponent {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Component for ScriptComponent {
    fn default_props(&self) -> &Value {
        &self.defaults
    }

    fn render(&self, props: &Props) -> Result<String, ComponentError> {
        let key = render_key(&self.path, props);
        if let Some(html) = self.cache.get_string(&key, &self.etag) {
            return Ok(html);
        }

        let html = self
            .sandbox
            .render(&self.script, &self.path, props)
            .map_err(|e| ComponentError::External(Box::new(e)))?;
        self.cache.set_string(&key, &self.etag, &html);
        Ok(html)
    }

    fn alt_render(&self, _props: &Props) -> Option<Result<String, ComponentError>> {
        self.alternate.clone().map(Ok)
    }
}

fn render_key(path: &Path, props: &Props) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    hasher.update([0]);
    hasher.update(Value::Object(props.clone()).to_string().as_bytes());
    hex::encode(hasher.finalize())
}
