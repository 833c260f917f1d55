//! Per-file transforms.

use std::path::{Path, PathBuf};

use paul_script::{MinifyConfig, minify, transpile};
use paul_styles::{Prefixer, ScssCompiler, StyleCompiler};

use crate::BuildError;

/// How the pipeline treats a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// `.js`, `.mjs`, `.cjs`: minified in production.
    Script,
    /// `.jsx`, `.tsx`, `.ts`: transpiled to `.js`, then minified in production.
    Component,
    /// `.css`: prefixed, minified in production.
    Stylesheet,
    /// `.scss`, `.sass`: compiled to `.css`, then prefixed.
    Sass,
    /// Anything else, including `.d.ts`: copied verbatim.
    Copy,
}

impl AssetKind {
    #[must_use]
    pub fn of(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if name.ends_with(".d.ts") {
            return Self::Copy;
        }
        match path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .as_deref()
        {
            Some("js" | "mjs" | "cjs") => Self::Script,
            Some("jsx" | "tsx" | "ts") => Self::Component,
            Some("css") => Self::Stylesheet,
            Some("scss" | "sass") => Self::Sass,
            _ => Self::Copy,
        }
    }

    /// Whether the output is listed in the asset manifest.
    #[must_use]
    pub fn is_hashed(self) -> bool {
        !matches!(self, Self::Copy)
    }

    /// Output path for a source path relative to the source root.
    #[must_use]
    pub fn output_path(self, relative: &Path) -> PathBuf {
        match self {
            Self::Component => relative.with_extension("js"),
            Self::Sass => relative.with_extension("css"),
            Self::Script | Self::Stylesheet | Self::Copy => relative.to_path_buf(),
        }
    }
}

/// Stateless transformers shared by every file of one build.
pub(crate) struct Transformers {
    minify: Option<MinifyConfig>,
    prefixer: Prefixer,
    scss: ScssCompiler,
}

impl Transformers {
    pub(crate) fn new(production: bool, load_paths: Vec<PathBuf>) -> Self {
        Self {
            minify: production.then(MinifyConfig::production),
            prefixer: Prefixer::new().minified(production),
            scss: ScssCompiler::new(load_paths),
        }
    }

    /// Transform a text asset. `path` is the absolute source path, used for
    /// error context and import resolution.
    pub(crate) fn apply(&self, kind: AssetKind, source: &str, path: &Path) -> Result<String, BuildError> {
        let script_error = |source| BuildError::Script {
            path: path.to_path_buf(),
            source,
        };
        let style_error = |source| BuildError::Style {
            path: path.to_path_buf(),
            source,
        };

        match kind {
            AssetKind::Script => self.minify_script(source, path).map_err(script_error),
            AssetKind::Component => {
                let js = transpile(source, path).map_err(script_error)?;
                self.minify_script(&js, path).map_err(script_error)
            }
            AssetKind::Stylesheet => self.prefixer.compile(source, Some(path)).map_err(style_error),
            AssetKind::Sass => {
                let css = self.scss.compile(source, Some(path)).map_err(style_error)?;
                self.prefixer.compile(&css, Some(path)).map_err(style_error)
            }
            AssetKind::Copy => Ok(source.to_owned()),
        }
    }

    fn minify_script(&self, source: &str, path: &Path) -> Result<String, paul_script::ScriptError> {
        match &self.minify {
            Some(config) => minify(source, path, config),
            None => Ok(source.to_owned()),
        }
    }
}
