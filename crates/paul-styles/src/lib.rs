//! Stylesheet processing for paul.
//!
//! A [`StyleSource`] names a dialect and either inline CSS or a file. The
//! [`StyleProcessor`] turns it into browser-ready CSS:
//!
//! - **plain**: vendor prefixes added by lightningcss
//! - **preprocessed**: Sass compiled by grass, then prefixed
//! - **utility-first**: utility classes found in the project's content files
//!   generated in place of `@tailwind` directives, then prefixed
//!
//! Results are cached by `(path, inline content, dialect)`.
//!
//! Dialects form a closed set. Parsing an unknown dialect name fails with
//! [`StyleError::UnsupportedDialect`] before any processing happens.

mod prefix;
mod processor;
mod scss;
mod source;
mod utility;

use std::path::{Path, PathBuf};

pub use prefix::Prefixer;
pub use processor::{StyleOptions, StyleProcessor};
pub use scss::ScssCompiler;
pub use source::{Dialect, StyleInput, StyleSource};
pub use utility::UtilityGenerator;

/// One stage of the stylesheet pipeline.
///
/// `origin` is the file the text came from, if any, so compilers can
/// resolve relative imports and report locations.
pub trait StyleCompiler: Send + Sync {
    fn compile(&self, source: &str, origin: Option<&Path>) -> Result<String, StyleError>;
}

/// Error raised while processing a stylesheet.
#[derive(Debug, thiserror::Error)]
pub enum StyleError {
    /// The dialect name is not one of the supported ones.
    #[error("unsupported style type: {0}")]
    UnsupportedDialect(String),

    /// A style source names neither a path nor inline content, or both.
    #[error("invalid style source: {0}")]
    InvalidSource(String),

    /// A stylesheet file could not be read.
    #[error("Failed to read stylesheet {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A compiler stage rejected the input.
    #[error("Failed to compile {dialect} styles from {origin}: {message}")]
    Compile {
        dialect: Dialect,
        origin: String,
        message: String,
    },
}

fn origin_label(origin: Option<&Path>) -> String {
    origin.map_or_else(|| "<inline>".to_owned(), |p| p.display().to_string())
}
