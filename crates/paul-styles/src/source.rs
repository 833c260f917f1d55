//! Style source descriptions as they appear in page definitions.
//!
//! In TOML or YAML a source is either a bare path string or a table:
//!
//! ```toml
//! styles = [
//!   "styles/main.css",
//!   { path = "styles/theme.scss" },
//!   { type = "utility", content = "@tailwind utilities;" },
//! ]
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::StyleError;

/// Stylesheet language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Dialect {
    /// Plain CSS.
    Plain,
    /// Sass/SCSS.
    Preprocessed,
    /// Utility-first CSS with `@tailwind` directives.
    UtilityFirst,
}

impl Dialect {
    /// Guess the dialect of a stylesheet file from its extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("scss") || ext.eq_ignore_ascii_case("sass") => {
                Self::Preprocessed
            }
            _ => Self::Plain,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Preprocessed => "preprocessed",
            Self::UtilityFirst => "utility-first",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "css" => Ok(Self::Plain),
            "preprocessed" | "scss" | "sass" => Ok(Self::Preprocessed),
            "utility-first" | "utility" | "tailwind" => Ok(Self::UtilityFirst),
            _ => Err(StyleError::UnsupportedDialect(s.to_owned())),
        }
    }
}

impl TryFrom<String> for Dialect {
    type Error = StyleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Where the stylesheet text comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StyleInput {
    Inline(String),
    File(PathBuf),
}

/// A stylesheet to process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "RawStyleSource")]
pub struct StyleSource {
    pub dialect: Dialect,
    pub input: StyleInput,
}

impl StyleSource {
    #[must_use]
    pub fn inline(dialect: Dialect, content: impl Into<String>) -> Self {
        Self {
            dialect,
            input: StyleInput::Inline(content.into()),
        }
    }

    /// A file source whose dialect is inferred from the extension.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            dialect: Dialect::from_path(&path),
            input: StyleInput::File(path),
        }
    }

    /// Resolve a relative file path against `base`.
    #[must_use]
    pub fn resolved_against(mut self, base: &Path) -> Self {
        if let StyleInput::File(path) = &self.input
            && path.is_relative()
        {
            self.input = StyleInput::File(base.join(path));
        }
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawStyleSource {
    Path(PathBuf),
    Table {
        #[serde(rename = "type", alias = "dialect")]
        dialect: Option<String>,
        path: Option<PathBuf>,
        content: Option<String>,
    },
}

impl TryFrom<RawStyleSource> for StyleSource {
    type Error = StyleError;

    fn try_from(raw: RawStyleSource) -> Result<Self, Self::Error> {
        match raw {
            RawStyleSource::Path(path) => Ok(Self::file(path)),
            RawStyleSource::Table {
                dialect,
                path,
                content,
            } => {
                let dialect = dialect.map(|d| d.parse::<Dialect>()).transpose()?;
                match (path, content) {
                    (Some(path), None) => {
                        let dialect = dialect.unwrap_or_else(|| Dialect::from_path(&path));
                        Ok(Self {
                            dialect,
                            input: StyleInput::File(path),
                        })
                    }
                    (None, Some(content)) => Ok(Self::inline(
                        dialect.unwrap_or(Dialect::Plain),
                        content,
                    )),
                    (Some(_), Some(_)) => Err(StyleError::InvalidSource(
                        "set either path or content, not both".to_owned(),
                    )),
                    (None, None) => Err(StyleError::InvalidSource(
                        "path or content is required".to_owned(),
                    )),
                }
            }
        }
    }
}
