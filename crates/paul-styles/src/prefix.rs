//! Vendor prefixing and minification with lightningcss.

use std::path::Path;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use crate::{Dialect, StyleCompiler, StyleError, origin_label};

/// Adds the vendor prefixes required by the supported browser set.
///
/// Also the last stage of the preprocessed and utility-first pipelines.
pub struct Prefixer {
    targets: Targets,
    minify: bool,
}

impl Prefixer {
    /// Prefixer for the default browser set, with readable output.
    #[must_use]
    pub fn new() -> Self {
        Self {
            targets: Targets::from(default_browsers()),
            minify: false,
        }
    }

    /// Emit minified output.
    #[must_use]
    pub fn minified(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }
}

impl Default for Prefixer {
    fn default() -> Self {
        Self::new()
    }
}

/// Browser versions encoded as `major << 16 | minor << 8`.
fn default_browsers() -> Browsers {
    Browsers {
        chrome: Some(80 << 16),
        edge: Some(88 << 16),
        firefox: Some(78 << 16),
        safari: Some(13 << 16),
        ios_saf: Some(13 << 16),
        samsung: Some(12 << 16),
        ..Browsers::default()
    }
}

impl StyleCompiler for Prefixer {
    fn compile(&self, source: &str, origin: Option<&Path>) -> Result<String, StyleError> {
        let fail = |message: String| StyleError::Compile {
            dialect: Dialect::Plain,
            origin: origin_label(origin),
            message,
        };

        let mut sheet = StyleSheet::parse(
            source,
            ParserOptions {
                filename: origin_label(origin),
                ..ParserOptions::default()
            },
        )
        .map_err(|e| fail(e.to_string()))?;

        sheet
            .minify(MinifyOptions {
                targets: self.targets,
                ..MinifyOptions::default()
            })
            .map_err(|e| fail(e.to_string()))?;

        let output = sheet
            .to_css(PrinterOptions {
                minify: self.minify,
                targets: self.targets,
                ..PrinterOptions::default()
            })
            .map_err(|e| fail(e.to_string()))?;

        Ok(output.code)
    }
}
