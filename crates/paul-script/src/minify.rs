//! JavaScript minification with oxc.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc_mangler::MangleOptions;
use oxc_minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc_parser::Parser;

use crate::ScriptError;
use crate::transpile::source_type;

/// What the minifier is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinifyConfig {
    /// Rename local bindings.
    pub mangle: bool,
    /// Apply compression passes.
    pub compress: bool,
    /// Remove `console.*` calls.
    pub drop_console: bool,
    /// Remove `debugger` statements.
    pub drop_debugger: bool,
}

impl MinifyConfig {
    /// Full minification for shipped bundles.
    #[must_use]
    pub fn production() -> Self {
        Self {
            mangle: true,
            compress: true,
            drop_console: true,
            drop_debugger: true,
        }
    }

    /// Whitespace removal only.
    #[must_use]
    pub fn development() -> Self {
        Self {
            mangle: false,
            compress: false,
            drop_console: false,
            drop_debugger: false,
        }
    }
}

/// Minify already-transpiled JavaScript.
///
/// # Errors
///
/// Returns [`ScriptError::Parse`] if `source` does not parse.
pub fn minify(source: &str, path: &Path, config: &MinifyConfig) -> Result<String, ScriptError> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, source_type(path)).parse();
    if let Some(error) = parsed.errors.first() {
        return Err(ScriptError::Parse {
            path: path.to_path_buf(),
            message: error.to_string(),
        });
    }
    let mut program = parsed.program;

    let compress = config.compress.then(|| {
        let mut options = CompressOptions::smallest();
        options.drop_console = config.drop_console;
        options.drop_debugger = config.drop_debugger;
        options
    });
    let options = MinifierOptions {
        mangle: config.mangle.then(MangleOptions::default),
        compress,
    };
    let minified = Minifier::new(options).minify(&allocator, &mut program);

    let codegen = CodegenOptions {
        minify: true,
        comments: CommentOptions::disabled(),
        ..CodegenOptions::default()
    };
    Ok(Codegen::new()
        .with_options(codegen)
        .with_scoping(minified.scoping)
        .build(&program)
        .code)
}
