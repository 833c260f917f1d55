//! Sass compilation with grass.

use std::path::{Path, PathBuf};

use crate::{Dialect, StyleCompiler, StyleError, origin_label};

/// Compiles SCSS to CSS.
///
/// `@use` and `@import` resolve against the source file's directory first,
/// then the configured load paths.
pub struct ScssCompiler {
    load_paths: Vec<PathBuf>,
}

impl ScssCompiler {
    #[must_use]
    pub fn new(load_paths: Vec<PathBuf>) -> Self {
        Self { load_paths }
    }
}

impl StyleCompiler for ScssCompiler {
    fn compile(&self, source: &str, origin: Option<&Path>) -> Result<String, StyleError> {
        let mut options = grass::Options::default().style(grass::OutputStyle::Expanded);
        if let Some(dir) = origin.and_then(Path::parent) {
            options = options.load_path(dir);
        }
        for path in &self.load_paths {
            options = options.load_path(path);
        }

        grass::from_string(source.to_owned(), &options).map_err(|e| StyleError::Compile {
            dialect: Dialect::Preprocessed,
            origin: origin_label(origin),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variables_and_nesting() {
        let css = ScssCompiler::new(Vec::new())
            .compile(
                "$brand: #0d6efd;\n.hero { .cta { color: $brand; } }",
                None,
            )
            .unwrap();

        assert!(css.contains(".hero .cta"), "{css}");
        assert!(css.contains("color: #0d6efd"));
    }

    #[test]
    fn test_imports_resolve_next_to_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("_colors.scss"), "$accent: #ff6600;").unwrap();
        let main = tmp.path().join("main.scss");
        let source = "@import \"colors\";\na { color: $accent; }";
        std::fs::write(&main, source).unwrap();

        let css = ScssCompiler::new(Vec::new())
            .compile(source, Some(&main))
            .unwrap();

        assert!(css.contains("color: #ff6600"), "{css}");
    }

    #[test]
    fn test_imports_resolve_from_load_paths() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("_vars.scss"), "$gap: 2rem;").unwrap();

        let css = ScssCompiler::new(vec![tmp.path().to_path_buf()])
            .compile("@import \"vars\";\n.x { margin: $gap; }", None)
            .unwrap();

        assert!(css.contains("margin: 2rem"));
    }

    #[test]
    fn test_undefined_variable_is_a_compile_error() {
        let err = ScssCompiler::new(Vec::new())
            .compile("a { color: $missing; }", None)
            .unwrap_err();

        assert!(matches!(
            err,
            StyleError::Compile {
                dialect: Dialect::Preprocessed,
                ..
            }
        ));
    }
}
