//! JSX and TypeScript to plain JavaScript.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{JsxOptions, JsxRuntime, TransformOptions, Transformer};

use crate::ScriptError;

/// Source type for a script path.
///
/// `.ts`/`.tsx` are TypeScript, everything else is an ES module. JSX is
/// accepted in every non-`.ts` file.
pub(crate) fn source_type(path: &Path) -> SourceType {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ts" | "mts" | "cts") => SourceType::ts(),
        Some("tsx") => SourceType::tsx(),
        _ => SourceType::mjs().with_jsx(true),
    }
}

/// Strip TypeScript syntax and compile JSX to `React.createElement` calls.
///
/// The module syntax of the input is kept.
///
/// # Errors
///
/// Returns [`ScriptError::Parse`] for syntax errors and
/// [`ScriptError::Transform`] if the transform itself fails.
pub fn transpile(source: &str, path: &Path) -> Result<String, ScriptError> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, source_type(path)).parse();
    if let Some(error) = parsed.errors.first() {
        return Err(ScriptError::Parse {
            path: path.to_path_buf(),
            message: error.to_string(),
        });
    }
    let mut program = parsed.program;

    let scoping = SemanticBuilder::new()
        .build(&program)
        .semantic
        .into_scoping();
    let options = TransformOptions {
        jsx: JsxOptions {
            runtime: JsxRuntime::Classic,
            ..JsxOptions::default()
        },
        ..TransformOptions::default()
    };
    let transformed =
        Transformer::new(&allocator, path, &options).build_with_scoping(scoping, &mut program);
    if let Some(error) = transformed.errors.first() {
        return Err(ScriptError::Transform {
            path: path.to_path_buf(),
            message: error.to_string(),
        });
    }

    Ok(Codegen::new().build(&program).code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jsx_becomes_create_element() {
        let js = transpile(
            "export default function Hero(props) { return <h1 className=\"t\">{props.title}</h1>; }",
            Path::new("hero.jsx"),
        )
        .unwrap();

        assert!(js.contains("React.createElement"), "{js}");
        assert!(!js.contains("<h1"));
        assert!(js.contains("export default function Hero"));
    }

    #[test]
    fn test_types_are_stripped() {
        let js = transpile(
            "interface Props { title: string }\nexport const greet = (p: Props): string => p.title;",
            Path::new("greet.ts"),
        )
        .unwrap();

        assert!(!js.contains("interface"), "{js}");
        assert!(!js.contains(": string"));
        assert!(js.contains("p.title"));
    }

    #[test]
    fn test_syntax_error_names_file() {
        let err = transpile("export default function (", Path::new("broken.jsx")).unwrap_err();

        assert!(matches!(err, ScriptError::Parse { .. }));
        assert!(err.to_string().contains("broken.jsx"));
    }
}
