//! ES module lowering for sandbox evaluation.
//!
//! The sandbox evaluates plain scripts, so module syntax is rewritten
//! statement by statement:
//!
//! | module syntax                      | script                                     |
//! |------------------------------------|--------------------------------------------|
//! | `import React from "react"`        | `var React = __paulDefault(require("react"))` |
//! | `import { h as el } from "paul"`   | `var el = require("paul").h`               |
//! | `import * as paul from "paul"`     | `var paul = require("paul")`               |
//! | `export default <expr>`            | `module.exports.default = (<expr>)`        |
//! | `export function Hero() {}`        | declaration + `module.exports.Hero = Hero` |
//! | `export { a as b }`                | `module.exports.b = a`                     |
//!
//! Everything else is copied verbatim.

use std::fmt::Write as _;
use std::path::Path;

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Declaration, ExportDefaultDeclarationKind, ImportDeclarationSpecifier, Statement,
};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};

use crate::ScriptError;

/// Modules a dynamic component may import.
pub const SANDBOX_MODULES: [&str; 2] = ["react", "paul"];

/// Rewrite module syntax in transpiled JavaScript into a script that
/// reports its exports through `module.exports`.
///
/// # Errors
///
/// Returns [`ScriptError::DisallowedImport`] for imports outside
/// [`SANDBOX_MODULES`], [`ScriptError::ReExport`] for `export ... from`, and
/// [`ScriptError::Parse`] if `source` does not parse.
pub fn lower_module(source: &str, path: &Path) -> Result<String, ScriptError> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, SourceType::mjs()).parse();
    if let Some(error) = parsed.errors.first() {
        return Err(ScriptError::Parse {
            path: path.to_path_buf(),
            message: error.to_string(),
        });
    }

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for statement in &parsed.program.body {
        let span = statement.span();
        let Some(lowered) = lower_statement(statement, source, path)? else {
            continue;
        };
        out.push_str(&source[cursor..span.start as usize]);
        out.push_str(&lowered);
        cursor = span.end as usize;
    }
    out.push_str(&source[cursor..]);
    Ok(out)
}

fn check_module(module: &str, path: &Path) -> Result<(), ScriptError> {
    if SANDBOX_MODULES.contains(&module) {
        Ok(())
    } else {
        Err(ScriptError::DisallowedImport {
            path: path.to_path_buf(),
            module: module.to_owned(),
        })
    }
}

/// Replacement text for a module statement, `None` for anything else.
fn lower_statement(
    statement: &Statement<'_>,
    source: &str,
    path: &Path,
) -> Result<Option<String>, ScriptError> {
    let mut out = String::new();
    match statement {
        Statement::ImportDeclaration(import) => {
            let module = import.source.value.as_str();
            check_module(module, path)?;
            let required = format!("require({module:?})");
            for specifier in import.specifiers.iter().flatten() {
                let _ = match specifier {
                    ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => writeln!(
                        out,
                        "var {} = __paulDefault({required});",
                        s.local.name
                    ),
                    ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                        writeln!(out, "var {} = {required};", s.local.name)
                    }
                    ImportDeclarationSpecifier::ImportSpecifier(s) => writeln!(
                        out,
                        "var {} = {required}[{:?}];",
                        s.local.name,
                        s.imported.name().as_str()
                    ),
                };
            }
            if out.is_empty() {
                let _ = writeln!(out, "{required};");
            }
        }
        Statement::ExportAllDeclaration(export) => {
            return Err(ScriptError::ReExport {
                path: path.to_path_buf(),
                module: export.source.value.to_string(),
            });
        }
        Statement::ExportDefaultDeclaration(export) => {
            let declaration = &export.declaration;
            let text = declaration.span().source_text(source);
            let named = match declaration {
                ExportDefaultDeclarationKind::FunctionDeclaration(f) => f.id.as_ref(),
                ExportDefaultDeclarationKind::ClassDeclaration(c) => c.id.as_ref(),
                _ => None,
            };
            if let Some(id) = named {
                let _ = write!(out, "{text}\nmodule.exports.default = {};", id.name);
            } else {
                let _ = write!(out, "module.exports.default = ({text});");
            }
        }
        Statement::ExportNamedDeclaration(export) => {
            if let Some(from) = &export.source {
                return Err(ScriptError::ReExport {
                    path: path.to_path_buf(),
                    module: from.value.to_string(),
                });
            }
            if let Some(declaration) = &export.declaration {
                out.push_str(declaration.span().source_text(source));
                for name in declared_names(declaration) {
                    let _ = write!(out, "\nmodule.exports.{name} = {name};");
                }
            }
            for specifier in &export.specifiers {
                let _ = write!(
                    out,
                    "module.exports[{:?}] = {};",
                    specifier.exported.name().as_str(),
                    specifier.local.name()
                );
            }
        }
        _ => return Ok(None),
    }
    Ok(Some(out))
}

fn declared_names(declaration: &Declaration<'_>) -> Vec<String> {
    match declaration {
        Declaration::VariableDeclaration(variables) => variables
            .declarations
            .iter()
            .filter_map(|d| d.id.get_identifier_name())
            .map(|name| name.to_string())
            .collect(),
        Declaration::FunctionDeclaration(f) => {
            f.id.iter().map(|id| id.name.to_string()).collect()
        }
        Declaration::ClassDeclaration(c) => c.id.iter().map(|id| id.name.to_string()).collect(),
        _ => Vec::new(),
    }
}
