//! Script handling for paul.
//!
//! Two consumers share this crate:
//!
//! - the build pipeline, which needs [`transpile`] (JSX and TypeScript to
//!   plain JavaScript) and [`minify`]
//! - the dynamic component loader, which additionally lowers ES modules to a
//!   CommonJS-style script ([`lower_module`]) and evaluates it in an isolated
//!   JavaScript [`Sandbox`]
//!
//! The sandbox exposes nothing but an element builder and the `react` and
//! `paul` modules. Importing anything else is rejected before evaluation
//! when it can be seen statically, and by `require` at run time otherwise.

mod loader;
mod minify;
mod module;
mod sandbox;
mod transpile;

use std::path::PathBuf;

pub use loader::{FileComponentLoader, ScriptComponent, ScriptDialect};
pub use minify::{MinifyConfig, minify};
pub use module::{SANDBOX_MODULES, lower_module};
pub use sandbox::{Described, Sandbox};
pub use transpile::transpile;

/// Error raised while transforming or evaluating a script.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// A source file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source is not valid JavaScript/TypeScript.
    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// The JSX/TypeScript transform reported an error.
    #[error("Failed to transpile {}: {message}", path.display())]
    Transform { path: PathBuf, message: String },

    /// The script imports a module outside the sandbox.
    #[error("{} imports disallowed module {module:?}", path.display())]
    DisallowedImport { path: PathBuf, module: String },

    /// `export ... from` re-exports are not supported in components.
    #[error("{} re-exports from {module:?}; components must define their exports", path.display())]
    ReExport { path: PathBuf, module: String },

    /// The module's export cannot be rendered.
    #[error("Default export of {} is not renderable (got {kind})", path.display())]
    NotRenderable { path: PathBuf, kind: String },

    /// The script threw while being evaluated.
    #[error("Failed to evaluate {}: {message}", path.display())]
    Evaluation { path: PathBuf, message: String },

    /// The file extension or dialect name is not a known script dialect.
    #[error("unsupported component type: {0}")]
    UnsupportedDialect(String),

    /// A markup component failed to load.
    #[error(transparent)]
    Component(#[from] paul_components::ComponentError),

    /// The sandbox thread could not be started or has stopped.
    #[error("JavaScript sandbox unavailable: {0}")]
    Unavailable(String),
}
