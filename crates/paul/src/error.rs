//! CLI error types.

use paul_build::BuildError;
use paul_components::{ComponentError, RegistryError};
use paul_config::ConfigError;
use paul_script::ScriptError;
use paul_server::ServerError;
use paul_site::{ExportError, SiteError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Site(#[from] SiteError),

    #[error("{0}")]
    Registry(#[from] RegistryError),

    #[error("{0}")]
    Component(#[from] ComponentError),

    #[error("{0}")]
    Script(#[from] ScriptError),

    #[error("{0}")]
    Export(#[from] ExportError),

    #[error("{0}")]
    Build(#[from] BuildError),

    #[error("{0}")]
    Server(#[from] ServerError),

    #[error("{0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("Failed to render project template: {0}")]
    Template(#[from] minijinja::Error),

    #[error("{0}")]
    Validation(String),
}
