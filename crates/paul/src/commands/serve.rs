//! `paul serve` command implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use paul_config::{CliSettings, Config};
use paul_server::{ReloadError, SiteReloader, run_server, server_config_from_paul_config};

use crate::error::CliError;
use crate::output::Output;
use crate::project::Project;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover paul.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Reload the browser when project files change.
    #[arg(long)]
    watch: bool,

    /// Load JavaScript components from project files.
    #[arg(long)]
    dynamic: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the project does not load or
    /// the server fails to start.
    pub(crate) async fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            live_reload_enabled: self.watch.then_some(true),
            dynamic_components: self.dynamic.then_some(true),
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        ensure_project_dir(&config.project_resolved.project_dir)?;

        let project = Arc::new(Project::new(config)?);
        let site = project.load_site()?;
        let config = project.config();

        output.info(&format!(
            "Project: {}",
            config.project_resolved.root.display()
        ));
        output.success(&format!(
            "Server running at http://{}:{}",
            config.server.host, config.server.port
        ));
        if config.live_reload.enabled {
            output.info("Watching for file changes...");
        }
        if config.components.dynamic {
            output.warning("Dynamic components enabled: project scripts run in the sandbox");
        }

        let server_config = server_config_from_paul_config(config, version.to_owned());
        let reloader: Arc<dyn SiteReloader> = {
            let project = Arc::clone(&project);
            Arc::new(move || project.load_site().map_err(ReloadError::from))
        };
        run_server(server_config, site, Some(reloader)).await?;

        Ok(())
    }
}

/// Ensure the `.paul/` project directory exists with a `.gitignore`.
fn ensure_project_dir(project_dir: &Path) -> Result<(), CliError> {
    std::fs::create_dir_all(project_dir).map_err(|e| {
        CliError::Validation(format!(
            "Failed to create project directory {}: {e}",
            project_dir.display()
        ))
    })?;

    let gitignore_path = project_dir.join(".gitignore");
    if !gitignore_path.exists() {
        let _ = std::fs::write(&gitignore_path, "# Automatically created by paul\n*\n");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_ensure_project_dir_writes_gitignore_once() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join(".paul");

        ensure_project_dir(&dir).unwrap();
        std::fs::write(dir.join(".gitignore"), "custom\n").unwrap();
        ensure_project_dir(&dir).unwrap();

        assert_eq!(std::fs::read_to_string(dir.join(".gitignore")).unwrap(), "custom\n");
    }
}
