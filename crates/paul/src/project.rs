//! Loading a project from disk into a [`Site`].

use std::sync::Arc;
use std::time::Instant;

use paul_components::ComponentRegistry;
use paul_config::Config;
use paul_script::FileComponentLoader;
use paul_site::{AppDefinition, Site};
use paul_styles::{StyleOptions, StyleProcessor};

use crate::error::CliError;

/// A configured project. Builds a fresh [`Site`] on every load so the
/// preview server can swap it after file changes.
pub(crate) struct Project {
    config: Config,
    loader: Option<Arc<FileComponentLoader>>,
}

impl Project {
    /// Prepare the project. The script sandbox starts only when dynamic
    /// components are enabled.
    pub(crate) fn new(config: Config) -> Result<Self, CliError> {
        let loader = if config.components.dynamic {
            Some(Arc::new(FileComponentLoader::new(
                &config.project_resolved.root,
            )?))
        } else {
            None
        };
        Ok(Self { config, loader })
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    /// Read the page definition and render-check every page.
    ///
    /// # Errors
    ///
    /// Returns the first definition, component or page error.
    pub(crate) fn load_site(&self) -> Result<Site, CliError> {
        let start = Instant::now();
        let paths = &self.config.project_resolved;

        let registry = Arc::new(ComponentRegistry::with_builtins()?);
        let styles = Arc::new(StyleProcessor::new(StyleOptions {
            content_globs: self.config.styles_resolved.content.clone(),
            load_paths: self.config.styles_resolved.load_paths.clone(),
            minify: self.config.build_resolved.mode.is_production(),
            base_dir: paths.root.clone(),
        }));

        let mut site = Site::new(registry, styles);
        if let Some(loader) = &self.loader {
            loader.invalidate();
            site = site.with_file_loader(Arc::clone(loader));
        }

        let definition = AppDefinition::discover(&paths.pages_dir, &paths.root)?;
        let routes = site.install(&definition)?;

        tracing::info!(
            pages = routes.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Loaded site"
        );
        Ok(site)
    }
}
