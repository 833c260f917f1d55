//! Static export of every page to HTML files.

use std::path::{Path, PathBuf};

use crate::{Site, SiteError};

/// Error raised while exporting a site.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Site(#[from] SiteError),

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes each route of a [`Site`] to `<output>/index.html` (root) or
/// `<output>/<route>.html`.
pub struct StaticExporter {
    output_dir: PathBuf,
}

impl StaticExporter {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// File a route is written to.
    #[must_use]
    pub fn file_for(&self, route: &str) -> PathBuf {
        let relative = route.trim_matches('/');
        if relative.is_empty() {
            self.output_dir.join("index.html")
        } else {
            self.output_dir.join(format!("{relative}.html"))
        }
    }

    /// Render and write every page. Returns the written files in route
    /// order.
    ///
    /// # Errors
    ///
    /// Stops at the first page that fails to render or write.
    pub fn export(&self, site: &Site) -> Result<Vec<PathBuf>, ExportError> {
        let mut written = Vec::new();
        for route in site.routes() {
            let html = site.render_page(&route)?;
            let path = self.file_for(&route);
            write_file(&path, &html)?;
            tracing::info!(route = %route, path = %path.display(), "Exported page");
            written.push(path);
        }
        Ok(written)
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), ExportError> {
    let io_error = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::write(path, content).map_err(io_error)
}
