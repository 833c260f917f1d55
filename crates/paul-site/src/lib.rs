//! Page composition and static export for paul.
//!
//! - [`PageConfig`]/[`SectionConfig`]: what a page is made of
//! - [`Site`]: route → page map rendering pages into HTML documents
//! - [`ComponentResolver`]: how section component references are resolved
//! - [`StaticExporter`]: writes every page to disk
//! - [`AppDefinition`]: project definition loaded from `pages/index.*`
//!
//! # Example
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//!
//! use paul_components::ComponentRegistry;
//! use paul_site::{PageConfig, SectionConfig, Site};
//! use paul_styles::{StyleOptions, StyleProcessor};
//!
//! let site = Site::new(
//!     Arc::new(ComponentRegistry::with_builtins()?),
//!     Arc::new(StyleProcessor::new(StyleOptions::default())),
//! );
//! site.create_page("/", PageConfig::new("Home").with_section(SectionConfig::new("hero")))?;
//!
//! let html = site.render_page("/")?;
//! assert!(html.contains("Welcome to paul"));
//! # Ok(())
//! # }
//! ```

mod definition;
mod document;
mod export;
mod model;
mod resolver;
mod site;

use std::path::PathBuf;

use paul_components::{ComponentError, RegistryError};
use paul_styles::StyleError;

pub use definition::{AppDefinition, ComponentDefinition, DEFINITION_FILES, PageDefinition};
pub use document::DocumentExtras;
pub use export::{ExportError, StaticExporter};
pub use model::{ComponentRef, Layout, PageConfig, PageMeta, SectionConfig, SectionProps};
pub use resolver::{ComponentResolver, ResolveError};
pub use site::{Site, normalize_route};

/// Error raised while composing or rendering pages.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error("invalid route: {0:?}")]
    InvalidRoute(String),

    #[error("page not found: {0}")]
    PageNotFound(String),

    #[error("Failed to resolve component {component}: {source}")]
    Resolve {
        component: String,
        #[source]
        source: ResolveError,
    },

    #[error("Failed to render component {component}: {source}")]
    Render {
        component: String,
        #[source]
        source: ComponentError,
    },

    #[error(transparent)]
    Styles(#[from] StyleError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Failed to render document: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Invalid project definition {}: {message}", path.display())]
    Definition { path: PathBuf, message: String },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
