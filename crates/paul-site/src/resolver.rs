//! Resolution of [`ComponentRef`]s to components.

use std::path::PathBuf;
use std::sync::Arc;

use paul_components::{Component, ComponentRegistry, RegistryError};
use paul_script::{FileComponentLoader, ScriptError};

use crate::ComponentRef;

/// Error raised when a section's component cannot be resolved.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A file component was referenced without a loader.
    #[error(
        "Cannot load {}: dynamic components are disabled (set [components] dynamic = true)",
        path.display()
    )]
    DynamicDisabled { path: PathBuf },

    #[error(transparent)]
    Script(#[from] ScriptError),
}

/// Turns a section's component reference into something renderable.
pub trait ComponentResolver: Send + Sync {
    fn resolve(&self, reference: &ComponentRef) -> Result<Arc<dyn Component>, ResolveError>;

    /// Drop anything cached while resolving.
    fn invalidate(&self) {}
}

/// Names come from the registry, files from the optional dynamic loader.
pub(crate) struct DefaultResolver {
    pub(crate) registry: Arc<ComponentRegistry>,
    pub(crate) loader: Option<Arc<FileComponentLoader>>,
}

impl ComponentResolver for DefaultResolver {
    fn resolve(&self, reference: &ComponentRef) -> Result<Arc<dyn Component>, ResolveError> {
        match reference {
            ComponentRef::Named(name) => Ok(self.registry.get(name)?),
            ComponentRef::File { path, dialect } => {
                let loader = self
                    .loader
                    .as_ref()
                    .ok_or_else(|| ResolveError::DynamicDisabled { path: path.clone() })?;
                Ok(loader.load(path, *dialect)?)
            }
        }
    }

    fn invalidate(&self) {
        if let Some(loader) = &self.loader {
            loader.invalidate();
        }
    }
}
