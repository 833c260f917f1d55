//! Name → component lookup with built-in and custom tiers.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use crate::{Component, ComponentError, builtins};

/// Error raised by [`ComponentRegistry`] operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A component failed shape validation at registration.
    #[error("Failed to register component {name}: {field} {message}")]
    Invalid {
        /// Name the component was registered under.
        name: String,
        /// Offending field (`name` or `default_props`).
        field: &'static str,
        message: String,
    },

    /// No custom or built-in component has this name.
    #[error("Component {0} not found")]
    NotFound(String),

    /// A built-in failed to initialise.
    #[error("Failed to initialise built-in components: {0}")]
    Builtin(#[from] ComponentError),
}

/// Registry of components available to pages.
///
/// Lookups consult custom registrations first, then built-ins. Registering
/// a name again replaces the previous custom component. The registry is
/// shared by `Arc` between the composer and the preview server, so
/// registration takes `&self`.
pub struct ComponentRegistry {
    builtins: HashMap<String, Arc<dyn Component>>,
    custom: RwLock<HashMap<String, Arc<dyn Component>>>,
}

impl ComponentRegistry {
    /// Create a registry with no components at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            builtins: HashMap::new(),
            custom: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry seeded with `hero`, `cta` and `footer`.
    pub fn with_builtins() -> Result<Self, RegistryError> {
        let mut registry = Self::empty();
        for (name, component) in builtins::all()? {
            registry.builtins.insert(name.to_owned(), component);
        }
        Ok(registry)
    }

    /// Register a custom component, validating its shape.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Invalid`] naming the offending field when the
    /// name is blank or the default props are not a mapping.
    pub fn register(
        &self,
        name: &str,
        component: Arc<dyn Component>,
    ) -> Result<(), RegistryError> {
        if name.trim().is_empty() {
            return Err(RegistryError::Invalid {
                name: name.to_owned(),
                field: "name",
                message: "must not be empty".to_owned(),
            });
        }
        if !component.default_props().is_object() {
            return Err(RegistryError::Invalid {
                name: name.to_owned(),
                field: "default_props",
                message: format!("must be a mapping, got {}", json_kind(component.default_props())),
            });
        }

        let previous = self
            .custom
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_owned(), component);
        tracing::debug!(
            name,
            replaced = previous.is_some(),
            shadows_builtin = self.builtins.contains_key(name),
            "Registered component"
        );
        Ok(())
    }

    /// Look up a component: custom first, then built-in.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] carrying the name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Component>, RegistryError> {
        if let Some(component) = self
            .custom
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Ok(Arc::clone(component));
        }
        self.builtin(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_owned()))
    }

    /// Look up a built-in, ignoring custom registrations.
    #[must_use]
    pub fn builtin(&self, name: &str) -> Option<Arc<dyn Component>> {
        self.builtins.get(name).map(Arc::clone)
    }

    /// Remove all custom registrations. Built-ins are untouched.
    pub fn clear(&self) {
        self.custom
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
            || self
                .custom
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .contains_key(name)
    }

    #[must_use]
    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    /// All resolvable names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let custom = self.custom.read().unwrap_or_else(PoisonError::into_inner);
        self.builtins
            .keys()
            .chain(custom.keys())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a list",
        serde_json::Value::Object(_) => "a mapping",
    }
}
