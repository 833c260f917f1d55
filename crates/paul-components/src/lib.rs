//! Component model for paul landing pages.
//!
//! A component is a render function plus a mapping of default properties.
//! Rendering is a pure function of `defaults ⊕ props` (see [`merge_props`]):
//! the same inputs always produce the same markup and nothing is mutated.
//!
//! # Kinds
//!
//! - [`TemplateComponent`]: markup, style and alternate (JSX) templates
//!   rendered with minijinja. The built-ins are template components.
//! - [`DerivedComponent`]: an existing component with its own defaults and
//!   fixed overrides, e.g. a dark variant of the hero.
//! - Script components evaluated in a sandbox live in `paul-script` and
//!   implement the same [`Component`] trait.
//!
//! # Registry
//!
//! [`ComponentRegistry`] maps names to components in two tiers. Built-ins
//! are seeded at construction; custom registrations shadow them and can be
//! cleared without losing the built-ins.
//!
//! ```
//! use paul_components::{ComponentRegistry, render_component};
//! use serde_json::json;
//!
//! let registry = ComponentRegistry::with_builtins().unwrap();
//! let hero = registry.get("hero").unwrap();
//! let props = json!({"title": "Launch day"});
//! let rendered = render_component(hero.as_ref(), props.as_object()).unwrap();
//! assert!(rendered.html.contains("Launch day"));
//! ```

pub mod builtins;
mod derived;
mod registry;
mod template;

use std::path::PathBuf;

use serde_json::Value;

pub use derived::DerivedComponent;
pub use registry::{ComponentRegistry, RegistryError};
pub use template::{TemplateComponent, escape_html, template_env};

/// Component properties: a JSON object.
pub type Props = serde_json::Map<String, Value>;

/// A renderable landing-page section.
///
/// `render` receives fully merged props. Implementations must not depend
/// on anything but their input, so the composer can re-render a page from
/// its stored configuration at any time.
pub trait Component: Send + Sync {
    /// Default property mapping. Anything other than a JSON object is
    /// rejected at registration.
    fn default_props(&self) -> &Value;

    /// Render markup for fully merged props.
    fn render(&self, props: &Props) -> Result<String, ComponentError>;

    /// CSS contributed by this component for the given props.
    fn styles(&self, _props: &Props) -> Result<Option<String>, ComponentError> {
        Ok(None)
    }

    /// Alternate component-tree source (JSX) for the given props, if the
    /// component has one.
    fn alt_render(&self, _props: &Props) -> Option<Result<String, ComponentError>> {
        None
    }
}

/// Markup and CSS produced by rendering one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedComponent {
    pub html: String,
    pub css: Option<String>,
}

/// Right-biased shallow merge of `overrides` onto `defaults`.
///
/// Returns a new map; `defaults` is never modified. Non-object defaults
/// contribute nothing. An override of `null` is kept and renders as empty.
#[must_use]
pub fn merge_props(defaults: &Value, overrides: Option<&Props>) -> Props {
    let mut merged = defaults.as_object().cloned().unwrap_or_default();
    if let Some(overrides) = overrides {
        merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}

/// Render `component` with its defaults merged under `overrides`.
pub fn render_component(
    component: &dyn Component,
    overrides: Option<&Props>,
) -> Result<RenderedComponent, ComponentError> {
    let props = merge_props(component.default_props(), overrides);
    Ok(RenderedComponent {
        html: component.render(&props)?,
        css: component.styles(&props)?,
    })
}

/// Error raised while building or rendering a component.
#[derive(Debug, thiserror::Error)]
pub enum ComponentError {
    /// A template failed to compile or render.
    #[error("Template {template} failed: {source}")]
    Template {
        template: String,
        #[source]
        source: minijinja::Error,
    },

    /// A component file could not be read.
    #[error("Failed to read component {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failure reported by an external component implementation.
    #[error(transparent)]
    External(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    struct Greeting {
        defaults: Value,
    }

    impl Component for Greeting {
        fn default_props(&self) -> &Value {
            &self.defaults
        }

        fn render(&self, props: &Props) -> Result<String, ComponentError> {
            let name = props.get("name").and_then(Value::as_str).unwrap_or("");
            Ok(format!("<p>Hello {name}</p>"))
        }
    }

    fn greeting() -> Greeting {
        Greeting {
            defaults: json!({"name": "world", "tone": "warm"}),
        }
    }

    #[test]
    fn test_merge_is_right_biased() {
        let defaults = json!({"a": 1, "b": 2});
        let overrides = json!({"b": 3, "c": 4});

        let merged = merge_props(&defaults, overrides.as_object());

        assert_eq!(Value::Object(merged), json!({"a": 1, "b": 3, "c": 4}));
    }

    #[test]
    fn test_merge_does_not_touch_defaults() {
        let defaults = json!({"a": 1});
        let overrides = json!({"a": 2});

        let _ = merge_props(&defaults, overrides.as_object());

        assert_eq!(defaults, json!({"a": 1}));
    }

    #[test]
    fn test_merge_is_shallow() {
        let defaults = json!({"links": [{"text": "Docs"}], "nested": {"x": 1, "y": 2}});
        let overrides = json!({"nested": {"x": 5}});

        let merged = merge_props(&defaults, overrides.as_object());

        assert_eq!(merged["nested"], json!({"x": 5}));
        assert_eq!(merged["links"], json!([{"text": "Docs"}]));
    }

    #[test]
    fn test_merge_keeps_explicit_null() {
        let merged = merge_props(&json!({"a": "x"}), json!({"a": null}).as_object());
        assert_eq!(merged["a"], Value::Null);
    }

    #[test]
    fn test_render_without_props_equals_render_with_defaults() {
        let component = greeting();
        let defaults = component.defaults.clone();

        let bare = render_component(&component, None).unwrap();
        let explicit = render_component(&component, defaults.as_object()).unwrap();

        assert_eq!(bare, explicit);
        assert_eq!(bare.html, "<p>Hello world</p>");
        assert_eq!(bare.css, None);
    }

    #[test]
    fn test_render_with_props_equals_render_of_merge() {
        let component = greeting();
        let props = json!({"name": "Acme"});

        let rendered = render_component(&component, props.as_object()).unwrap();
        let merged = merge_props(&component.defaults, props.as_object());

        assert_eq!(rendered.html, component.render(&merged).unwrap());
    }

    #[test]
    fn test_alt_render_defaults_to_none() {
        assert!(greeting().alt_render(&Props::new()).is_none());
    }
}
