//! Project definitions: `pages/index.{toml,yaml,yml,json}`.
//!
//! ```toml
//! styles = ["styles/main.css"]
//!
//! [components.announcement]
//! extends = "hero"
//! defaults = { backgroundColor = "#111827", textColor = "#ffffff" }
//!
//! [components.card]
//! script = "components/Card.jsx"
//!
//! [[pages]]
//! route = "/"
//! meta = { title = "Acme", description = "Acme landing page" }
//!
//! [[pages.sections]]
//! component = "announcement"
//! props = { title = "Welcome" }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use paul_components::{Component, DerivedComponent, Props, TemplateComponent};
use paul_script::ScriptDialect;
use paul_styles::StyleSource;
use serde::Deserialize;
use serde_json::Value;

use crate::resolver::ComponentResolver;
use crate::{ComponentRef, PageConfig, SiteError};

/// Definition file names tried in order.
pub const DEFINITION_FILES: [&str; 4] = ["index.toml", "index.yaml", "index.yml", "index.json"];

/// A whole project: global styles, custom components and pages.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppDefinition {
    pub styles: Vec<StyleSource>,
    pub components: BTreeMap<String, ComponentDefinition>,
    pub pages: Vec<PageDefinition>,
    /// Directory component files resolve against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// A page entry: its route plus the page configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PageDefinition {
    #[serde(default = "root_route")]
    pub route: String,
    #[serde(flatten)]
    pub config: PageConfig,
}

fn root_route() -> String {
    "/".to_owned()
}

/// A custom component. Exactly one of `extends`, `template` and `script`
/// must be set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComponentDefinition {
    /// Registered component to derive from.
    pub extends: Option<String>,
    /// Markup template file.
    pub template: Option<PathBuf>,
    /// Script component file, loaded by the dynamic loader.
    pub script: Option<PathBuf>,
    #[serde(alias = "type")]
    pub dialect: Option<ScriptDialect>,
    /// Defaults layered over the base component's.
    pub defaults: Props,
    /// Props forced on every render, whatever the caller passes.
    #[serde(alias = "overrides")]
    pub fixed: Props,
}

impl ComponentDefinition {
    /// Build the component this definition describes.
    pub(crate) fn build(
        &self,
        name: &str,
        definition: &AppDefinition,
        resolver: &dyn ComponentResolver,
    ) -> Result<Arc<dyn Component>, SiteError> {
        let invalid = |message: &str| SiteError::Definition {
            path: definition.base_dir.clone(),
            message: format!("component {name}: {message}"),
        };

        let base: Arc<dyn Component> = match (&self.extends, &self.template, &self.script) {
            (Some(extends), None, None) => {
                resolve(resolver, &ComponentRef::Named(extends.clone()), name)?
            }
            (None, Some(template), None) => {
                let path = definition.base_dir.join(template);
                let component = TemplateComponent::from_file(&path, Value::Object(Props::new()))
                    .map_err(|source| SiteError::Render {
                        component: name.to_owned(),
                        source,
                    })?;
                Arc::new(component)
            }
            (None, None, Some(script)) => resolve(
                resolver,
                &ComponentRef::File {
                    path: script.clone(),
                    dialect: self.dialect,
                },
                name,
            )?,
            (None, None, None) => {
                return Err(invalid("one of extends, template or script is required"));
            }
            _ => return Err(invalid("set only one of extends, template or script")),
        };

        if self.defaults.is_empty() && self.fixed.is_empty() {
            return Ok(base);
        }
        Ok(Arc::new(DerivedComponent::new(
            base,
            self.defaults.clone(),
            self.fixed.clone(),
        )))
    }
}

fn resolve(
    resolver: &dyn ComponentResolver,
    reference: &ComponentRef,
    name: &str,
) -> Result<Arc<dyn Component>, SiteError> {
    resolver
        .resolve(reference)
        .map_err(|source| SiteError::Resolve {
            component: name.to_owned(),
            source,
        })
}

impl AppDefinition {
    /// Custom component names, each placed after the custom component it
    /// extends. A component extending its own name derives from the
    /// registered component of that name.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Definition`] naming the loop when custom
    /// components extend each other in a cycle.
    pub fn component_build_order(&self) -> Result<Vec<&str>, SiteError> {
        let mut order = Vec::with_capacity(self.components.len());
        let mut placed = BTreeSet::new();

        for name in self.components.keys() {
            let mut chain: Vec<&str> = Vec::new();
            let mut current = name.as_str();
            while !placed.contains(current) {
                if let Some(start) = chain.iter().position(|seen| *seen == current) {
                    let cycle: Vec<&str> = chain[start..].iter().copied().chain([current]).collect();
                    return Err(SiteError::Definition {
                        path: self.base_dir.clone(),
                        message: format!("component {current}: extends cycle {}", cycle.join(" -> ")),
                    });
                }
                chain.push(current);
                match self.components.get(current).and_then(|c| c.extends.as_deref()) {
                    Some(base) if base != current && self.components.contains_key(base) => {
                        current = base;
                    }
                    _ => break,
                }
            }
            for name in chain.into_iter().rev() {
                placed.insert(name);
                order.push(name);
            }
        }
        Ok(order)
    }

    /// Find and parse the definition file in `pages_dir`. Relative paths
    /// in it resolve against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Definition`] if no definition file exists or it
    /// fails to parse.
    pub fn discover(pages_dir: &Path, base_dir: &Path) -> Result<Self, SiteError> {
        let path = DEFINITION_FILES
            .iter()
            .map(|name| pages_dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| SiteError::Definition {
                path: pages_dir.to_path_buf(),
                message: format!("no page definition found (expected one of {})", DEFINITION_FILES.join(", ")),
            })?;
        Self::load(&path, base_dir)
    }

    /// Parse a definition file; the format follows the extension.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Io`] if the file cannot be read and
    /// [`SiteError::Definition`] if it does not parse.
    pub fn load(path: &Path, base_dir: &Path) -> Result<Self, SiteError> {
        let content = std::fs::read_to_string(path).map_err(|source| SiteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let fail = |message: String| SiteError::Definition {
            path: path.to_path_buf(),
            message,
        };

        let mut definition: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => serde_yaml::from_str(&content).map_err(|e| fail(e.to_string()))?,
            Some("json") => serde_json::from_str(&content).map_err(|e| fail(e.to_string()))?,
            _ => toml::from_str(&content).map_err(|e| fail(e.to_string()))?,
        };
        definition.base_dir = base_dir.to_path_buf();
        tracing::debug!(
            path = %path.display(),
            pages = definition.pages.len(),
            components = definition.components.len(),
            "Loaded project definition"
        );
        Ok(definition)
    }
}

#[cfg(test)]
mod tests {
    use paul_components::ComponentRegistry;
    use paul_styles::{StyleOptions, StyleProcessor};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{SectionProps, Site};

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn site(root: &Path) -> Site {
        Site::new(
            Arc::new(ComponentRegistry::with_builtins().unwrap()),
            Arc::new(StyleProcessor::new(StyleOptions {
                base_dir: root.to_path_buf(),
                ..StyleOptions::default()
            })),
        )
    }

    #[test]
    fn test_toml_definition() {
        let tmp = tempfile::TempDir::new().unwrap();
        write(
            tmp.path(),
            "pages/index.toml",
            r##"
styles = [{ type = "css", content = ".brand { color: #333; }" }]

[components.announcement]
extends = "hero"
defaults = { subtitle = "Limited offer" }
fixed = { ctaText = "" }

[[pages]]
route = "/"
meta = { title = "Acme" }

[[pages.sections]]
component = "announcement"
props = { title = "Welcome", ctaText = "ignored" }
layout = { order = 1 }
"##,
        );

        let definition = AppDefinition::discover(&tmp.path().join("pages"), tmp.path()).unwrap();
        assert_eq!(definition.pages.len(), 1);
        assert_eq!(definition.pages[0].route, "/");

        let site = site(tmp.path());
        let routes = site.install(&definition).unwrap();
        assert_eq!(routes, vec!["/".to_owned()]);

        let html = site.render_page("/").unwrap();
        assert!(html.contains("<h1>Welcome</h1>"));
        assert!(html.contains("Limited offer"));
        assert!(html.contains("class=\"paul-hero-cta\"></a>"));
        assert!(html.contains(".brand"));
    }

    #[test]
    fn test_yaml_definition_with_template_component() {
        let tmp = tempfile::TempDir::new().unwrap();
        write(tmp.path(), "components/note.html", "<p class=\"note\">{{ text }}</p>");
        write(
            tmp.path(),
            "pages/index.yaml",
            r"
components:
  note:
    template: components/note.html
    defaults:
      text: Default note
pages:
  - route: /notes
    meta:
      title: Notes
    sections:
      - component: note
      - component: note
        props:
          text: Second
      - component: note
        props: ~
",
        );

        let definition = AppDefinition::discover(&tmp.path().join("pages"), tmp.path()).unwrap();
        assert_eq!(definition.pages[0].config.sections[2].props, SectionProps::Omit);

        let site = site(tmp.path());
        site.install(&definition).unwrap();
        let html = site.render_page("/notes").unwrap();

        assert!(html.contains("<p class=\"note\">Default note</p><p class=\"note\">Second</p></div>"));
    }

    #[test]
    fn test_json_definition() {
        let tmp = tempfile::TempDir::new().unwrap();
        write(
            tmp.path(),
            "pages/index.json",
            r#"{"pages": [{"route": "about", "meta": {"title": "About"}, "sections": [{"component": "cta"}]}]}"#,
        );

        let definition = AppDefinition::discover(&tmp.path().join("pages"), tmp.path()).unwrap();
        let site = site(tmp.path());

        assert_eq!(site.install(&definition).unwrap(), vec!["/about".to_owned()]);
    }

    #[test]
    fn test_missing_definition() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = AppDefinition::discover(tmp.path(), tmp.path()).unwrap_err();
        assert!(matches!(err, SiteError::Definition { .. }));
        assert!(err.to_string().contains("index.toml"));
    }

    #[test]
    fn test_component_needs_exactly_one_source() {
        let definition: AppDefinition = toml::from_str(
            "[components.broken]\nextends = \"hero\"\ntemplate = \"x.html\"\n",
        )
        .unwrap();

        let err = site(Path::new(".")).install(&definition).unwrap_err();
        assert!(err.to_string().contains("component broken"));
    }

    #[test]
    fn test_extends_custom_component_declared_later() {
        let definition: AppDefinition = toml::from_str(
            r#"
[components.announcement]
extends = "banner"
fixed = { subtitle = "Ends Friday" }

[components.banner]
extends = "hero"
defaults = { title = "Spring sale" }

[[pages]]
[[pages.sections]]
component = "announcement"
"#,
        )
        .unwrap();

        assert_eq!(
            definition.component_build_order().unwrap(),
            vec!["banner", "announcement"]
        );

        let site = site(Path::new("."));
        site.install(&definition).unwrap();
        let html = site.render_page("/").unwrap();
        assert!(html.contains("<h1>Spring sale</h1>"));
        assert!(html.contains("Ends Friday"));
    }

    #[test]
    fn test_extends_cycle_is_named() {
        let definition: AppDefinition = toml::from_str(
            "[components.a]\nextends = \"b\"\n[components.b]\nextends = \"c\"\n[components.c]\nextends = \"a\"\n",
        )
        .unwrap();

        let err = site(Path::new(".")).install(&definition).unwrap_err();

        assert!(matches!(err, SiteError::Definition { .. }));
        assert!(err.to_string().contains("a -> b -> c -> a"), "{err}");
    }

    #[test]
    fn test_extending_own_name_uses_builtin() {
        let definition: AppDefinition =
            toml::from_str("[components.hero]\nextends = \"hero\"\ndefaults = { title = \"Ours\" }\n")
                .unwrap();

        assert_eq!(definition.component_build_order().unwrap(), vec!["hero"]);
    }

    #[test]
    fn test_script_component_requires_loader() {
        let definition: AppDefinition =
            toml::from_str("[components.card]\nscript = \"components/Card.jsx\"\n").unwrap();

        let err = site(Path::new(".")).install(&definition).unwrap_err();
        assert!(matches!(err, SiteError::Resolve { ref component, .. } if component == "card"));
    }
}
