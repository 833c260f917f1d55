//! Page and section configuration.
//!
//! These types deserialize from the `[[pages]]` tables of a project
//! definition and can be built in code with the `with_*` helpers.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use paul_components::Props;
use paul_script::ScriptDialect;
use paul_styles::StyleSource;
use serde::{Deserialize, Deserializer, Serialize};

/// Document metadata injected into the HTML shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub lang: String,
    /// Additional `<meta name=... content=...>` tags.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl Default for PageMeta {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            lang: "en".to_owned(),
            extra: BTreeMap::new(),
        }
    }
}

/// One page: metadata, ordered sections and page-level styles.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub meta: PageMeta,
    pub sections: Vec<SectionConfig>,
    pub styles: Vec<StyleSource>,
}

impl PageConfig {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            meta: PageMeta {
                title: title.into(),
                ..PageMeta::default()
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.meta.description = description.into();
        self
    }

    #[must_use]
    pub fn with_section(mut self, section: SectionConfig) -> Self {
        self.sections.push(section);
        self
    }

    #[must_use]
    pub fn with_style(mut self, source: StyleSource) -> Self {
        self.styles.push(source);
        self
    }
}

/// Which component renders a section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ComponentRef {
    /// A registered component name.
    Named(String),
    /// A component file loaded by the dynamic loader.
    File {
        path: PathBuf,
        #[serde(default, alias = "type")]
        dialect: Option<ScriptDialect>,
    },
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::File { path, .. } => write!(f, "{}", path.display()),
        }
    }
}

impl From<&str> for ComponentRef {
    fn from(name: &str) -> Self {
        Self::Named(name.to_owned())
    }
}

/// Props given to a section.
///
/// An absent `props` key uses the component defaults. An explicit `null`
/// removes the section from the page.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SectionProps {
    #[default]
    Default,
    Omit,
    Props(Props),
}

impl SectionProps {
    /// Overrides to merge onto the component defaults.
    #[must_use]
    pub fn overrides(&self) -> Option<&Props> {
        match self {
            Self::Props(props) => Some(props),
            Self::Default | Self::Omit => None,
        }
    }

    #[must_use]
    pub fn is_omitted(&self) -> bool {
        matches!(self, Self::Omit)
    }
}

impl<'de> Deserialize<'de> for SectionProps {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Props>::deserialize(deserializer)? {
            Some(props) => Self::Props(props),
            None => Self::Omit,
        })
    }
}

/// Placement of a section on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Layout {
    /// Sort key; sections without one come after all ordered sections.
    pub order: Option<i64>,
    /// Wrapper `<div>` class.
    #[serde(alias = "containerClass")]
    pub container_class: Option<String>,
    /// Extra classes on the wrapper.
    #[serde(alias = "extraClass")]
    pub extra_class: Option<String>,
}

impl Layout {
    /// Wrap section markup in the configured container.
    pub(crate) fn wrap(&self, html: &str) -> String {
        let classes: Vec<&str> = [self.container_class.as_deref(), self.extra_class.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect();
        if classes.is_empty() {
            return html.to_owned();
        }
        format!(
            "<div class=\"{}\">{html}</div>",
            paul_components::escape_html(&classes.join(" "))
        )
    }
}

/// One component instance on a page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SectionConfig {
    pub component: ComponentRef,
    #[serde(default)]
    pub props: SectionProps,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub styles: Vec<StyleSource>,
}

impl SectionConfig {
    #[must_use]
    pub fn new(component: impl Into<ComponentRef>) -> Self {
        Self {
            component: component.into(),
            props: SectionProps::Default,
            layout: Layout::default(),
            styles: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_props(mut self, props: Props) -> Self {
        self.props = SectionProps::Props(props);
        self
    }

    #[must_use]
    pub fn with_order(mut self, order: i64) -> Self {
        self.layout.order = Some(order);
        self
    }

    #[must_use]
    pub fn with_container(mut self, class: impl Into<String>) -> Self {
        self.layout.container_class = Some(class.into());
        self
    }

    #[must_use]
    pub fn with_extra_class(mut self, class: impl Into<String>) -> Self {
        self.layout.extra_class = Some(class.into());
        self
    }

    #[must_use]
    pub fn with_style(mut self, source: StyleSource) -> Self {
        self.styles.push(source);
        self
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[derive(Deserialize)]
    struct Sections {
        sections: Vec<SectionConfig>,
    }

    #[test]
    fn test_props_absent_null_and_empty() {
        let parsed: Sections = serde_json::from_value(json!({
            "sections": [
                {"component": "hero"},
                {"component": "cta", "props": null},
                {"component": "footer", "props": {}},
            ]
        }))
        .unwrap();

        assert_eq!(parsed.sections[0].props, SectionProps::Default);
        assert_eq!(parsed.sections[1].props, SectionProps::Omit);
        assert_eq!(parsed.sections[2].props, SectionProps::Props(Props::new()));
    }

    #[test]
    fn test_component_ref_forms() {
        let parsed: Sections = toml::from_str(
            r#"
[[sections]]
component = "hero"

[[sections]]
component = { path = "components/Card.jsx" }

[[sections]]
component = { path = "components/banner.js", type = "component" }
"#,
        )
        .unwrap();

        assert_eq!(parsed.sections[0].component, ComponentRef::from("hero"));
        assert_eq!(
            parsed.sections[1].component,
            ComponentRef::File {
                path: PathBuf::from("components/Card.jsx"),
                dialect: None,
            }
        );
        assert_eq!(
            parsed.sections[2].component,
            ComponentRef::File {
                path: PathBuf::from("components/banner.js"),
                dialect: Some(ScriptDialect::Component),
            }
        );
    }

    #[test]
    fn test_layout_aliases() {
        let layout: Layout = serde_json::from_value(json!({
            "order": 2,
            "containerClass": "container",
            "extraClass": "py-8",
        }))
        .unwrap();

        assert_eq!(layout.order, Some(2));
        assert_eq!(layout.wrap("<p></p>"), "<div class=\"container py-8\"><p></p></div>");
    }

    #[test]
    fn test_wrap_variants() {
        let bare = Layout::default();
        assert_eq!(bare.wrap("<p></p>"), "<p></p>");

        let extra_only = Layout {
            extra_class: Some("highlight".to_owned()),
            ..Layout::default()
        };
        assert_eq!(extra_only.wrap("<p></p>"), "<div class=\"highlight\"><p></p></div>");
    }

    #[test]
    fn test_meta_extra_tags() {
        let meta: PageMeta = toml::from_str(
            "title = \"Home\"\nkeywords = \"landing, pages\"\n",
        )
        .unwrap();

        assert_eq!(meta.title, "Home");
        assert_eq!(meta.lang, "en");
        assert_eq!(meta.extra.get("keywords").map(String::as_str), Some("landing, pages"));
    }
}
