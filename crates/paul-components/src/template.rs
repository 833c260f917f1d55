//! Components defined by minijinja templates.
//!
//! Markup is compiled under an `.html` name so every interpolated value is
//! HTML-escaped. Style and alternate templates are compiled under `.css`
//! and `.jsx` names and are not escaped. `null` and missing values render
//! as empty text.

use std::fmt::Write as _;
use std::path::Path;

use minijinja::{AutoEscape, Environment, ErrorKind, State, Value as TemplateValue};
use serde_json::Value;

use crate::{Component, ComponentError, Props};

const MARKUP: &str = "markup.html";
const STYLES: &str = "styles.css";
const ALTERNATE: &str = "alternate.jsx";

/// A [`Component`] rendered from templates.
pub struct TemplateComponent {
    env: Environment<'static>,
    defaults: Value,
    has_styles: bool,
    has_alternate: bool,
}

impl TemplateComponent {
    /// Compile a markup template with the given default props.
    pub fn new(markup: impl Into<String>, defaults: Value) -> Result<Self, ComponentError> {
        let mut env = template_env();
        add_template(&mut env, MARKUP, markup.into())?;
        Ok(Self {
            env,
            defaults,
            has_styles: false,
            has_alternate: false,
        })
    }

    /// Attach a CSS template rendered with the merged props.
    pub fn with_styles(mut self, styles: impl Into<String>) -> Result<Self, ComponentError> {
        add_template(&mut self.env, STYLES, styles.into())?;
        self.has_styles = true;
        Ok(self)
    }

    /// Attach an alternate JSX template. It sees the merged props as
    /// `props` and the rendered CSS as `styles`.
    pub fn with_alternate(mut self, alternate: impl Into<String>) -> Result<Self, ComponentError> {
        add_template(&mut self.env, ALTERNATE, alternate.into())?;
        self.has_alternate = true;
        Ok(self)
    }

    /// Load a markup component from an `.html` file.
    ///
    /// A sibling `.css` file with the same stem becomes the style template.
    pub fn from_file(path: &Path, defaults: Value) -> Result<Self, ComponentError> {
        let read = |path: &Path| {
            std::fs::read_to_string(path).map_err(|source| ComponentError::Io {
                path: path.to_path_buf(),
                source,
            })
        };

        let component = Self::new(read(path)?, defaults)?;
        let styles_path = path.with_extension("css");
        if styles_path.is_file() {
            tracing::debug!(path = %styles_path.display(), "Loading component styles");
            component.with_styles(read(&styles_path)?)
        } else {
            Ok(component)
        }
    }

    fn render_template(&self, name: &str, ctx: TemplateValue) -> Result<String, ComponentError> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .map_err(|source| ComponentError::Template {
                template: name.to_owned(),
                source,
            })
    }
}

impl Component for TemplateComponent {
    fn default_props(&self) -> &Value {
        &self.defaults
    }

    fn render(&self, props: &Props) -> Result<String, ComponentError> {
        self.render_template(MARKUP, TemplateValue::from_serialize(props))
    }

    fn styles(&self, props: &Props) -> Result<Option<String>, ComponentError> {
        if !self.has_styles {
            return Ok(None);
        }
        self.render_template(STYLES, TemplateValue::from_serialize(props))
            .map(Some)
    }

    fn alt_render(&self, props: &Props) -> Option<Result<String, ComponentError>> {
        if !self.has_alternate {
            return None;
        }
        let styles = match self.styles(props) {
            Ok(styles) => styles.unwrap_or_default(),
            Err(e) => return Some(Err(e)),
        };
        let ctx = minijinja::context! {
            props => TemplateValue::from_serialize(props),
            styles => styles,
        };
        Some(self.render_template(ALTERNATE, ctx))
    }
}

fn add_template(
    env: &mut Environment<'static>,
    name: &'static str,
    source: String,
) -> Result<(), ComponentError> {
    env.add_template_owned(name, source)
        .map_err(|source| ComponentError::Template {
            template: name.to_owned(),
            source,
        })
}

/// A minijinja environment with paul's output rules: `none` and undefined
/// values print nothing, and HTML escaping leaves `/` and `=` intact so
/// URLs survive verbatim in attributes.
#[must_use]
pub fn template_env() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_formatter(format_value);
    env
}

/// Escape text for HTML element content and quoted attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn format_value(
    out: &mut minijinja::Output<'_>,
    state: &State<'_, '_>,
    value: &TemplateValue,
) -> Result<(), minijinja::Error> {
    if value.is_none() || value.is_undefined() {
        return Ok(());
    }
    if matches!(state.auto_escape(), AutoEscape::Html) && !value.is_safe() {
        return write!(out, "{}", escape_html(&value.to_string()))
            .map_err(|_| minijinja::Error::new(ErrorKind::WriteFailure, "failed to write output"));
    }
    minijinja::escape_formatter(out, state, value)
}
