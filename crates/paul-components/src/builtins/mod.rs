//! Built-in sections: `hero`, `cta` and `footer`.
//!
//! Each built-in is a [`TemplateComponent`] whose CSS is generated from its
//! `backgroundColor`/`textColor` props and which can emit an equivalent JSX
//! component through [`Component::alt_render`].

use std::sync::Arc;

use chrono::Datelike;
use serde_json::{Value, json};

use crate::{Component, ComponentError, TemplateComponent};

/// Names of the built-in components, in registration order.
pub const NAMES: [&str; 3] = ["hero", "cta", "footer"];

/// The hero banner: headline, subtitle and a call-to-action link.
pub fn hero() -> Result<TemplateComponent, ComponentError> {
    TemplateComponent::new(
        include_str!("hero.html"),
        json!({
            "title": "Welcome to paul",
            "subtitle": "Build fast landing pages with ease",
            "ctaText": "Get Started",
            "ctaUrl": "#",
            "backgroundColor": "#f8f9fa",
            "textColor": "#212529",
        }),
    )?
    .with_styles(include_str!("hero.css"))?
    .with_alternate(include_str!("hero.jsx"))
}

/// The call-to-action block with primary and secondary buttons.
pub fn cta() -> Result<TemplateComponent, ComponentError> {
    TemplateComponent::new(
        include_str!("cta.html"),
        json!({
            "title": "Ready to get started?",
            "description": "Join thousands of developers building amazing landing pages with paul",
            "primaryButtonText": "Get Started",
            "primaryButtonUrl": "#",
            "secondaryButtonText": "Learn More",
            "secondaryButtonUrl": "#docs",
            "backgroundColor": "#ffffff",
            "textColor": "#212529",
        }),
    )?
    .with_styles(include_str!("cta.css"))?
    .with_alternate(include_str!("cta.jsx"))
}

/// The page footer with a link row and a copyright line for the current year.
pub fn footer() -> Result<TemplateComponent, ComponentError> {
    TemplateComponent::new(
        include_str!("footer.html"),
        json!({
            "companyName": "paul",
            "year": chrono::Utc::now().year(),
            "links": [
                {"text": "Documentation", "url": "#docs"},
                {"text": "GitHub", "url": "#github"},
                {"text": "Examples", "url": "#examples"},
                {"text": "Contact", "url": "#contact"},
            ],
            "backgroundColor": "#f8f9fa",
            "textColor": "#6c757d",
        }),
    )?
    .with_styles(include_str!("footer.css"))?
    .with_alternate(include_str!("footer.jsx"))
}

/// Construct every built-in, keyed by name.
pub fn all() -> Result<Vec<(&'static str, Arc<dyn Component>)>, ComponentError> {
    let components: [Arc<dyn Component>; 3] =
        [Arc::new(hero()?), Arc::new(cta()?), Arc::new(footer()?)];
    Ok(NAMES.into_iter().zip(components).collect())
}

/// Default props of a built-in by name, for scaffolding.
pub fn default_props(name: &str) -> Option<Value> {
    let component = match name {
        "hero" => hero(),
        "cta" => cta(),
        "footer" => footer(),
        _ => return None,
    };
    component.ok().map(|c| c.default_props().clone())
}
