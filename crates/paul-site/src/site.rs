//! Page composition.
//!
//! A [`Site`] holds page configurations by route and renders them on
//! demand. Nothing rendered is kept: every call to [`Site::render_page`]
//! resolves and renders each section again, so changes to registered
//! components or style files show up on the next render.
//!
//! # Thread Safety
//!
//! Pages and global styles sit behind `RwLock`s; the registry and style
//! processor are shared through `Arc`. A `Site` can be shared across server
//! handlers as `Arc<Site>`.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use paul_components::{ComponentRegistry, render_component};
use paul_script::FileComponentLoader;
use paul_styles::{StyleProcessor, StyleSource};

use crate::definition::AppDefinition;
use crate::document::{DocumentExtras, render_document};
use crate::resolver::{ComponentResolver, DefaultResolver};
use crate::{PageConfig, SectionConfig, SiteError};

/// Normalize a route: leading `/` added, trailing `/` removed except for
/// the root.
///
/// # Errors
///
/// Returns [`SiteError::InvalidRoute`] for routes containing whitespace,
/// `..` segments, a query or a fragment.
pub fn normalize_route(route: &str) -> Result<String, SiteError> {
    let trimmed = route.trim();
    if trimmed.is_empty() {
        return Ok("/".to_owned());
    }
    let invalid = trimmed.contains(char::is_whitespace)
        || trimmed.contains(['?', '#', '\\'])
        || trimmed.split('/').any(|segment| segment == "..");
    if invalid {
        return Err(SiteError::InvalidRoute(route.to_owned()));
    }

    let mut normalized = String::with_capacity(trimmed.len() + 1);
    if !trimmed.starts_with('/') {
        normalized.push('/');
    }
    normalized.push_str(trimmed);
    while normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    if normalized.contains("//") {
        return Err(SiteError::InvalidRoute(route.to_owned()));
    }
    Ok(normalized)
}

/// Landing-page site: a route → page map rendered through a component
/// resolver and a style processor.
pub struct Site {
    registry: Arc<ComponentRegistry>,
    styles: Arc<StyleProcessor>,
    resolver: Box<dyn ComponentResolver>,
    pages: RwLock<BTreeMap<String, PageConfig>>,
    global_styles: RwLock<Vec<StyleSource>>,
}

impl Site {
    /// Site resolving component names through `registry`. File components
    /// are rejected until a loader is attached.
    #[must_use]
    pub fn new(registry: Arc<ComponentRegistry>, styles: Arc<StyleProcessor>) -> Self {
        Self {
            resolver: Box::new(DefaultResolver {
                registry: Arc::clone(&registry),
                loader: None,
            }),
            registry,
            styles,
            pages: RwLock::new(BTreeMap::new()),
            global_styles: RwLock::new(Vec::new()),
        }
    }

    /// Enable file components loaded by `loader`.
    #[must_use]
    pub fn with_file_loader(mut self, loader: Arc<FileComponentLoader>) -> Self {
        self.resolver = Box::new(DefaultResolver {
            registry: Arc::clone(&self.registry),
            loader: Some(loader),
        });
        self
    }

    /// Replace the component resolver.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Box<dyn ComponentResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn styles(&self) -> &Arc<StyleProcessor> {
        &self.styles
    }

    /// Store a page under `route`, replacing any previous page.
    ///
    /// Every section is rendered once so that unknown components and bad
    /// props are reported here rather than on first request.
    ///
    /// Returns the normalized route.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::InvalidRoute`] for malformed routes and
    /// [`SiteError::Resolve`]/[`SiteError::Render`] naming the failing
    /// component.
    pub fn create_page(&self, route: &str, config: PageConfig) -> Result<String, SiteError> {
        let route = normalize_route(route)?;
        for section in &config.sections {
            self.render_section(section)?;
        }

        let replaced = self
            .pages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(route.clone(), config)
            .is_some();
        tracing::debug!(route = %route, replaced, "Created page");
        Ok(route)
    }

    /// Render the page at `route` to a complete HTML document.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::PageNotFound`] for unknown routes, or the first
    /// section or style error.
    pub fn render_page(&self, route: &str) -> Result<String, SiteError> {
        self.render_page_with(route, &DocumentExtras::default())
    }

    /// Like [`Site::render_page`], with extra head/body fragments.
    ///
    /// # Errors
    ///
    /// Same as [`Site::render_page`].
    pub fn render_page_with(
        &self,
        route: &str,
        extras: &DocumentExtras,
    ) -> Result<String, SiteError> {
        let start = Instant::now();
        let route = normalize_route(route)?;
        let page = self
            .page(&route)
            .ok_or_else(|| SiteError::PageNotFound(route.clone()))?;

        let mut css = Vec::new();
        let globals = self
            .global_styles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        css.push(self.styles.process_all(&globals)?);
        css.push(self.styles.process_all(&page.styles)?);

        let mut body = String::new();
        for section in ordered_sections(&page.sections) {
            let (html, section_css) = self.render_section(section)?;
            body.push_str(&html);
            css.extend(section_css);
        }

        css.retain(|part| !part.trim().is_empty());
        let html = render_document(&page.meta, &css.join("\n"), &body, extras)?;
        tracing::debug!(
            route = %route,
            elapsed_ms = start.elapsed().as_millis(),
            "Rendered page"
        );
        Ok(html)
    }

    /// Render one section: wrapped markup plus its CSS (component styles
    /// first, then the section's own sources). Omitted sections render
    /// nothing.
    fn render_section(&self, section: &SectionConfig) -> Result<(String, Vec<String>), SiteError> {
        if section.props.is_omitted() {
            return Ok((String::new(), Vec::new()));
        }
        let name = section.component.to_string();
        let component =
            self.resolver
                .resolve(&section.component)
                .map_err(|source| SiteError::Resolve {
                    component: name.clone(),
                    source,
                })?;
        let rendered = render_component(component.as_ref(), section.props.overrides())
            .map_err(|source| SiteError::Render {
                component: name,
                source,
            })?;

        let mut css = Vec::new();
        css.extend(rendered.css);
        css.push(self.styles.process_all(&section.styles)?);
        Ok((section.layout.wrap(&rendered.html), css))
    }

    /// All routes, sorted.
    #[must_use]
    pub fn routes(&self) -> Vec<String> {
        self.pages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// The stored configuration of a page.
    #[must_use]
    pub fn page(&self, route: &str) -> Option<PageConfig> {
        let route = normalize_route(route).ok()?;
        self.pages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&route)
            .cloned()
    }

    /// Remove a page, returning its configuration.
    pub fn remove_page(&self, route: &str) -> Option<PageConfig> {
        let route = normalize_route(route).ok()?;
        self.pages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&route)
    }

    pub fn clear_pages(&self) {
        self.pages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Styles prepended to every page.
    pub fn set_global_styles(&self, styles: Vec<StyleSource>) {
        *self
            .global_styles
            .write()
            .unwrap_or_else(PoisonError::into_inner) = styles;
    }

    /// Register a project's components, set its global styles and create
    /// every page it defines. Returns the created routes.
    ///
    /// # Errors
    ///
    /// Stops at the first component or page that fails.
    pub fn install(&self, definition: &AppDefinition) -> Result<Vec<String>, SiteError> {
        for name in definition.component_build_order()? {
            let Some(component) = definition.components.get(name) else {
                continue;
            };
            let built = component.build(name, definition, &*self.resolver)?;
            self.registry.register(name, built)?;
        }
        self.set_global_styles(definition.styles.clone());

        let mut routes = Vec::with_capacity(definition.pages.len());
        for page in &definition.pages {
            routes.push(self.create_page(&page.route, page.config.clone())?);
        }
        tracing::info!(
            components = definition.components.len(),
            pages = routes.len(),
            "Installed project"
        );
        Ok(routes)
    }

    /// Forget pages, custom components, global styles and all caches.
    pub fn reset(&self) {
        self.clear_pages();
        self.set_global_styles(Vec::new());
        self.registry.clear();
        self.styles.invalidate();
        self.resolver.invalidate();
    }
}

/// Sections in render order: ascending `layout.order`, unordered last,
/// declaration order among equals.
fn ordered_sections(sections: &[SectionConfig]) -> Vec<&SectionConfig> {
    let mut ordered: Vec<&SectionConfig> = sections.iter().collect();
    ordered.sort_by_key(|s| (s.layout.order.is_none(), s.layout.order));
    ordered
}
