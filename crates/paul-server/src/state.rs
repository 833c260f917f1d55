//! Application state.
//!
//! Shared state for all request handlers.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use paul_site::Site;

use crate::live_reload::LiveReloadManager;

/// The site currently served. Live reload swaps it wholesale, so a request
/// always renders against one consistent site.
pub(crate) struct SharedSite {
    current: RwLock<Arc<Site>>,
}

impl SharedSite {
    pub(crate) fn new(site: Site) -> Self {
        Self {
            current: RwLock::new(Arc::new(site)),
        }
    }

    /// The site serving requests right now.
    pub(crate) fn get(&self) -> Arc<Site> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Serve `site` from now on.
    pub(crate) fn replace(&self, site: Site) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(site);
    }
}

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Site rendering the pages.
    pub(crate) site: Arc<SharedSite>,
    /// Live reload manager (if enabled).
    pub(crate) live_reload: Option<LiveReloadManager>,
    /// Directory served for non-page paths.
    pub(crate) public_dir: PathBuf,
    /// Application version for cache invalidation.
    pub(crate) version: String,
}

impl AppState {
    /// Check if live reload is enabled.
    #[must_use]
    pub(crate) fn live_reload_enabled(&self) -> bool {
        self.live_reload.is_some()
    }
}
