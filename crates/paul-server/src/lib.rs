//! Development preview server for paul.
//!
//! Serves every page of a [`Site`] at its route using axum:
//! - Pages re-rendered on each request, with `ETag` revalidation
//! - Files from the project's `public/` directory
//! - `GET /__paul/pages` listing routes and titles
//! - WebSocket live reload driven by a filesystem watcher
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use paul_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         port: 3000,
//!         live_reload_enabled: true,
//!         ..ServerConfig::default()
//!     };
//!     let site = build_site().unwrap();
//!     let reloader: Arc<dyn paul_server::SiteReloader> = Arc::new(build_site);
//!
//!     run_server(config, site, Some(reloader)).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum router (paul-server)
//!                        │
//!                        ├─► /__paul/pages ──► Site::routes
//!                        │
//!                        ├─► WebSocket (LiveReloadManager)
//!                        │       │
//!                        │       └─► notify ──► SiteReloader ──► swap Site
//!                        │
//!                        └─► fallback: Site::render_page_with, else public/
//! ```

mod app;
mod error;
mod handlers;
mod live_reload;
mod middleware;
mod state;
mod static_files;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use paul_site::Site;
use state::{AppState, SharedSite};
use tokio::sync::broadcast;

pub use error::ServerError;

/// Error returned by a [`SiteReloader`].
pub type ReloadError = Box<dyn std::error::Error + Send + Sync>;

/// Builds a fresh [`Site`] after project files change.
///
/// The server keeps serving the previous site when a reload fails.
pub trait SiteReloader: Send + Sync {
    /// Rebuild the site from the project on disk.
    ///
    /// # Errors
    ///
    /// Returns whatever prevented the project from loading.
    fn reload(&self) -> Result<Site, ReloadError>;
}

impl<F> SiteReloader for F
where
    F: Fn() -> Result<Site, ReloadError> + Send + Sync,
{
    fn reload(&self) -> Result<Site, ReloadError> {
        self()
    }
}

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Project root watched for changes.
    pub project_root: PathBuf,
    /// Directory served for paths that are not pages.
    pub public_dir: PathBuf,
    /// Enable live reload.
    pub live_reload_enabled: bool,
    /// Glob patterns, relative to the project root, that trigger a reload.
    pub watch_patterns: Vec<String>,
    /// Application version (part of every `ETag`).
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 3000,
            project_root: PathBuf::from("."),
            public_dir: PathBuf::from("public"),
            live_reload_enabled: false,
            watch_patterns: Vec::new(),
            version: String::new(),
        }
    }
}

/// Run the server until Ctrl-C.
///
/// # Arguments
///
/// * `config` - Server configuration
/// * `site` - Site served initially
/// * `reloader` - Rebuilds the site on changes (live reload only)
///
/// # Errors
///
/// Returns an error if the address is invalid, the watcher cannot start or
/// the listener fails.
pub async fn run_server(
    config: ServerConfig,
    site: Site,
    reloader: Option<Arc<dyn SiteReloader>>,
) -> Result<(), ServerError> {
    let site = Arc::new(SharedSite::new(site));

    let live_reload = if config.live_reload_enabled {
        let (tx, _rx) = broadcast::channel::<live_reload::ReloadEvent>(100);
        let mut manager = live_reload::LiveReloadManager::new(
            config.project_root.clone(),
            config.public_dir.clone(),
            config.watch_patterns.clone(),
            Arc::clone(&site),
            reloader,
            tx,
        );
        manager.start()?;
        Some(manager)
    } else {
        None
    };

    let state = Arc::new(AppState {
        site,
        live_reload,
        public_dir: config.public_dir.clone(),
        version: config.version.clone(),
    });

    let app = app::create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))
        .map_err(|_| ServerError::InvalidAddress(format!("{}:{}", config.host, config.port)))?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %error, "Failed to listen for Ctrl-C");
        return;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from a paul project configuration.
///
/// # Arguments
///
/// * `config` - paul configuration
/// * `version` - Application version
#[must_use]
pub fn server_config_from_paul_config(config: &paul_config::Config, version: String) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        project_root: config.project_resolved.root.clone(),
        public_dir: config.project_resolved.public_dir.clone(),
        live_reload_enabled: config.live_reload.enabled,
        watch_patterns: config.live_reload.patterns(),
        version,
    }
}
