//! Live reload manager.
//!
//! Watches the project root, rebuilds the site when project sources change
//! and tells connected browsers to reload.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};

use super::debouncer::{EventDebouncer, FsEvent, FsEventKind};
use crate::SiteReloader;
use crate::state::SharedSite;

/// Event sent to connected WebSocket clients when files change.
#[derive(Clone, Debug, Serialize)]
pub(crate) struct ReloadEvent {
    /// Event type (always "reload").
    #[serde(rename = "type")]
    event_type: &'static str,
    /// Changed file, relative to the project root.
    path: String,
}

impl ReloadEvent {
    pub(super) fn new(path: String) -> Self {
        Self {
            event_type: "reload",
            path,
        }
    }
}

/// Default debounce duration in milliseconds.
const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Manages file watching, site reloads and broadcasting reload events.
pub(crate) struct LiveReloadManager {
    root: PathBuf,
    public_dir: PathBuf,
    watch_patterns: Vec<glob::Pattern>,
    site: Arc<SharedSite>,
    reloader: Option<Arc<dyn SiteReloader>>,
    broadcaster: broadcast::Sender<ReloadEvent>,
    watcher: Option<RecommendedWatcher>,
    debounce_ms: u64,
}

impl LiveReloadManager {
    /// Create a new live reload manager.
    ///
    /// # Arguments
    ///
    /// * `root` - Project root to watch
    /// * `public_dir` - Changes here reload browsers without rebuilding the site
    /// * `watch_patterns` - Glob patterns relative to `root`; invalid ones are skipped
    /// * `site` - Site swapped on successful reloads
    /// * `reloader` - Rebuilds the site (`None` only notifies browsers)
    /// * `broadcaster` - Broadcast channel sender for reload events
    #[must_use]
    pub(crate) fn new(
        root: PathBuf,
        public_dir: PathBuf,
        watch_patterns: Vec<String>,
        site: Arc<SharedSite>,
        reloader: Option<Arc<dyn SiteReloader>>,
        broadcaster: broadcast::Sender<ReloadEvent>,
    ) -> Self {
        let watch_patterns = watch_patterns
            .iter()
            .filter_map(|p| match glob::Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(error) => {
                    tracing::warn!(pattern = %p, error = %error, "Ignoring invalid watch pattern");
                    None
                }
            })
            .collect();
        Self {
            root,
            public_dir,
            watch_patterns,
            site,
            reloader,
            broadcaster,
            watcher: None,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }

    /// Start the file watcher.
    ///
    /// Spawns one task feeding raw events into the debouncer and one
    /// processing debounced batches.
    ///
    /// # Errors
    ///
    /// Returns an error if the file watcher cannot be created.
    pub(crate) fn start(&mut self) -> Result<(), notify::Error> {
        let (tx, mut rx) = mpsc::channel::<Event>(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                // Callback runs on notify's thread
                let _ = tx.blocking_send(event);
            }
        })?;

        watcher.watch(&self.root, RecursiveMode::Recursive)?;
        self.watcher = Some(watcher);
        tracing::info!(root = %self.root.display(), "Watching for changes");

        let debouncer = Arc::new(EventDebouncer::new(Duration::from_millis(self.debounce_ms)));

        let record_debouncer = Arc::clone(&debouncer);
        let root = self.root.clone();
        let patterns = self.watch_patterns.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                Self::record_event(&event, &root, &patterns, &record_debouncer);
            }
        });

        let context = ReloadContext {
            root: self.root.clone(),
            public_dir: self.public_dir.clone(),
            site: Arc::clone(&self.site),
            reloader: self.reloader.clone(),
            broadcaster: self.broadcaster.clone(),
        };
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(50));
            loop {
                interval.tick().await;
                let events = debouncer.drain_ready();
                if events.is_empty() {
                    continue;
                }
                let context = context.clone();
                // Reloading renders components and reads files
                if let Err(error) =
                    tokio::task::spawn_blocking(move || context.handle_batch(&events)).await
                {
                    tracing::error!(error = %error, "Live reload task failed");
                }
            }
        });

        Ok(())
    }

    /// Record a raw filesystem event into the debouncer.
    fn record_event(
        event: &Event,
        root: &Path,
        patterns: &[glob::Pattern],
        debouncer: &EventDebouncer,
    ) {
        let kind = match event.kind {
            EventKind::Create(_) => FsEventKind::Created,
            EventKind::Modify(_) => FsEventKind::Modified,
            EventKind::Remove(_) => FsEventKind::Removed,
            _ => return,
        };

        for path in &event.paths {
            if !Self::matches_patterns(path, root, patterns) {
                continue;
            }
            debouncer.record(path.clone(), kind);
            tracing::debug!(path = %path.display(), ?kind, "Recorded filesystem event");
        }
    }

    /// Check if a path under `root` matches any watch pattern. Hidden files
    /// and directories never match.
    fn matches_patterns(path: &Path, root: &Path, patterns: &[glob::Pattern]) -> bool {
        let Ok(relative) = path.strip_prefix(root) else {
            return false;
        };
        let hidden = relative.components().any(|c| match c {
            Component::Normal(name) => name.to_string_lossy().starts_with('.'),
            _ => false,
        });
        if hidden {
            return false;
        }

        let relative = relative.to_string_lossy().replace('\\', "/");
        patterns.iter().any(|pattern| pattern.matches(&relative))
    }

    /// Get a receiver for reload events.
    #[must_use]
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.broadcaster.subscribe()
    }
}

/// What the processing task needs to act on a batch of events.
#[derive(Clone)]
struct ReloadContext {
    root: PathBuf,
    public_dir: PathBuf,
    site: Arc<SharedSite>,
    reloader: Option<Arc<dyn SiteReloader>>,
    broadcaster: broadcast::Sender<ReloadEvent>,
}

impl ReloadContext {
    /// Rebuild the site once if any project source changed, then notify
    /// browsers. A failed rebuild keeps the previous site and notifies no
    /// one.
    fn handle_batch(&self, events: &[FsEvent]) {
        let start = Instant::now();
        let needs_rebuild = events.iter().any(|e| !e.path.starts_with(&self.public_dir));

        if needs_rebuild && let Some(reloader) = &self.reloader {
            match reloader.reload() {
                Ok(site) => {
                    self.site.replace(site);
                    tracing::info!(
                        changes = events.len(),
                        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                        "Site reloaded"
                    );
                }
                Err(error) => {
                    tracing::error!(error = %error, "Reload failed, keeping previous pages");
                    return;
                }
            }
        }

        for event in events {
            let path = self.relative_path(&event.path);
            tracing::info!(path = %path, kind = ?event.kind, "Live reload event processed");
            let _ = self.broadcaster.send(ReloadEvent::new(path));
        }
    }

    fn relative_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use paul_components::ComponentRegistry;
    use paul_site::{PageConfig, Site};
    use paul_styles::{StyleOptions, StyleProcessor};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ReloadError;

    fn patterns(raw: &[&str]) -> Vec<glob::Pattern> {
        raw.iter().map(|p| glob::Pattern::new(p).unwrap()).collect()
    }

    fn site_with(route: &str) -> Site {
        let site = Site::new(
            Arc::new(ComponentRegistry::with_builtins().unwrap()),
            Arc::new(StyleProcessor::new(StyleOptions::default())),
        );
        site.create_page(route, PageConfig::new("Test")).unwrap();
        site
    }

    fn context(reloader: Option<Arc<dyn SiteReloader>>) -> (ReloadContext, broadcast::Receiver<ReloadEvent>) {
        let (tx, rx) = broadcast::channel(16);
        let context = ReloadContext {
            root: PathBuf::from("/site"),
            public_dir: PathBuf::from("/site/public"),
            site: Arc::new(SharedSite::new(site_with("/"))),
            reloader,
            broadcaster: tx,
        };
        (context, rx)
    }

    fn modified(path: &str) -> FsEvent {
        FsEvent {
            path: PathBuf::from(path),
            kind: FsEventKind::Modified,
        }
    }

    #[test]
    fn test_reload_event_serialization() {
        let json = serde_json::to_value(ReloadEvent::new("pages/index.toml".to_owned())).unwrap();

        assert_eq!(json["type"], "reload");
        assert_eq!(json["path"], "pages/index.toml");
    }

    #[test]
    fn test_matches_patterns() {
        let root = PathBuf::from("/site");
        let patterns = patterns(&["pages/**", "public/**"]);

        assert!(LiveReloadManager::matches_patterns(
            Path::new("/site/pages/index.toml"),
            &root,
            &patterns
        ));
        assert!(LiveReloadManager::matches_patterns(
            Path::new("/site/public/img/logo.png"),
            &root,
            &patterns
        ));
        assert!(!LiveReloadManager::matches_patterns(
            Path::new("/site/dist/index.html"),
            &root,
            &patterns
        ));
        assert!(!LiveReloadManager::matches_patterns(
            Path::new("/other/pages/index.toml"),
            &root,
            &patterns
        ));
    }

    #[test]
    fn test_hidden_files_never_match() {
        let root = PathBuf::from("/site");
        let patterns = patterns(&["**"]);

        assert!(!LiveReloadManager::matches_patterns(
            Path::new("/site/pages/.index.toml.swp"),
            &root,
            &patterns
        ));
        assert!(!LiveReloadManager::matches_patterns(
            Path::new("/site/.paul/cache/styles.json"),
            &root,
            &patterns
        ));
    }

    #[test]
    fn test_source_change_swaps_site_and_notifies() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let reloader: Arc<dyn SiteReloader> = Arc::new(move || -> Result<Site, ReloadError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(site_with("/fresh"))
        });
        let (context, mut rx) = context(Some(reloader));

        context.handle_batch(&[modified("/site/pages/index.toml"), modified("/site/styles/main.css")]);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(context.site.get().routes(), vec!["/fresh".to_owned()]);
        assert_eq!(rx.try_recv().unwrap().path, "pages/index.toml");
        assert_eq!(rx.try_recv().unwrap().path, "styles/main.css");
    }

    #[test]
    fn test_public_change_skips_rebuild() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let reloader: Arc<dyn SiteReloader> = Arc::new(move || -> Result<Site, ReloadError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(site_with("/fresh"))
        });
        let (context, mut rx) = context(Some(reloader));

        context.handle_batch(&[modified("/site/public/logo.svg")]);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(context.site.get().routes(), vec!["/".to_owned()]);
        assert_eq!(rx.try_recv().unwrap().path, "public/logo.svg");
    }

    #[test]
    fn test_failed_reload_keeps_previous_site() {
        let reloader: Arc<dyn SiteReloader> =
            Arc::new(|| -> Result<Site, ReloadError> { Err("bad index.toml".into()) });
        let (context, mut rx) = context(Some(reloader));

        context.handle_batch(&[modified("/site/pages/index.toml")]);

        assert_eq!(context.site.get().routes(), vec!["/".to_owned()]);
        assert!(rx.try_recv().is_err());
    }
}
