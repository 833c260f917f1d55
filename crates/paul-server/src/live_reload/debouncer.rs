//! Per-path event coalescing.
//!
//! A single save can produce several raw events (temp file, rename,
//! metadata). Each path keeps one pending kind and a deadline that moves
//! with every new event; the path is released once it has been quiet for
//! the whole window.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FsEventKind {
    Created,
    Modified,
    Removed,
}

impl FsEventKind {
    /// The kind a path ends up with when `next` follows `self` inside one
    /// window. `None` when the two cancel out.
    fn then(self, next: Self) -> Option<Self> {
        use FsEventKind::{Created, Modified, Removed};

        match (self, next) {
            (Created, Removed) => None,
            (Created, _) | (Modified, Created) => Some(Created),
            // Write to a temp file, then rename over the original
            (Removed, Created) => Some(Modified),
            (_, Removed) | (Removed, Modified) => Some(Removed),
            (Modified, Modified) => Some(Modified),
        }
    }
}

/// A settled filesystem change.
#[derive(Clone, Debug)]
pub(crate) struct FsEvent {
    pub path: PathBuf,
    pub kind: FsEventKind,
}

pub(crate) struct EventDebouncer {
    window: Duration,
    pending: Mutex<BTreeMap<PathBuf, (FsEventKind, Instant)>>,
}

impl EventDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn record(&self, path: PathBuf, kind: FsEventKind) {
        let deadline = Instant::now() + self.window;
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);

        let merged = match pending.get(&path) {
            Some(&(previous, _)) => previous.then(kind),
            None => Some(kind),
        };
        match merged {
            Some(kind) => {
                pending.insert(path, (kind, deadline));
            }
            None => {
                pending.remove(&path);
            }
        }
    }

    /// Remove and return the paths whose deadline has passed, sorted by path.
    pub fn drain_ready(&self) -> Vec<FsEvent> {
        let now = Instant::now();
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);

        let ready: Vec<PathBuf> = pending
            .iter()
            .filter(|(_, (_, deadline))| *deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();
        ready
            .into_iter()
            .filter_map(|path| {
                pending
                    .remove(&path)
                    .map(|(kind, _)| FsEvent { path, kind })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use pretty_assertions::assert_eq;

    use super::*;
    use FsEventKind::{Created, Modified, Removed};

    const WINDOW: Duration = Duration::from_millis(10);

    fn settled(debouncer: &EventDebouncer) -> Vec<(PathBuf, FsEventKind)> {
        thread::sleep(WINDOW + Duration::from_millis(5));
        debouncer
            .drain_ready()
            .into_iter()
            .map(|e| (e.path, e.kind))
            .collect()
    }

    #[test]
    fn test_held_until_quiet() {
        let debouncer = EventDebouncer::new(WINDOW);
        debouncer.record(PathBuf::from("/site/pages/index.toml"), Modified);

        assert!(debouncer.drain_ready().is_empty());
        assert_eq!(
            settled(&debouncer),
            vec![(PathBuf::from("/site/pages/index.toml"), Modified)]
        );
        assert!(debouncer.drain_ready().is_empty());
    }

    #[test]
    fn test_burst_is_one_event() {
        let debouncer = EventDebouncer::new(WINDOW);
        for _ in 0..3 {
            debouncer.record(PathBuf::from("/site/styles/main.css"), Modified);
        }

        assert_eq!(settled(&debouncer).len(), 1);
    }

    #[test]
    fn test_swap_file_vanishes() {
        let debouncer = EventDebouncer::new(WINDOW);
        let swap = PathBuf::from("/site/components/.Card.jsx.swp");
        debouncer.record(swap.clone(), Created);
        debouncer.record(swap, Removed);

        assert!(settled(&debouncer).is_empty());
    }

    #[test]
    fn test_paths_come_out_sorted() {
        let debouncer = EventDebouncer::new(WINDOW);
        debouncer.record(PathBuf::from("/site/b.css"), Modified);
        debouncer.record(PathBuf::from("/site/a.css"), Created);

        assert_eq!(
            settled(&debouncer),
            vec![
                (PathBuf::from("/site/a.css"), Created),
                (PathBuf::from("/site/b.css"), Modified),
            ]
        );
    }

    #[test]
    fn test_then_table() {
        let cases = [
            (Created, Created, Some(Created)),
            (Created, Modified, Some(Created)),
            (Created, Removed, None),
            (Modified, Created, Some(Created)),
            (Modified, Modified, Some(Modified)),
            (Modified, Removed, Some(Removed)),
            (Removed, Created, Some(Modified)),
            (Removed, Modified, Some(Removed)),
            (Removed, Removed, Some(Removed)),
        ];
        for (first, next, expected) in cases {
            assert_eq!(first.then(next), expected, "{first:?} then {next:?}");
        }
    }
}
