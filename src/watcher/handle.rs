//! Shared ownership of the OS watch.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;

use super::WatchError;

/// The `notify` watcher plus the directories added to it.
///
/// Directories are watched non-recursively; recursive mappings register each
/// subdirectory on its own. Closing drops the `notify` watcher exactly once,
/// which also disconnects its event channel.
pub(crate) struct WatchHandle {
    watcher: Mutex<Option<RecommendedWatcher>>,
    watched: Mutex<HashSet<PathBuf>>,
}

impl WatchHandle {
    pub(crate) fn new(watcher: RecommendedWatcher) -> Self {
        Self {
            watcher: Mutex::new(Some(watcher)),
            watched: Mutex::new(HashSet::new()),
        }
    }

    /// Watch a directory for changes.
    pub(crate) fn watch_dir(&self, dir: &Path) -> Result<(), WatchError> {
        let mut watcher = self.watcher.lock();
        let watcher = watcher.as_mut().ok_or(WatchError::ChannelClosed)?;

        let mut watched = self.watched.lock();
        if watched.contains(dir) {
            return Ok(());
        }

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            })?;
        watched.insert(dir.to_path_buf());
        crate::debug_event!("watcher", "watching", "{}", dir.display());
        Ok(())
    }

    /// Forget a directory that disappeared. The OS drops its watch on its own.
    pub(crate) fn forget_dir(&self, dir: &Path) {
        self.watched.lock().retain(|watched| !watched.starts_with(dir));
    }

    pub(crate) fn watched_count(&self) -> usize {
        self.watched.lock().len()
    }

    /// Drop the OS watcher. Returns false if it was already closed.
    pub(crate) fn close(&self) -> bool {
        let closed = self.watcher.lock().take();
        self.watched.lock().clear();
        closed.is_some()
    }
}
