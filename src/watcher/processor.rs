//! The processing thread: matches queued events against the registry.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use walkdir::WalkDir;

use super::event::{WatchEvent, WatchEventKind};
use super::gate::RebuildGate;
use super::handle::WatchHandle;
use super::handler::DirtyBundleHandler;
use super::path_registry::PathRegistry;
use super::quiescence::Quiescence;
use crate::mapping::PathMapping;
use crate::types::BundleId;

/// Registry updates sent from [`ResourceWatcher::watch_bundles`](super::ResourceWatcher::watch_bundles).
#[derive(Debug)]
pub(crate) enum Command {
    Register {
        bundle: BundleId,
        entries: Vec<(PathBuf, PathMapping)>,
    },
}

pub(crate) struct EventProcessor {
    pub(crate) registry: PathRegistry,
    pub(crate) events: Receiver<WatchEvent>,
    pub(crate) commands: Receiver<Command>,
    pub(crate) gate: Arc<RebuildGate>,
    pub(crate) handler: Arc<dyn DirtyBundleHandler>,
    pub(crate) quiescence: Arc<Quiescence>,
    pub(crate) handle: Arc<WatchHandle>,
    pub(crate) stop: Arc<AtomicBool>,
    pub(crate) poll: Duration,
}

impl EventProcessor {
    pub(crate) fn run(mut self) {
        crate::debug_event!("processor", "started");

        while !self.stop.load(Ordering::Acquire) {
            self.apply_commands();

            let event = match self.events.recv_timeout(self.poll) {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };

            if !self.gate.wait_until_clear(&self.stop, self.poll) {
                self.quiescence.dropped(1);
                break;
            }

            // Registrations made by the rebuild we waited for apply first.
            self.apply_commands();

            let mut batch = vec![event];
            batch.extend(self.events.try_iter());
            let count = batch.len();

            let dirty = self.process_batch(batch);
            if !dirty.is_empty() {
                let dirty: Vec<BundleId> = dirty.into_iter().collect();
                crate::debug_event!(
                    "processor",
                    "dirty",
                    "{} bundles from {count} events",
                    dirty.len()
                );
                self.handler.on_dirty_bundles(&dirty);
            }

            self.quiescence.processed(count);
        }

        let leftover = self.events.try_iter().count();
        if leftover > 0 {
            self.quiescence.dropped(leftover);
        }
        crate::debug_event!("processor", "stopped");
    }

    fn apply_commands(&mut self) {
        for command in self.commands.try_iter() {
            match command {
                Command::Register { bundle, entries } => {
                    let new_dirs = self.registry.register_bundle(bundle, entries);
                    crate::debug_event!(
                        "processor",
                        "registered",
                        "bundle {bundle}, {} new directories",
                        new_dirs.len()
                    );
                }
            }
        }
    }

    fn process_batch(&mut self, batch: Vec<WatchEvent>) -> BTreeSet<BundleId> {
        let mut dirty = BTreeSet::new();

        for event in batch {
            crate::debug_event!("processor", "event", "{:?} {}", event.kind, event.path.display());
            dirty.extend(self.registry.matching_bundles(&event));

            match (event.kind, event.is_dir) {
                (WatchEventKind::Created, true) => self.register_new_dir(&event),
                (WatchEventKind::Removed, _) if self.registry.contains_dir(&event.path) => {
                    self.registry.remove_dir(&event.path);
                    self.handle.forget_dir(&event.path);
                }
                _ => {}
            }
        }

        dirty
    }

    /// Extend recursive mappings of the parent directory over a new directory
    /// and everything already created inside it.
    fn register_new_dir(&mut self, event: &WatchEvent) {
        let recursive = self.registry.recursive_mappings(&event.dir);
        if recursive.is_empty() {
            return;
        }

        let subdirs: Vec<PathBuf> = WalkDir::new(&event.path)
            .follow_links(true)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_dir())
            .map(|entry| entry.into_path())
            .collect();

        for dir in subdirs {
            for (registrant, mapping) in &recursive {
                self.registry.add(dir.clone(), *registrant, mapping.clone());
            }
            if let Err(e) = self.handle.watch_dir(&dir) {
                tracing::warn!("[processor] failed to watch new directory: {e}");
            }
        }
    }
}
