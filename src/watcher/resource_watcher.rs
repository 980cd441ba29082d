//! Resource watcher that turns filesystem changes into dirty bundles.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender, TrySendError};
use notify::Event;
use parking_lot::Mutex;
use walkdir::WalkDir;

use super::error::WatchError;
use super::event::{WatchEvent, classify};
use super::gate::RebuildGate;
use super::handle::WatchHandle;
use super::handler::DirtyBundleHandler;
use super::path_registry::PathRegistry;
use super::processor::{Command, EventProcessor};
use super::quiescence::Quiescence;
use crate::config::WatcherConfig;
use crate::mapping::{BundlePathMapping, PathMapping};
use crate::resource::{GeneratorRegistry, PrefixGeneratorRegistry, ResourceReader};

/// Watches the directories behind resolved bundles.
///
/// Two threads do the work: the event thread turns raw `notify` events into
/// [`WatchEvent`]s on a bounded queue, and the processing thread matches them
/// against the registered mappings and reports dirty bundles to the
/// [`DirtyBundleHandler`]. Neither ever rebuilds anything.
pub struct ResourceWatcher {
    handle: Arc<WatchHandle>,
    commands: Sender<Command>,
    quiescence: Arc<Quiescence>,
    stop: Arc<AtomicBool>,
    threads: Mutex<Vec<JoinHandle<()>>>,
    reader: Arc<dyn ResourceReader>,
    generators: Arc<dyn GeneratorRegistry>,
    poll: Duration,
}

impl ResourceWatcher {
    /// Create a builder for configuring the watcher.
    pub fn builder() -> ResourceWatcherBuilder {
        ResourceWatcherBuilder::new()
    }

    /// Register (or re-register) the mappings of resolved bundles.
    ///
    /// A bundle registered before has its previous mappings replaced. The OS
    /// watches are in place when this returns.
    pub fn watch_bundles<'a, I>(&self, bundles: I) -> Result<(), WatchError>
    where
        I: IntoIterator<Item = &'a BundlePathMapping>,
    {
        if self.stop.load(Ordering::Acquire) {
            return Err(WatchError::ChannelClosed);
        }

        for bundle in bundles {
            let id = bundle.bundle().id;
            let entries = self.registration_entries(bundle);

            let mut dirs: Vec<PathBuf> = entries.iter().map(|(dir, _)| dir.clone()).collect();
            dirs.sort();
            dirs.dedup();

            // The processor learns about the mappings before any event from
            // the new directories can reach it.
            self.commands
                .send(Command::Register { bundle: id, entries })
                .map_err(|_| WatchError::ChannelClosed)?;

            for dir in &dirs {
                if let Err(e) = self.handle.watch_dir(dir) {
                    tracing::warn!("[watcher] {e}");
                }
            }

            crate::debug_event!(
                "watcher",
                "registered",
                "{} in {} directories",
                bundle.bundle().name,
                dirs.len()
            );
        }

        crate::log_event!(
            "watcher",
            "monitoring",
            "{} directories",
            self.handle.watched_count()
        );
        Ok(())
    }

    /// Resolve each mapping of `bundle` to the directories it must be
    /// registered under.
    fn registration_entries(&self, bundle: &BundlePathMapping) -> Vec<(PathBuf, PathMapping)> {
        let mut entries = Vec::new();

        for mapping in bundle.path_mappings() {
            let expanded = if self.generators.is_generated_path(mapping.path()) {
                match self.generators.watch_mappings(mapping) {
                    Some(mappings) => mappings,
                    None => continue,
                }
            } else {
                vec![mapping.clone()]
            };

            for mapping in expanded {
                let Some(file) = self.reader.file_path(mapping.path()) else {
                    crate::debug_event!("watcher", "nothing to watch", "{mapping}");
                    continue;
                };

                if mapping.is_asset() {
                    if let Some(parent) = file.parent() {
                        entries.push((parent.to_path_buf(), mapping));
                    }
                    continue;
                }

                if mapping.is_recursive() {
                    let subdirs = WalkDir::new(&file)
                        .min_depth(1)
                        .follow_links(true)
                        .into_iter()
                        .filter_map(Result::ok)
                        .filter(|entry| entry.file_type().is_dir());
                    for entry in subdirs {
                        entries.push((entry.into_path(), mapping.clone()));
                    }
                }
                entries.push((file, mapping));
            }
        }

        let owner = bundle.bundle().id;
        for linked in bundle.linked_file_path_mappings() {
            if let Some(parent) = linked.path.parent() {
                let mapping = PathMapping::new(
                    linked.owner.unwrap_or(owner),
                    linked.path.to_string_lossy().into_owned(),
                );
                entries.push((parent.to_path_buf(), mapping));
            }
        }

        entries
    }

    /// Nothing queued, nothing being processed, and nothing processed for
    /// the quiescence delay.
    pub fn has_no_pending_work(&self) -> bool {
        self.quiescence.is_quiet()
    }

    /// Block until [`has_no_pending_work`](Self::has_no_pending_work) holds or
    /// `timeout` expires. Returns whether the watcher went idle.
    pub fn wait_for_idle(&self, timeout: Option<Duration>) -> bool {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if self.has_no_pending_work() {
                return true;
            }
            if !self.is_running() || deadline.is_some_and(|d| Instant::now() >= d) {
                return false;
            }
            thread::sleep(self.poll);
        }
    }

    pub fn is_running(&self) -> bool {
        !self.stop.load(Ordering::Acquire)
    }

    /// Stop both threads and release the OS watch. Idempotent.
    pub fn stop(&self) {
        let first = !self.stop.swap(true, Ordering::AcqRel);
        if self.handle.close() {
            crate::log_event!("watcher", "stopped");
        }

        let current = thread::current().id();
        let threads = std::mem::take(&mut *self.threads.lock());
        for thread in threads {
            // Stopping from inside the dirty-bundle callback: the processing
            // thread exits on its own once the callback returns.
            if thread.thread().id() == current {
                continue;
            }
            if thread.join().is_err() {
                tracing::error!("[watcher] worker thread panicked");
            }
        }

        if first {
            crate::debug_event!("watcher", "threads joined");
        }
    }
}

impl Drop for ResourceWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Builder for constructing a [`ResourceWatcher`].
pub struct ResourceWatcherBuilder {
    reader: Option<Arc<dyn ResourceReader>>,
    generators: Option<Arc<dyn GeneratorRegistry>>,
    handler: Option<Arc<dyn DirtyBundleHandler>>,
    gate: Option<Arc<RebuildGate>>,
    quiescence_delay_ms: u64,
    queue_capacity: usize,
    poll_interval_ms: u64,
}

impl ResourceWatcherBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self::from_config(&WatcherConfig::default())
    }

    /// Create a builder with the timings from `[watcher]`.
    pub fn from_config(config: &WatcherConfig) -> Self {
        Self {
            reader: None,
            generators: None,
            handler: None,
            gate: None,
            quiescence_delay_ms: config.quiescence_delay_ms,
            queue_capacity: config.queue_capacity,
            poll_interval_ms: config.poll_interval_ms,
        }
    }

    /// Set the reader used to locate mapped files.
    pub fn reader(mut self, reader: Arc<dyn ResourceReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Set the generator registry.
    pub fn generators(mut self, generators: Arc<dyn GeneratorRegistry>) -> Self {
        self.generators = Some(generators);
        self
    }

    /// Set the receiver of dirty bundle batches.
    pub fn handler(mut self, handler: Arc<dyn DirtyBundleHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Share the rebuild gate of the orchestrator.
    pub fn gate(mut self, gate: Arc<RebuildGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn quiescence_delay_ms(mut self, ms: u64) -> Self {
        self.quiescence_delay_ms = ms;
        self
    }

    /// Capacity of both the raw event channel and the classified queue.
    /// Raw events arriving while the raw channel is full are dropped with a
    /// warning, so a long rebuild cannot grow memory without bound.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Create the OS watch and start both threads.
    pub fn start(self) -> Result<ResourceWatcher, WatchError> {
        let reader = self.reader.ok_or_else(|| WatchError::InitFailed {
            reason: "Resource reader is required".to_string(),
        })?;

        let handler = self.handler.ok_or_else(|| WatchError::InitFailed {
            reason: "Dirty bundle handler is required".to_string(),
        })?;

        let generators = self
            .generators
            .unwrap_or_else(|| Arc::new(PrefixGeneratorRegistry::default()));
        let gate = self.gate.unwrap_or_default();
        let poll = Duration::from_millis(self.poll_interval_ms.max(1));

        let capacity = self.queue_capacity.max(1);
        let (raw_tx, raw_rx) = crossbeam_channel::bounded(capacity);
        let overflow = AtomicU64::new(0);
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            forward_raw(&raw_tx, res, &overflow);
        })?;

        let handle = Arc::new(WatchHandle::new(watcher));
        let quiescence = Arc::new(Quiescence::new(self.quiescence_delay_ms));
        let stop = Arc::new(AtomicBool::new(false));
        let (event_tx, event_rx) = crossbeam_channel::bounded(capacity);
        let (command_tx, command_rx) = crossbeam_channel::unbounded();

        let event_thread = {
            let quiescence = quiescence.clone();
            let stop = stop.clone();
            thread::Builder::new()
                .name("bundlemap-events".to_string())
                .spawn(move || run_event_thread(raw_rx, event_tx, quiescence, stop, poll))
                .map_err(|e| WatchError::InitFailed {
                    reason: e.to_string(),
                })?
        };

        let processor = EventProcessor {
            registry: PathRegistry::new(),
            events: event_rx,
            commands: command_rx,
            gate,
            handler,
            quiescence: quiescence.clone(),
            handle: handle.clone(),
            stop: stop.clone(),
            poll,
        };
        let processing_thread = thread::Builder::new()
            .name("bundlemap-processor".to_string())
            .spawn(move || processor.run())
            .map_err(|e| WatchError::InitFailed {
                reason: e.to_string(),
            });

        let processing_thread = match processing_thread {
            Ok(thread) => thread,
            Err(e) => {
                stop.store(true, Ordering::Release);
                handle.close();
                let _ = event_thread.join();
                return Err(e);
            }
        };

        crate::log_event!("watcher", "started");

        Ok(ResourceWatcher {
            handle,
            commands: command_tx,
            quiescence,
            stop,
            threads: Mutex::new(vec![event_thread, processing_thread]),
            reader,
            generators,
            poll,
        })
    }
}

impl Default for ResourceWatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Hand a raw event to the event thread without blocking `notify`. Returns
/// false when the event was dropped because the channel is full.
fn forward_raw(
    raw: &Sender<notify::Result<Event>>,
    res: notify::Result<Event>,
    overflow: &AtomicU64,
) -> bool {
    match raw.try_send(res) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            let dropped = overflow.fetch_add(1, Ordering::Relaxed) + 1;
            if dropped == 1 || dropped % 1000 == 0 {
                tracing::warn!("[watcher] raw event queue full, {dropped} events dropped");
            }
            false
        }
        // Shutting down.
        Err(TrySendError::Disconnected(_)) => false,
    }
}

/// Event thread loop: classify raw events and queue them for processing.
fn run_event_thread(
    raw: Receiver<notify::Result<Event>>,
    events: Sender<WatchEvent>,
    quiescence: Arc<Quiescence>,
    stop: Arc<AtomicBool>,
    poll: Duration,
) {
    crate::debug_event!("watcher", "event thread started");

    while !stop.load(Ordering::Acquire) {
        let event = match raw.recv_timeout(poll) {
            Ok(Ok(event)) => event,
            Ok(Err(e)) => {
                tracing::error!("[watcher] file watch error: {e}");
                continue;
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        for watch_event in classify(&event) {
            if !enqueue(&events, watch_event, &quiescence, &stop, poll) {
                crate::debug_event!("watcher", "event thread stopped");
                return;
            }
        }
    }

    crate::debug_event!("watcher", "event thread stopped");
}

/// Queue one event, waiting for room. Returns false once the pipeline shuts
/// down.
fn enqueue(
    events: &Sender<WatchEvent>,
    event: WatchEvent,
    quiescence: &Quiescence,
    stop: &AtomicBool,
    poll: Duration,
) -> bool {
    quiescence.enqueued();
    let mut pending = event;
    loop {
        match events.send_timeout(pending, poll) {
            Ok(()) => return true,
            Err(SendTimeoutError::Timeout(event)) => {
                if stop.load(Ordering::Acquire) {
                    quiescence.dropped(1);
                    return false;
                }
                pending = event;
            }
            Err(SendTimeoutError::Disconnected(_)) => {
                quiescence.dropped(1);
                return false;
            }
        }
    }
}
