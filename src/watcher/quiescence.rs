//! Idleness tracking for the event pipeline.
//!
//! Rebuilding while files are still being written produces bundles that are
//! immediately stale again. The orchestrator waits until the watcher has had
//! nothing to do for the configured delay.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Counts events between enqueue and the end of their processing and records
/// when the last one finished.
#[derive(Debug)]
pub struct Quiescence {
    /// Events queued or being processed.
    in_flight: AtomicUsize,
    /// When the processor last finished a batch.
    last_processed: Mutex<Option<Instant>>,
    /// How long the pipeline must stay empty.
    delay: Duration,
}

impl Quiescence {
    /// Create a tracker with the given delay in milliseconds.
    pub fn new(delay_ms: u64) -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            last_processed: Mutex::new(None),
            delay: Duration::from_millis(delay_ms),
        }
    }

    /// An event entered the queue.
    pub fn enqueued(&self) {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
    }

    /// `count` events left the pipeline without being processed.
    pub fn dropped(&self, count: usize) {
        self.in_flight.fetch_sub(count, Ordering::AcqRel);
    }

    /// `count` events were fully processed.
    pub fn processed(&self, count: usize) {
        // Timestamp first: a reader seeing zero in flight also sees the time.
        *self.last_processed.lock() = Some(Instant::now());
        self.in_flight.fetch_sub(count, Ordering::AcqRel);
    }

    pub fn pending(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Nothing queued, nothing in progress, and the last batch finished more
    /// than the delay ago.
    pub fn is_quiet(&self) -> bool {
        if self.pending() > 0 {
            return false;
        }
        match *self.last_processed.lock() {
            Some(last) => last.elapsed() > self.delay,
            None => true,
        }
    }
}
