//! Coordination between bundle rebuilds and event processing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Raised while bundles are being rebuilt.
///
/// The event processor waits for the gate to clear before matching an event,
/// so a rebuild never observes half-reported changes. The gate is owned by
/// whoever rebuilds and handed to the watcher at construction.
#[derive(Debug, Default)]
pub struct RebuildGate {
    rebuilding: Mutex<bool>,
    cleared: Condvar,
}

/// Holds the gate raised; lowering it on drop wakes every waiter.
#[must_use = "the gate is lowered as soon as the guard is dropped"]
pub struct RebuildGuard<'a> {
    gate: &'a RebuildGate,
}

impl RebuildGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the gate, waiting for a rebuild already in progress to finish.
    pub fn enter(&self) -> RebuildGuard<'_> {
        let mut rebuilding = self.rebuilding.lock();
        while *rebuilding {
            self.cleared.wait(&mut rebuilding);
        }
        *rebuilding = true;
        RebuildGuard { gate: self }
    }

    pub fn is_rebuilding(&self) -> bool {
        *self.rebuilding.lock()
    }

    /// Block until no rebuild is in progress.
    ///
    /// Returns `false` if `stop` was raised while waiting.
    pub fn wait_until_clear(&self, stop: &AtomicBool, poll: Duration) -> bool {
        let mut rebuilding = self.rebuilding.lock();
        while *rebuilding {
            if stop.load(Ordering::Acquire) {
                return false;
            }
            self.cleared.wait_for(&mut rebuilding, poll);
        }
        !stop.load(Ordering::Acquire)
    }

    fn leave(&self) {
        *self.rebuilding.lock() = false;
        self.cleared.notify_all();
    }
}

impl Drop for RebuildGuard<'_> {
    fn drop(&mut self) {
        self.gate.leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_guard_lowers_gate() {
        let gate = RebuildGate::new();
        assert!(!gate.is_rebuilding());
        {
            let _guard = gate.enter();
            assert!(gate.is_rebuilding());
        }
        assert!(!gate.is_rebuilding());
    }

    #[test]
    fn test_waiter_is_released_on_drop() {
        let gate = Arc::new(RebuildGate::new());
        let stop = Arc::new(AtomicBool::new(false));
        let guard = gate.enter();

        let waiter = {
            let gate = gate.clone();
            let stop = stop.clone();
            thread::spawn(move || {
                let start = Instant::now();
                let cleared = gate.wait_until_clear(&stop, Duration::from_millis(10));
                (cleared, start.elapsed())
            })
        };

        thread::sleep(Duration::from_millis(100));
        drop(guard);

        let (cleared, waited) = waiter.join().unwrap();
        assert!(cleared);
        assert!(waited >= Duration::from_millis(90));
    }

    #[test]
    fn test_stop_interrupts_wait() {
        let gate = Arc::new(RebuildGate::new());
        let stop = Arc::new(AtomicBool::new(false));
        let _guard = gate.enter();

        let waiter = {
            let gate = gate.clone();
            let stop = stop.clone();
            thread::spawn(move || gate.wait_until_clear(&stop, Duration::from_millis(10)))
        };

        thread::sleep(Duration::from_millis(50));
        stop.store(true, Ordering::Release);
        assert!(!waiter.join().unwrap());
    }
}
