//! Callback interface for invalidated bundles.

use crate::types::BundleId;

/// Receives the bundles affected by filesystem changes.
///
/// Called from the watcher's processing thread, once per batch of events, with
/// every distinct bundle the batch touched. Implementations should record the
/// ids and return quickly; rebuilding is the caller's decision.
pub trait DirtyBundleHandler: Send + Sync {
    fn on_dirty_bundles(&self, bundles: &[BundleId]);
}

impl<F> DirtyBundleHandler for F
where
    F: Fn(&[BundleId]) + Send + Sync,
{
    fn on_dirty_bundles(&self, bundles: &[BundleId]) {
        self(bundles)
    }
}
