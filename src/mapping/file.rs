use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::types::BundleId;

/// A concrete file a bundle was built from, with the timestamp seen at
/// resolution time.
///
/// Equality includes the timestamp, so two resolutions of an unchanged tree
/// compare equal and a touched file does not.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilePathMapping {
    pub path: PathBuf,
    pub last_modified: SystemTime,
    pub owner: Option<BundleId>,
}

impl FilePathMapping {
    pub fn new(path: impl Into<PathBuf>, last_modified: SystemTime, owner: Option<BundleId>) -> Self {
        Self {
            path: path.into(),
            last_modified,
            owner,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `current` differs from the recorded timestamp.
    pub fn is_stale(&self, current: SystemTime) -> bool {
        self.last_modified != current
    }
}
