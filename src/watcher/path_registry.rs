//! Directory → mapping registry.
//!
//! Maps every watched directory to the path mappings that care about changes
//! in it. Only the processing thread owns a registry; registrations reach it
//! as messages.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use super::event::WatchEvent;
use crate::mapping::PathMapping;
use crate::types::BundleId;

/// A mapping registered under a directory, with the bundle whose
/// registration put it there.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Registration {
    registrant: BundleId,
    mapping: PathMapping,
}

/// Registry of watched directories and their mappings.
#[derive(Debug, Default)]
pub struct PathRegistry {
    dirs: HashMap<PathBuf, Vec<Registration>>,
}

impl PathRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything `bundle` registered with `entries`.
    ///
    /// Returns directories that weren't previously registered.
    pub fn register_bundle(
        &mut self,
        bundle: BundleId,
        entries: impl IntoIterator<Item = (PathBuf, PathMapping)>,
    ) -> Vec<PathBuf> {
        self.remove_bundle(bundle);

        let mut new_dirs = Vec::new();
        for (dir, mapping) in entries {
            if self.add(dir.clone(), bundle, mapping) {
                new_dirs.push(dir);
            }
        }
        new_dirs
    }

    /// Register one more directory on behalf of `registrant`.
    ///
    /// Returns true if the directory is new to the registry.
    pub fn add(&mut self, dir: PathBuf, registrant: BundleId, mapping: PathMapping) -> bool {
        let registration = Registration {
            registrant,
            mapping,
        };
        match self.dirs.get_mut(&dir) {
            Some(registrations) => {
                if !registrations.contains(&registration) {
                    registrations.push(registration);
                }
                false
            }
            None => {
                self.dirs.insert(dir, vec![registration]);
                true
            }
        }
    }

    /// Drop every mapping `bundle` registered.
    ///
    /// Note: directories left without mappings are forgotten, but their OS
    /// watches stay in place; events from them simply match nothing.
    pub fn remove_bundle(&mut self, bundle: BundleId) {
        self.dirs.retain(|_, registrations| {
            registrations.retain(|r| r.registrant != bundle);
            !registrations.is_empty()
        });
    }

    /// Forget a directory that no longer exists, and everything below it.
    pub fn remove_dir(&mut self, dir: &Path) {
        self.dirs.retain(|registered, _| !registered.starts_with(dir));
    }

    /// Owners of every mapping the event concerns.
    ///
    /// Asset mappings match on file name. Directory mappings match when their
    /// filter accepts the path; events on directories only match recursive
    /// mappings.
    pub fn matching_bundles(&self, event: &WatchEvent) -> BTreeSet<BundleId> {
        let Some(registrations) = self.dirs.get(&event.dir) else {
            return BTreeSet::new();
        };

        registrations
            .iter()
            .map(|r| &r.mapping)
            .filter(|mapping| {
                if mapping.is_asset() {
                    Path::new(mapping.path()).file_name() == event.file_name()
                } else if event.is_dir {
                    mapping.is_recursive() && mapping.accept(&event.path)
                } else {
                    mapping.accept(&event.path)
                }
            })
            .map(PathMapping::owner)
            .collect()
    }

    /// Recursive mappings registered under `dir`, with their registrants.
    pub fn recursive_mappings(&self, dir: &Path) -> Vec<(BundleId, PathMapping)> {
        self.dirs
            .get(dir)
            .map(|registrations| {
                registrations
                    .iter()
                    .filter(|r| r.mapping.is_recursive())
                    .map(|r| (r.registrant, r.mapping.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check if a directory is registered.
    pub fn contains_dir(&self, dir: &Path) -> bool {
        self.dirs.contains_key(dir)
    }

    /// Get all registered directories.
    pub fn watch_dirs(&self) -> impl Iterator<Item = &Path> {
        self.dirs.keys().map(PathBuf::as_path)
    }

    /// Get count of registered directories.
    pub fn dir_count(&self) -> usize {
        self.dirs.len()
    }

    /// Get count of registrations across all directories.
    pub fn mapping_count(&self) -> usize {
        self.dirs.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::FileFilter;
    use crate::watcher::WatchEventKind;

    fn id(value: u32) -> BundleId {
        BundleId::new(value).unwrap()
    }

    fn modified(path: &str) -> WatchEvent {
        WatchEvent::new(WatchEventKind::Modified, path, false)
    }

    #[test]
    fn test_register_returns_new_dirs() {
        let mut registry = PathRegistry::new();

        let new_dirs = registry.register_bundle(
            id(1),
            vec![
                (PathBuf::from("/srv/js"), PathMapping::new(id(1), "/js/app.js")),
                (PathBuf::from("/srv/js"), PathMapping::new(id(1), "/js/lib.js")),
                (PathBuf::from("/srv/css"), PathMapping::new(id(1), "/css/")),
            ],
        );

        assert_eq!(new_dirs, vec![PathBuf::from("/srv/js"), PathBuf::from("/srv/css")]);
        assert_eq!(registry.dir_count(), 2);
        assert_eq!(registry.mapping_count(), 3);
    }

    #[test]
    fn test_asset_matches_on_file_name() {
        let mut registry = PathRegistry::new();
        registry.register_bundle(
            id(1),
            vec![(PathBuf::from("/srv/js"), PathMapping::new(id(1), "/js/app.js"))],
        );

        assert_eq!(
            registry.matching_bundles(&modified("/srv/js/app.js")),
            BTreeSet::from([id(1)])
        );
        assert!(registry.matching_bundles(&modified("/srv/js/other.js")).is_empty());
        assert!(registry.matching_bundles(&modified("/srv/css/app.js")).is_empty());
    }

    #[test]
    fn test_directory_events_only_match_recursive_mappings() {
        let mut registry = PathRegistry::new();
        registry.register_bundle(
            id(1),
            vec![(PathBuf::from("/srv/js"), PathMapping::new(id(1), "/js/"))],
        );
        registry.register_bundle(
            id(2),
            vec![(PathBuf::from("/srv/js"), PathMapping::new(id(2), "/js/**"))],
        );

        let dir_event = WatchEvent::new(WatchEventKind::Created, "/srv/js/sub", true);
        assert_eq!(registry.matching_bundles(&dir_event), BTreeSet::from([id(2)]));
        assert_eq!(
            registry.matching_bundles(&modified("/srv/js/a.js")),
            BTreeSet::from([id(1), id(2)])
        );
        assert_eq!(registry.recursive_mappings(Path::new("/srv/js")).len(), 1);
    }

    #[test]
    fn test_filter_rejects_files() {
        let mut registry = PathRegistry::new();
        let mapping =
            PathMapping::new(id(1), "/js/").with_file_filter(Some(FileFilter::new("*.js").unwrap()));
        registry.register_bundle(id(1), vec![(PathBuf::from("/srv/js"), mapping)]);

        assert!(registry.matching_bundles(&modified("/srv/js/notes.txt")).is_empty());
        assert_eq!(registry.matching_bundles(&modified("/srv/js/a.js")).len(), 1);
    }

    #[test]
    fn test_reregistration_replaces_entries() {
        let mut registry = PathRegistry::new();
        registry.register_bundle(
            id(1),
            vec![(PathBuf::from("/srv/old"), PathMapping::new(id(1), "/old/"))],
        );
        registry.register_bundle(
            id(2),
            vec![(PathBuf::from("/srv/old"), PathMapping::new(id(2), "/old/"))],
        );

        registry.register_bundle(
            id(1),
            vec![(PathBuf::from("/srv/new"), PathMapping::new(id(1), "/new/"))],
        );

        assert!(registry.contains_dir(Path::new("/srv/new")));
        assert_eq!(
            registry.matching_bundles(&modified("/srv/old/a.js")),
            BTreeSet::from([id(2)])
        );

        registry.remove_bundle(id(2));
        assert!(!registry.contains_dir(Path::new("/srv/old")));
    }

    #[test]
    fn test_remove_dir_forgets_subtree() {
        let mut registry = PathRegistry::new();
        let mapping = PathMapping::new(id(1), "/js/**");
        registry.register_bundle(
            id(1),
            vec![
                (PathBuf::from("/srv/js"), mapping.clone()),
                (PathBuf::from("/srv/js/lib"), mapping.clone()),
                (PathBuf::from("/srv/js/lib/deep"), mapping),
            ],
        );

        registry.remove_dir(Path::new("/srv/js/lib"));
        assert_eq!(registry.watch_dirs().count(), 1);
    }
}
