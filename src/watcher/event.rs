//! Normalized filesystem events.

use std::path::PathBuf;

use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchEventKind {
    Created,
    Modified,
    Removed,
}

/// One change to one path, as queued for the processing thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    /// The changed path.
    pub path: PathBuf,
    /// The watched directory the change happened in.
    pub dir: PathBuf,
    pub is_dir: bool,
}

impl WatchEvent {
    pub fn new(kind: WatchEventKind, path: impl Into<PathBuf>, is_dir: bool) -> Self {
        let path = path.into();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self {
            kind,
            path,
            dir,
            is_dir,
        }
    }

    pub fn file_name(&self) -> Option<&std::ffi::OsStr> {
        self.path.file_name()
    }
}

/// Split a raw notify event into per-path events.
///
/// Renames become a removal of the old path and a creation of the new one.
/// Access and metadata-only events are dropped.
pub fn classify(event: &Event) -> Vec<WatchEvent> {
    match event.kind {
        EventKind::Create(kind) => event
            .paths
            .iter()
            .map(|path| {
                let is_dir = match kind {
                    CreateKind::Folder => true,
                    CreateKind::File => false,
                    _ => path.is_dir(),
                };
                WatchEvent::new(WatchEventKind::Created, path, is_dir)
            })
            .collect(),

        EventKind::Remove(kind) => event
            .paths
            .iter()
            .map(|path| WatchEvent::new(WatchEventKind::Removed, path, kind == RemoveKind::Folder))
            .collect(),

        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),

        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => removed(&event.paths),
            RenameMode::To => created(&event.paths),
            RenameMode::Both => {
                let mut events = removed(event.paths.first());
                events.extend(created(event.paths.get(1)));
                events
            }
            // Backends that cannot tell both sides apart
            _ => event
                .paths
                .iter()
                .map(|path| {
                    if path.exists() {
                        WatchEvent::new(WatchEventKind::Created, path, path.is_dir())
                    } else {
                        WatchEvent::new(WatchEventKind::Removed, path, false)
                    }
                })
                .collect(),
        },

        EventKind::Modify(_) => event
            .paths
            .iter()
            .map(|path| WatchEvent::new(WatchEventKind::Modified, path, path.is_dir()))
            .collect(),

        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

fn created<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) -> Vec<WatchEvent> {
    paths
        .into_iter()
        .map(|path| WatchEvent::new(WatchEventKind::Created, path, path.is_dir()))
        .collect()
}

fn removed<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) -> Vec<WatchEvent> {
    paths
        .into_iter()
        .map(|path| WatchEvent::new(WatchEventKind::Removed, path, false))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, DataChange, MetadataKind};

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        let mut event = Event::new(kind);
        for path in paths {
            event = event.add_path(PathBuf::from(path));
        }
        event
    }

    #[test]
    fn test_create_and_remove() {
        let created = classify(&event(EventKind::Create(CreateKind::Folder), &["/srv/js/lib"]));
        assert_eq!(
            created,
            vec![WatchEvent {
                kind: WatchEventKind::Created,
                path: PathBuf::from("/srv/js/lib"),
                dir: PathBuf::from("/srv/js"),
                is_dir: true,
            }]
        );

        let removed = classify(&event(EventKind::Remove(RemoveKind::File), &["/srv/js/a.js"]));
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].kind, WatchEventKind::Removed);
        assert!(!removed[0].is_dir);
    }

    #[test]
    fn test_rename_both_sides() {
        let events = classify(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/srv/js/old.js", "/srv/js/new.js"],
        ));

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, WatchEventKind::Removed);
        assert_eq!(events[0].path, PathBuf::from("/srv/js/old.js"));
        assert_eq!(events[1].kind, WatchEventKind::Created);
        assert_eq!(events[1].path, PathBuf::from("/srv/js/new.js"));
    }

    #[test]
    fn test_content_change_and_ignored_kinds() {
        let modified = classify(&event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/srv/js/a.js"],
        ));
        assert_eq!(modified[0].kind, WatchEventKind::Modified);

        assert!(
            classify(&event(
                EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
                &["/srv/js/a.js"],
            ))
            .is_empty()
        );
        assert!(classify(&event(EventKind::Access(AccessKind::Read), &["/srv/js/a.js"])).is_empty());
    }

    #[test]
    fn test_relative_path_dir() {
        let event = WatchEvent::new(WatchEventKind::Modified, "a.js", false);
        assert_eq!(event.dir, PathBuf::from("."));
    }
}
