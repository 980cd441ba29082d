use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::ResourceReader;
use crate::mapping::normalize::normalize_path;

/// Serves web paths from a directory on disk.
///
/// Listings are sorted by name so resolution order does not depend on the
/// platform's directory iteration order.
#[derive(Debug, Clone)]
pub struct FsResourceReader {
    root: PathBuf,
}

impl FsResourceReader {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let relative = normalize_path(path);
        if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }
}

impl ResourceReader for FsResourceReader {
    fn resource_names(&self, path: &str) -> Vec<String> {
        let dir = self.resolve(path);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                crate::debug_event!("resources", "cannot list", "{}: {e}", dir.display());
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn is_directory(&self, path: &str) -> bool {
        self.resolve(path).is_dir()
    }

    /// Undecodable bytes are replaced, so one bad line does not hide the rest.
    fn read(&self, path: &str) -> io::Result<String> {
        let bytes = fs::read(self.resolve(path))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn file_path(&self, path: &str) -> Option<PathBuf> {
        self.resolve(path).canonicalize().ok()
    }

    fn last_modified(&self, file: &Path) -> SystemTime {
        fs::metadata(file)
            .and_then(|meta| meta.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH)
    }
}
