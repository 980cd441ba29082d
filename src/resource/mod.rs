//! Access to bundle sources.
//!
//! The resolution engine never touches the filesystem directly: directory
//! listings, file contents and timestamps come from a [`ResourceReader`], and a
//! [`GeneratorRegistry`] tells which paths are produced by a generator
//! instead of read from disk.

mod fs;
mod generator;

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub use fs::FsResourceReader;
pub use generator::PrefixGeneratorRegistry;

use crate::mapping::PathMapping;
use crate::variant::VariantSet;

/// Read access to resources addressed by web path (`/js/lib/app.js`).
pub trait ResourceReader: Send + Sync {
    /// Entry names directly under `path`. Order is the listing order the
    /// builder follows.
    fn resource_names(&self, path: &str) -> Vec<String>;

    fn is_directory(&self, path: &str) -> bool;

    fn read(&self, path: &str) -> io::Result<String>;

    /// Absolute location of the file backing `path`, if any.
    fn file_path(&self, path: &str) -> Option<PathBuf>;

    /// Modification time of a file returned by [`file_path`](Self::file_path).
    /// [`SystemTime::UNIX_EPOCH`] when unknown.
    fn last_modified(&self, file: &Path) -> SystemTime;
}

/// Knows which resources are generated and what they need.
pub trait GeneratorRegistry: Send + Sync {
    fn is_generated_path(&self, path: &str) -> bool;

    /// Variant dimensions a generated resource can be produced in.
    fn available_variants(&self, _path: &str) -> HashMap<String, VariantSet> {
        HashMap::new()
    }

    /// Concrete mappings to watch in place of a generated mapping. `None`
    /// means the resource has nothing on disk to watch.
    fn watch_mappings(&self, _mapping: &PathMapping) -> Option<Vec<PathMapping>> {
        None
    }
}
