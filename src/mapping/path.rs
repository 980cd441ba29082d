use std::fmt;
use std::path::Path;

use crate::types::BundleId;

/// Suffix marking a recursive directory mapping.
const RECURSIVE_SUFFIX: &str = "/**";

/// Shape of a declared mapping, derived once from its raw pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// A single resource.
    Asset,
    /// A directory, without its subdirectories (`/js/lib/`).
    Directory,
    /// A directory and all of its subdirectories (`/js/lib/**`).
    RecursiveDirectory,
}

/// Glob restricting which changed files a directory mapping cares about.
///
/// Patterns without `/` are matched against the file name, others against the
/// full path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileFilter {
    pattern: glob::Pattern,
    match_full_path: bool,
}

impl FileFilter {
    pub fn new(pattern: &str) -> Result<Self, glob::PatternError> {
        Ok(Self {
            pattern: glob::Pattern::new(pattern)?,
            match_full_path: pattern.contains('/'),
        })
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn matches(&self, path: &Path) -> bool {
        if self.match_full_path {
            return self.pattern.matches_path(path);
        }
        path.file_name()
            .map(|name| self.pattern.matches(&name.to_string_lossy()))
            .unwrap_or(false)
    }
}

/// A declared mapping pattern of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathMapping {
    owner: BundleId,
    path: String,
    kind: PathKind,
    file_filter: Option<FileFilter>,
}

impl PathMapping {
    /// Classify a raw pattern.
    ///
    /// `/js/**` becomes a recursive mapping stored as `/js/`, `/js/` a
    /// directory mapping, anything else an asset.
    pub fn new(owner: BundleId, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let (path, kind) = if let Some(dir) = raw.strip_suffix(RECURSIVE_SUFFIX) {
            (format!("{dir}/"), PathKind::RecursiveDirectory)
        } else if raw.ends_with('/') {
            (raw, PathKind::Directory)
        } else {
            (raw, PathKind::Asset)
        };

        Self {
            owner,
            path,
            kind,
            file_filter: None,
        }
    }

    pub fn with_file_filter(mut self, filter: Option<FileFilter>) -> Self {
        self.file_filter = filter;
        self
    }

    pub fn owner(&self) -> BundleId {
        self.owner
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> PathKind {
        self.kind
    }

    pub fn file_filter(&self) -> Option<&FileFilter> {
        self.file_filter.as_ref()
    }

    pub fn is_asset(&self) -> bool {
        self.kind == PathKind::Asset
    }

    /// True for shallow directory mappings only.
    pub fn is_directory(&self) -> bool {
        self.kind == PathKind::Directory
    }

    pub fn is_recursive(&self) -> bool {
        self.kind == PathKind::RecursiveDirectory
    }

    /// Whether a changed file passes this mapping's filter. Mappings without a
    /// filter accept everything.
    pub fn accept(&self, path: &Path) -> bool {
        self.file_filter
            .as_ref()
            .map(|filter| filter.matches(path))
            .unwrap_or(true)
    }
}

impl fmt::Display for PathMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            PathKind::RecursiveDirectory => write!(f, "{}**", self.path),
            _ => f.write_str(&self.path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> BundleId {
        BundleId::new(1).unwrap()
    }

    #[test]
    fn test_classification() {
        let recursive = PathMapping::new(owner(), "/js/lib/**");
        assert!(recursive.is_recursive());
        assert_eq!(recursive.path(), "/js/lib/");
        assert_eq!(recursive.to_string(), "/js/lib/**");

        let dir = PathMapping::new(owner(), "/js/lib/");
        assert!(dir.is_directory());
        assert!(!dir.is_recursive());

        let asset = PathMapping::new(owner(), "/js/app.js");
        assert!(asset.is_asset());
        assert_eq!(asset.owner(), owner());
    }

    #[test]
    fn test_filter_on_file_name() {
        let filter = FileFilter::new("*.js").unwrap();
        let mapping = PathMapping::new(owner(), "/js/").with_file_filter(Some(filter));

        assert!(mapping.accept(Path::new("/srv/js/app.js")));
        assert!(!mapping.accept(Path::new("/srv/js/app.css")));
    }

    #[test]
    fn test_filter_on_full_path() {
        let filter = FileFilter::new("/srv/js/vendor/*").unwrap();
        assert!(filter.matches(Path::new("/srv/js/vendor/a.js")));
        assert!(!filter.matches(Path::new("/srv/js/a.js")));
    }

    #[test]
    fn test_no_filter_accepts_everything() {
        let mapping = PathMapping::new(owner(), "/js/**");
        assert!(mapping.accept(Path::new("/anything/at/all")));
    }
}
