use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use super::{FilePathMapping, PathMapping};
use crate::bundle::{Bundle, DebugInclusion};
use crate::resource::ResourceReader;
use crate::variant::{VariantSet, all_variant_keys};

/// One resolved item of a bundle, as served.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BundlePath {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_prefix: Option<String>,
    pub path: String,
}

impl BundlePath {
    pub fn new(bundle_prefix: Option<String>, path: impl Into<String>) -> Self {
        Self {
            bundle_prefix,
            path: path.into(),
        }
    }
}

impl fmt::Display for BundlePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.bundle_prefix {
            Some(prefix) => write!(f, "{prefix}{}", self.path),
            None => f.write_str(&self.path),
        }
    }
}

/// Everything a bundle resolved to.
///
/// Item lists keep insertion order and never hold the same path twice; the
/// first occurrence wins.
#[derive(Debug, Clone)]
pub struct BundlePathMapping {
    bundle: Arc<Bundle>,
    path_mappings: Vec<PathMapping>,
    item_paths: IndexMap<String, BundlePath>,
    item_debug_paths: IndexMap<String, BundlePath>,
    file_path_mappings: IndexMap<PathBuf, FilePathMapping>,
    linked_file_path_mappings: IndexMap<PathBuf, FilePathMapping>,
    license_paths: IndexSet<String>,
    variants: HashMap<String, VariantSet>,
}

impl BundlePathMapping {
    pub fn new(bundle: Arc<Bundle>) -> Self {
        let variants = bundle.variants.clone();
        Self {
            bundle,
            path_mappings: Vec::new(),
            item_paths: IndexMap::new(),
            item_debug_paths: IndexMap::new(),
            file_path_mappings: IndexMap::new(),
            linked_file_path_mappings: IndexMap::new(),
            license_paths: IndexSet::new(),
            variants,
        }
    }

    pub fn bundle(&self) -> &Arc<Bundle> {
        &self.bundle
    }

    pub fn path_mappings(&self) -> &[PathMapping] {
        &self.path_mappings
    }

    /// Production items, in resolution order.
    pub fn item_paths(&self) -> impl ExactSizeIterator<Item = &BundlePath> {
        self.item_paths.values()
    }

    /// Debug-mode items, in resolution order.
    pub fn item_debug_paths(&self) -> impl ExactSizeIterator<Item = &BundlePath> {
        self.item_debug_paths.values()
    }

    pub fn file_path_mappings(&self) -> impl ExactSizeIterator<Item = &FilePathMapping> {
        self.file_path_mappings.values()
    }

    /// Files pulled in by content (imports, referenced images...) rather than
    /// by a mapping.
    pub fn linked_file_path_mappings(&self) -> impl ExactSizeIterator<Item = &FilePathMapping> {
        self.linked_file_path_mappings.values()
    }

    pub fn license_paths(&self) -> &IndexSet<String> {
        &self.license_paths
    }

    pub fn variants(&self) -> &HashMap<String, VariantSet> {
        &self.variants
    }

    /// Keys of every variant instance of this bundle.
    pub fn variant_keys(&self) -> Vec<String> {
        all_variant_keys(&self.variants)
    }

    /// Record a file discovered while processing the bundle's content.
    pub fn add_linked_file(&mut self, mapping: FilePathMapping) {
        self.linked_file_path_mappings
            .entry(mapping.path.clone())
            .or_insert(mapping);
    }

    /// Source and linked files whose timestamp changed since resolution.
    pub fn modified_files(&self, reader: &dyn ResourceReader) -> Vec<&FilePathMapping> {
        self.file_path_mappings
            .values()
            .chain(self.linked_file_path_mappings.values())
            .filter(|mapping| mapping.is_stale(reader.last_modified(&mapping.path)))
            .collect()
    }

    pub(crate) fn push_path_mapping(&mut self, mapping: PathMapping) {
        if !self.path_mappings.contains(&mapping) {
            self.path_mappings.push(mapping);
        }
    }

    /// Add an item to the lists selected by `inclusion`.
    pub(crate) fn add_item(&mut self, item: BundlePath, inclusion: DebugInclusion) {
        if inclusion != DebugInclusion::Only {
            self.item_paths
                .entry(item.path.clone())
                .or_insert_with(|| item.clone());
        }
        if inclusion != DebugInclusion::Never {
            self.item_debug_paths.entry(item.path.clone()).or_insert(item);
        }
    }

    pub(crate) fn add_production_item(&mut self, item: &BundlePath) {
        self.item_paths
            .entry(item.path.clone())
            .or_insert_with(|| item.clone());
    }

    pub(crate) fn add_debug_item(&mut self, item: &BundlePath) {
        self.item_debug_paths
            .entry(item.path.clone())
            .or_insert_with(|| item.clone());
    }

    pub(crate) fn add_file_mapping(&mut self, mapping: FilePathMapping) {
        self.file_path_mappings
            .entry(mapping.path.clone())
            .or_insert(mapping);
    }

    pub(crate) fn add_license(&mut self, path: String) {
        self.license_paths.insert(path);
    }

    pub(crate) fn set_variants(&mut self, variants: HashMap<String, VariantSet>) {
        self.variants = variants;
    }
}

impl PartialEq for BundlePathMapping {
    fn eq(&self, other: &Self) -> bool {
        self.bundle.id == other.bundle.id
            && self.path_mappings == other.path_mappings
            && self.item_paths.iter().eq(other.item_paths.iter())
            && self.item_debug_paths.iter().eq(other.item_debug_paths.iter())
            && self.file_path_mappings.iter().eq(other.file_path_mappings.iter())
            && self
                .linked_file_path_mappings
                .iter()
                .eq(other.linked_file_path_mappings.iter())
            && self.license_paths.iter().eq(other.license_paths.iter())
            && self.variants == other.variants
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::FsResourceReader;
    use crate::types::BundleId;
    use std::time::Duration;
    use tempfile::TempDir;

    fn bundle() -> Arc<Bundle> {
        Arc::new(Bundle::new(BundleId::new(1).unwrap(), "/bundles/app.js"))
    }

    #[test]
    fn test_items_follow_debug_inclusion() {
        let mut mapping = BundlePathMapping::new(bundle());
        mapping.add_item(BundlePath::new(None, "/a.js"), DebugInclusion::Always);
        mapping.add_item(BundlePath::new(None, "/debug.js"), DebugInclusion::Only);
        mapping.add_item(BundlePath::new(None, "/prod.js"), DebugInclusion::Never);
        mapping.add_item(BundlePath::new(None, "/a.js"), DebugInclusion::Always);

        let prod: Vec<_> = mapping.item_paths().map(|p| p.path.as_str()).collect();
        let debug: Vec<_> = mapping.item_debug_paths().map(|p| p.path.as_str()).collect();
        assert_eq!(prod, vec!["/a.js", "/prod.js"]);
        assert_eq!(debug, vec!["/a.js", "/debug.js"]);
    }

    #[test]
    fn test_bundle_path_display() {
        let item = BundlePath::new(Some("/v2".into()), "/js/app.js");
        assert_eq!(item.to_string(), "/v2/js/app.js");
    }

    #[test]
    fn test_modified_files() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.js");
        std::fs::write(&file, "var a;").unwrap();

        let reader = FsResourceReader::new(temp.path());
        let actual = reader.last_modified(&file);

        let mut mapping = BundlePathMapping::new(bundle());
        mapping.add_file_mapping(FilePathMapping::new(&file, actual, None));
        assert!(mapping.modified_files(&reader).is_empty());

        let earlier = actual - Duration::from_secs(60);
        mapping.add_linked_file(FilePathMapping::new(temp.path().join("b.css"), earlier, None));
        std::fs::write(temp.path().join("b.css"), "a {}").unwrap();

        let modified = mapping.modified_files(&reader);
        assert_eq!(modified.len(), 1);
        assert_eq!(modified[0].path, temp.path().join("b.css"));
    }
}
