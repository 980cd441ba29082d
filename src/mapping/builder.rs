//! Resolution of a bundle's declared mappings into concrete items.
//!
//! Each declared pattern is classified once:
//!
//! | pattern                      | target                         |
//! |------------------------------|--------------------------------|
//! | `/js/lib/`                   | the directory, no subfolders   |
//! | `/js/lib/**`                 | the directory and subfolders   |
//! | `/js/app.js` (bundle ext.)   | a single file                  |
//! | generated (`jar:...`)        | a single generated resource    |
//! | `/js/.license`               | a license file                 |
//!
//! Inside a directory a `.sorting` file fixes the order of the entries it
//! names; the remaining entries follow in listing order and subdirectories of
//! recursive mappings come last.

use std::collections::HashMap;
use std::sync::Arc;

use super::normalize::{as_resource_path, join_paths};
use super::sort::{SORT_FILE_NAME, parse_sort_file};
use super::{BundlePath, BundlePathMapping, FilePathMapping, MappingError, PathKind, PathMapping};
use crate::bundle::Bundle;
use crate::resource::{GeneratorRegistry, ResourceReader};
use crate::variant::{VariantSet, concat_variants};

/// Name of the per-directory license file.
pub const LICENSE_FILE_NAME: &str = ".license";

/// What a declared pattern resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MappingTarget {
    ShallowDir,
    RecursiveDir,
    File,
    Generated,
    License,
}

/// Resolves one regular bundle.
///
/// The builder holds no state between calls to [`build`](Self::build); the
/// same bundle over an unchanged tree always resolves to an equal mapping.
pub struct BundlePathMappingBuilder<'a> {
    bundle: Arc<Bundle>,
    extension: String,
    generators: &'a dyn GeneratorRegistry,
    reader: &'a dyn ResourceReader,
}

impl<'a> BundlePathMappingBuilder<'a> {
    pub fn new(
        bundle: Arc<Bundle>,
        generators: &'a dyn GeneratorRegistry,
        reader: &'a dyn ResourceReader,
    ) -> Self {
        let extension = match bundle.extension.as_str() {
            "" => String::new(),
            ext if ext.starts_with('.') => ext.to_string(),
            ext => format!(".{ext}"),
        };

        Self {
            bundle,
            extension,
            generators,
            reader,
        }
    }

    /// Resolve the bundle's declared mappings.
    pub fn build(&self) -> Result<BundlePathMapping, MappingError> {
        crate::debug_event!("builder", "resolving", "{}", self.bundle.name);

        let mut result = BundlePathMapping::new(self.bundle.clone());

        for raw in &self.bundle.mappings {
            let mapping = PathMapping::new(self.bundle.id, raw.as_str())
                .with_file_filter(self.bundle.file_filter.clone());
            let generated = self.generators.is_generated_path(mapping.path());

            match self.classify(&mapping, generated)? {
                MappingTarget::ShallowDir => {
                    self.add_items_from_dir(&mut result, mapping.path(), false)?
                }
                MappingTarget::RecursiveDir => {
                    self.add_items_from_dir(&mut result, mapping.path(), true)?
                }
                MappingTarget::File | MappingTarget::Generated => {
                    let path = as_resource_path(mapping.path(), generated);
                    self.add_path_mapping(&mut result, path)?
                }
                MappingTarget::License => {
                    result.add_license(as_resource_path(mapping.path(), generated))
                }
            }

            result.push_path_mapping(mapping);
        }

        crate::debug_event!(
            "builder",
            "resolved",
            "{}: {} items, {} debug items, {} files",
            self.bundle.name,
            result.item_paths().len(),
            result.item_debug_paths().len(),
            result.file_path_mappings().len()
        );

        Ok(result)
    }

    fn classify(&self, mapping: &PathMapping, generated: bool) -> Result<MappingTarget, MappingError> {
        match mapping.kind() {
            PathKind::Directory => Ok(MappingTarget::ShallowDir),
            PathKind::RecursiveDirectory => Ok(MappingTarget::RecursiveDir),
            PathKind::Asset if self.has_extension(mapping.path()) => Ok(MappingTarget::File),
            PathKind::Asset if generated => Ok(MappingTarget::Generated),
            PathKind::Asset if mapping.path().ends_with(LICENSE_FILE_NAME) => {
                Ok(MappingTarget::License)
            }
            PathKind::Asset => Err(MappingError::UnrecognizedMapping {
                bundle: self.bundle.name.clone(),
                mapping: mapping.to_string(),
            }),
        }
    }

    fn has_extension(&self, path: &str) -> bool {
        !self.extension.is_empty() && path.ends_with(&self.extension)
    }

    fn add_items_from_dir(
        &self,
        result: &mut BundlePathMapping,
        dir: &str,
        recursive: bool,
    ) -> Result<(), MappingError> {
        let generated = self.generators.is_generated_path(dir);
        let mut remaining = self.reader.resource_names(dir);

        crate::debug_event!(
            "builder",
            "listing",
            "{} resources in {dir} for {}",
            remaining.len(),
            self.bundle.name
        );

        if remaining.iter().any(|name| name == SORT_FILE_NAME) {
            let sort_path = join_paths(dir, SORT_FILE_NAME, generated);
            self.add_file_mapping(result, &sort_path);

            match self.reader.read(&sort_path) {
                Ok(content) => {
                    for name in parse_sort_file(&content, &mut remaining) {
                        let entry = join_paths(dir, &name, generated);
                        if self.has_extension(&entry) || self.generators.is_generated_path(&entry) {
                            self.add_listed_entry(result, as_resource_path(&entry, generated))?;
                        } else if recursive && self.reader.is_directory(&entry) {
                            self.add_items_from_dir(result, &entry, true)?;
                        }
                    }
                }
                Err(e) => {
                    crate::debug_event!("builder", "sort file unreadable", "{sort_path}: {e}");
                }
            }
        }

        if remaining.iter().any(|name| name == LICENSE_FILE_NAME) {
            let license_path = join_paths(dir, LICENSE_FILE_NAME, generated);
            self.add_file_mapping(result, &license_path);
            result.add_license(license_path);
        }

        let mut folders = Vec::new();
        for name in &remaining {
            if name == SORT_FILE_NAME || name == LICENSE_FILE_NAME {
                continue;
            }

            let entry = join_paths(dir, name, generated);
            let is_dir = self.reader.is_directory(&entry);
            if is_dir {
                if recursive {
                    folders.push(entry);
                }
            } else if self.has_extension(&entry) || self.generators.is_generated_path(&entry) {
                self.add_listed_entry(result, as_resource_path(&entry, generated))?;
            }
        }

        for folder in folders {
            self.add_items_from_dir(result, &folder, true)?;
        }

        Ok(())
    }

    /// Commit an entry found in a directory listing. A regular entry that
    /// lost its backing file since the listing is skipped.
    fn add_listed_entry(&self, result: &mut BundlePathMapping, path: String) -> Result<(), MappingError> {
        if self.generators.is_generated_path(&path) {
            return self.add_path_mapping(result, path);
        }
        if !self.add_file_mapping(result, &path) {
            crate::debug_event!("builder", "skipped vanished entry", "{path}");
            return Ok(());
        }
        self.commit_item(result, path)
    }

    /// Commit one resolved resource.
    fn add_path_mapping(&self, result: &mut BundlePathMapping, path: String) -> Result<(), MappingError> {
        self.add_file_mapping(result, &path);
        self.commit_item(result, path)
    }

    fn commit_item(&self, result: &mut BundlePathMapping, path: String) -> Result<(), MappingError> {
        if self.generators.is_generated_path(&path) {
            let available = self.generators.available_variants(&path);
            if !available.is_empty() {
                let merged = self.merge_variants(result.variants(), &available)?;
                result.set_variants(merged);
            }
        }

        let item = BundlePath::new(self.bundle.prefix.clone(), path);
        result.add_item(item, self.bundle.inclusion.debug);
        Ok(())
    }

    /// Track the file backing `path`. Returns whether one exists.
    fn add_file_mapping(&self, result: &mut BundlePathMapping, path: &str) -> bool {
        match self.reader.file_path(path) {
            Some(file) => {
                let last_modified = self.reader.last_modified(&file);
                result.add_file_mapping(FilePathMapping::new(
                    file,
                    last_modified,
                    Some(self.bundle.id),
                ));
                true
            }
            None => {
                crate::debug_event!("builder", "no backing file", "{path}");
                false
            }
        }
    }

    fn merge_variants(
        &self,
        current: &HashMap<String, VariantSet>,
        other: &HashMap<String, VariantSet>,
    ) -> Result<HashMap<String, VariantSet>, MappingError> {
        concat_variants(current, other).map_err(|source| MappingError::Variant {
            bundle: self.bundle.name.clone(),
            source,
        })
    }
}
