//! Aggregation of resolved child bundles into a composite bundle.

use std::sync::Arc;

use super::{BundlePathMapping, MappingError};
use crate::bundle::Bundle;
use crate::variant::concat_variants;

/// Resolves a composite bundle from its already resolved children.
///
/// No filesystem access happens here: each child already applied its own
/// inclusion pattern, so the composite lists are the ordered union of the
/// children's lists.
pub struct CompositeMappingBuilder {
    bundle: Arc<Bundle>,
}

impl CompositeMappingBuilder {
    pub fn new(bundle: Arc<Bundle>) -> Self {
        Self { bundle }
    }

    pub fn build(&self, children: &[&BundlePathMapping]) -> Result<BundlePathMapping, MappingError> {
        let mut result = BundlePathMapping::new(self.bundle.clone());
        let mut variants = self.bundle.variants.clone();

        for child in children {
            for mapping in child.path_mappings() {
                result.push_path_mapping(mapping.clone());
            }
            for item in child.item_paths() {
                result.add_production_item(item);
            }
            for item in child.item_debug_paths() {
                result.add_debug_item(item);
            }
            for file in child.file_path_mappings() {
                result.add_file_mapping(file.clone());
            }
            for file in child.linked_file_path_mappings() {
                result.add_linked_file(file.clone());
            }
            for license in child.license_paths() {
                result.add_license(license.clone());
            }

            variants = concat_variants(&variants, child.variants()).map_err(|source| {
                MappingError::Variant {
                    bundle: self.bundle.name.clone(),
                    source,
                }
            })?;
        }

        result.set_variants(variants);

        crate::debug_event!(
            "composite",
            "resolved",
            "{} from {} children",
            self.bundle.name,
            children.len()
        );

        Ok(result)
    }
}
