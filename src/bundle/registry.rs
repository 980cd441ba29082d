//! Bundle lookup and invalidation tracking.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use super::{Bundle, BundleKind, InclusionPattern};
use crate::config::{BundleSettings, ConfigError, VariantSettings};
use crate::mapping::FileFilter;
use crate::types::BundleId;
use crate::variant::VariantSet;
use crate::watcher::DirtyBundleHandler;

/// All declared bundles, keyed by [`BundleId`].
///
/// Besides lookup, the registry keeps the composite back-links and the set of
/// bundles whose sources changed since their last resolution. Marking a bundle
/// dirty marks every composite containing it as well.
#[derive(Debug, Default)]
pub struct BundleRegistry {
    bundles: IndexMap<BundleId, Arc<Bundle>>,
    names: HashMap<String, BundleId>,
    parents: HashMap<BundleId, Vec<BundleId>>,
    dirty: Mutex<HashSet<BundleId>>,
}

impl BundleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from `[[bundles]]` declarations.
    ///
    /// Ids follow declaration order, so composites may name bundles declared
    /// after them.
    pub fn from_settings(declarations: &[BundleSettings]) -> Result<Self, ConfigError> {
        let mut ids = HashMap::new();
        for (idx, decl) in declarations.iter().enumerate() {
            let id = id_for_index(idx);
            if ids.insert(decl.name.as_str(), id).is_some() {
                return Err(ConfigError::DuplicateBundle {
                    name: decl.name.clone(),
                });
            }
        }

        let mut registry = Self::new();
        for (idx, decl) in declarations.iter().enumerate() {
            let bundle = bundle_from_settings(id_for_index(idx), decl, &ids)?;
            registry.insert(bundle)?;
        }

        Ok(registry)
    }

    pub fn insert(&mut self, bundle: Bundle) -> Result<BundleId, ConfigError> {
        if self.names.contains_key(&bundle.name) {
            return Err(ConfigError::DuplicateBundle { name: bundle.name });
        }

        let id = bundle.id;
        for child in bundle.children() {
            self.parents.entry(*child).or_default().push(id);
        }
        self.names.insert(bundle.name.clone(), id);
        self.bundles.insert(id, Arc::new(bundle));
        Ok(id)
    }

    pub fn get(&self, id: BundleId) -> Option<&Arc<Bundle>> {
        self.bundles.get(&id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Arc<Bundle>> {
        self.names.get(name).and_then(|id| self.bundles.get(id))
    }

    /// Bundles in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Bundle>> {
        self.bundles.values()
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// Composites directly containing `id`.
    pub fn parents(&self, id: BundleId) -> &[BundleId] {
        self.parents.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Mark a bundle and all composites containing it as needing a rebuild.
    pub fn mark_dirty(&self, id: BundleId) {
        let mut dirty = self.dirty.lock();
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if dirty.insert(current) {
                pending.extend_from_slice(self.parents(current));
            }
        }
    }

    pub fn is_dirty(&self, id: BundleId) -> bool {
        self.dirty.lock().contains(&id)
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.lock().is_empty()
    }

    /// Drain the dirty set, ids in ascending order.
    pub fn take_dirty(&self) -> Vec<BundleId> {
        let mut ids: Vec<BundleId> = self.dirty.lock().drain().collect();
        ids.sort();
        ids
    }
}

impl DirtyBundleHandler for BundleRegistry {
    fn on_dirty_bundles(&self, bundles: &[BundleId]) {
        for id in bundles {
            if let Some(bundle) = self.get(*id) {
                crate::log_event!("bundles", "modified", "{}", bundle.name);
            }
            self.mark_dirty(*id);
        }
    }
}

fn id_for_index(idx: usize) -> BundleId {
    let value = u32::try_from(idx + 1).unwrap_or(u32::MAX);
    BundleId::new(value).unwrap_or(BundleId::MAX)
}

fn bundle_from_settings(
    id: BundleId,
    decl: &BundleSettings,
    ids: &HashMap<&str, BundleId>,
) -> Result<Bundle, ConfigError> {
    let mut bundle = Bundle::new(id, decl.name.as_str())
        .with_mappings(decl.mappings.iter().cloned())
        .with_prefix(decl.prefix.clone())
        .with_inclusion(InclusionPattern {
            global: decl.global,
            order: decl.order,
            debug: decl.debug,
        });

    if let Some(extension) = &decl.extension {
        bundle = bundle.with_extension(extension.trim_start_matches('.'));
    }

    if let Some(pattern) = &decl.file_filter {
        let filter = FileFilter::new(pattern).map_err(|e| ConfigError::InvalidFileFilter {
            bundle: decl.name.clone(),
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;
        bundle = bundle.with_file_filter(Some(filter));
    }

    let variants = variants_from_settings(&decl.variants).map_err(|source| {
        ConfigError::InvalidVariants {
            bundle: decl.name.clone(),
            source,
        }
    })?;
    bundle = bundle.with_variants(variants);

    if !decl.composite.is_empty() {
        let children = decl
            .composite
            .iter()
            .map(|child| {
                ids.get(child.as_str())
                    .copied()
                    .ok_or_else(|| ConfigError::UnknownChild {
                        composite: decl.name.clone(),
                        child: child.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        bundle = bundle.with_kind(BundleKind::Composite(children));
    }

    Ok(bundle)
}

/// Turn declared `{ default, values }` tables into variant sets.
pub fn variants_from_settings(
    declared: &IndexMap<String, VariantSettings>,
) -> Result<HashMap<String, VariantSet>, crate::variant::VariantError> {
    declared
        .iter()
        .map(|(variant_type, decl)| {
            VariantSet::new(variant_type.as_str(), decl.default.as_str(), decl.values.iter().cloned())
                .map(|set| (variant_type.clone(), set))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::DebugInclusion;

    fn decl(name: &str) -> BundleSettings {
        BundleSettings {
            name: name.to_string(),
            mappings: vec!["/js/".to_string()],
            ..BundleSettings::example()
        }
    }

    fn composite(name: &str, children: &[&str]) -> BundleSettings {
        BundleSettings {
            name: name.to_string(),
            mappings: Vec::new(),
            composite: children.iter().map(|c| c.to_string()).collect(),
            ..BundleSettings::example()
        }
    }

    #[test]
    fn test_from_settings() {
        let mut debug = decl("/bundles/debug.js");
        debug.debug = DebugInclusion::Only;
        debug.variants.insert(
            "locale".into(),
            VariantSettings {
                default: "en".into(),
                values: vec!["en".into(), "fr".into()],
            },
        );

        let registry = BundleRegistry::from_settings(&[
            composite("/bundles/all.js", &["/bundles/app.js", "/bundles/debug.js"]),
            decl("/bundles/app.js"),
            debug,
        ])
        .unwrap();

        assert_eq!(registry.len(), 3);
        let all = registry.get_by_name("/bundles/all.js").unwrap();
        let app = registry.get_by_name("/bundles/app.js").unwrap();
        let debug = registry.get_by_name("/bundles/debug.js").unwrap();

        assert_eq!(all.children(), &[app.id, debug.id]);
        assert_eq!(registry.parents(app.id), &[all.id]);
        assert_eq!(debug.inclusion.debug, DebugInclusion::Only);
        assert_eq!(debug.variants["locale"].len(), 2);
        assert_eq!(app.extension, "js");
    }

    #[test]
    fn test_invalid_declarations() {
        let err = BundleRegistry::from_settings(&[decl("/a.js"), decl("/a.js")]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateBundle { .. }));

        let err = BundleRegistry::from_settings(&[composite("/all.js", &["/missing.js"])])
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownChild { ref child, .. } if child == "/missing.js"));

        let mut bad = decl("/a.js");
        bad.variants.insert(
            "skin".into(),
            VariantSettings {
                default: "dark".into(),
                values: vec!["light".into()],
            },
        );
        let err = BundleRegistry::from_settings(&[bad]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVariants { .. }));
    }

    #[test]
    fn test_dirty_propagates_to_composites() {
        let registry = BundleRegistry::from_settings(&[
            decl("/bundles/a.js"),
            decl("/bundles/b.js"),
            composite("/bundles/ab.js", &["/bundles/a.js", "/bundles/b.js"]),
            composite("/bundles/outer.js", &["/bundles/ab.js"]),
        ])
        .unwrap();
        let id = |name: &str| registry.get_by_name(name).unwrap().id;

        registry.on_dirty_bundles(&[id("/bundles/a.js")]);

        assert!(registry.is_dirty(id("/bundles/a.js")));
        assert!(registry.is_dirty(id("/bundles/ab.js")));
        assert!(registry.is_dirty(id("/bundles/outer.js")));
        assert!(!registry.is_dirty(id("/bundles/b.js")));

        let taken = registry.take_dirty();
        assert_eq!(
            taken,
            vec![id("/bundles/a.js"), id("/bundles/ab.js"), id("/bundles/outer.js")]
        );
        assert!(!registry.has_dirty());
    }
}
