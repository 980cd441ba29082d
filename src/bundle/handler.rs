//! Resolution and rebuild orchestration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use super::BundleRegistry;
use crate::config::WatcherConfig;
use crate::mapping::{
    BundlePathMapping, BundlePathMappingBuilder, CompositeMappingBuilder, MappingError,
};
use crate::resource::{GeneratorRegistry, ResourceReader};
use crate::types::BundleId;
use crate::watcher::{RebuildGate, ResourceWatcher, WatchError};

/// Owns the resolved mappings of every declared bundle.
///
/// Resolution goes through [`BundlePathMappingBuilder`] for regular bundles
/// and [`CompositeMappingBuilder`] for composites, children first. When a
/// watcher is attached, changed sources mark bundles dirty in the registry and
/// [`rebuild_dirty`](Self::rebuild_dirty) re-resolves them under the
/// [`RebuildGate`].
pub struct BundlesHandler {
    registry: Arc<BundleRegistry>,
    reader: Arc<dyn ResourceReader>,
    generators: Arc<dyn GeneratorRegistry>,
    gate: Arc<RebuildGate>,
    mappings: RwLock<HashMap<BundleId, Arc<BundlePathMapping>>>,
    watcher: RwLock<Option<Arc<ResourceWatcher>>>,
}

impl BundlesHandler {
    pub fn new(
        registry: Arc<BundleRegistry>,
        reader: Arc<dyn ResourceReader>,
        generators: Arc<dyn GeneratorRegistry>,
    ) -> Self {
        Self {
            registry,
            reader,
            generators,
            gate: Arc::new(RebuildGate::new()),
            mappings: RwLock::new(HashMap::new()),
            watcher: RwLock::new(None),
        }
    }

    pub fn registry(&self) -> &Arc<BundleRegistry> {
        &self.registry
    }

    /// The gate raised during rebuilds, shared with the watcher.
    pub fn gate(&self) -> &Arc<RebuildGate> {
        &self.gate
    }

    /// Resolve every declared bundle, replacing previous results.
    pub fn resolve_all(&self) -> Result<(), MappingError> {
        let mut resolved = HashMap::new();
        for bundle in self.registry.iter() {
            self.resolve_into(bundle.id, &mut resolved, &mut Vec::new())?;
        }

        crate::log_event!("bundles", "resolved", "{} bundles", resolved.len());
        *self.mappings.write() = resolved;
        // Everything is fresh now.
        self.registry.take_dirty();
        Ok(())
    }

    /// Resolve `id` into `resolved`, children of composites first.
    ///
    /// Entries already in `resolved` are reused. `stack` holds the composites
    /// being resolved and detects cycles.
    fn resolve_into(
        &self,
        id: BundleId,
        resolved: &mut HashMap<BundleId, Arc<BundlePathMapping>>,
        stack: &mut Vec<BundleId>,
    ) -> Result<Arc<BundlePathMapping>, MappingError> {
        if let Some(mapping) = resolved.get(&id) {
            return Ok(mapping.clone());
        }

        let bundle = self
            .registry
            .get(id)
            .cloned()
            .ok_or_else(|| MappingError::MissingChild {
                composite: stack
                    .last()
                    .and_then(|parent| self.registry.get(*parent))
                    .map(|parent| parent.name.clone())
                    .unwrap_or_default(),
                child: id.to_string(),
            })?;

        let mapping = if bundle.is_composite() {
            if stack.contains(&id) {
                return Err(MappingError::CompositeCycle {
                    bundle: bundle.name.clone(),
                });
            }

            stack.push(id);
            let children = bundle
                .children()
                .iter()
                .map(|child| self.resolve_into(*child, resolved, stack))
                .collect::<Result<Vec<_>, _>>();
            stack.pop();

            let children = children?;
            let refs: Vec<&BundlePathMapping> = children.iter().map(Arc::as_ref).collect();
            CompositeMappingBuilder::new(bundle).build(&refs)?
        } else {
            BundlePathMappingBuilder::new(bundle, self.generators.as_ref(), self.reader.as_ref())
                .build()?
        };

        let mapping = Arc::new(mapping);
        resolved.insert(id, mapping.clone());
        Ok(mapping)
    }

    pub fn mapping(&self, id: BundleId) -> Option<Arc<BundlePathMapping>> {
        self.mappings.read().get(&id).cloned()
    }

    pub fn mapping_by_name(&self, name: &str) -> Option<Arc<BundlePathMapping>> {
        let id = self.registry.get_by_name(name)?.id;
        self.mapping(id)
    }

    /// Resolved mappings in declaration order.
    pub fn mappings(&self) -> Vec<Arc<BundlePathMapping>> {
        let mappings = self.mappings.read();
        self.registry
            .iter()
            .filter_map(|bundle| mappings.get(&bundle.id).cloned())
            .collect()
    }

    /// Start a watcher over the resolved bundles.
    ///
    /// Changes mark bundles dirty in the registry; nothing is rebuilt until
    /// [`rebuild_dirty`](Self::rebuild_dirty) is called.
    pub fn watch(&self, config: &WatcherConfig) -> Result<Arc<ResourceWatcher>, WatchError> {
        let watcher = ResourceWatcher::builder()
            .reader(self.reader.clone())
            .generators(self.generators.clone())
            .handler(self.registry.clone())
            .gate(self.gate.clone())
            .quiescence_delay_ms(config.quiescence_delay_ms)
            .queue_capacity(config.queue_capacity)
            .poll_interval_ms(config.poll_interval_ms)
            .start()?;

        let watcher = Arc::new(watcher);
        self.attach_watcher(watcher.clone())?;
        Ok(watcher)
    }

    /// Register the resolved regular bundles with `watcher`.
    ///
    /// Composites are not registered: a dirty child marks its composites dirty
    /// through the registry.
    pub fn attach_watcher(&self, watcher: Arc<ResourceWatcher>) -> Result<(), WatchError> {
        let standard: Vec<Arc<BundlePathMapping>> = self
            .mappings()
            .into_iter()
            .filter(|mapping| !mapping.bundle().is_composite())
            .collect();
        watcher.watch_bundles(standard.iter().map(Arc::as_ref))?;

        *self.watcher.write() = Some(watcher);
        Ok(())
    }

    pub fn has_dirty(&self) -> bool {
        self.registry.has_dirty()
    }

    /// Re-resolve every dirty bundle.
    ///
    /// Waits up to `idle_timeout` for the watcher to go quiet, then rebuilds
    /// with the gate raised so no event is matched mid-rebuild. On failure the
    /// bundles stay dirty and previous mappings stay in place.
    ///
    /// Must not be called from a [`DirtyBundleHandler`](crate::watcher::DirtyBundleHandler)
    /// callback: the watcher is never idle while the callback runs.
    pub fn rebuild_dirty(
        &self,
        idle_timeout: Option<Duration>,
    ) -> Result<Vec<BundleId>, MappingError> {
        let watcher = self.watcher.read().clone();
        if let Some(watcher) = &watcher {
            if !watcher.wait_for_idle(idle_timeout) {
                crate::debug_event!("bundles", "rebuilding before watcher went idle");
            }
        }

        let _guard = self.gate.enter();
        let dirty = self.registry.take_dirty();
        if dirty.is_empty() {
            return Ok(dirty);
        }

        let mut resolved = self.mappings.read().clone();
        for id in &dirty {
            resolved.remove(id);
        }

        let result = dirty
            .iter()
            .try_for_each(|id| self.resolve_into(*id, &mut resolved, &mut Vec::new()).map(|_| ()));
        if let Err(e) = result {
            for id in &dirty {
                self.registry.mark_dirty(*id);
            }
            tracing::warn!("[bundles] rebuild failed: {e}");
            return Err(e);
        }

        let rebuilt: Vec<Arc<BundlePathMapping>> = dirty
            .iter()
            .filter_map(|id| resolved.get(id).cloned())
            .collect();
        *self.mappings.write() = resolved;

        for mapping in &rebuilt {
            crate::log_event!("bundles", "rebuilt", "{}", mapping.bundle().name);
        }

        if let Some(watcher) = &watcher {
            let standard = rebuilt
                .iter()
                .filter(|mapping| !mapping.bundle().is_composite())
                .map(Arc::as_ref);
            if let Err(e) = watcher.watch_bundles(standard) {
                tracing::warn!("[bundles] failed to re-register rebuilt bundles: {e}");
            }
        }

        Ok(dirty)
    }

    /// Stop the attached watcher, if any.
    pub fn stop_watching(&self) {
        if let Some(watcher) = self.watcher.write().take() {
            watcher.stop();
        }
    }
}
