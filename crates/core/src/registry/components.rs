//! Component descriptors declared by loaded bundles.

use bundlehost_api::{ComponentDescriptor, ComponentName};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::HashSet;
use std::sync::Arc;

/// Lookup table from component name to its descriptor.
///
/// Written during bundle load, read from lifecycle callbacks afterwards.
pub struct ComponentTable {
    components: DashMap<ComponentName, Arc<ComponentDescriptor>>,
    /// Components the host declared itself; never redirected.
    host_declared: HashSet<ComponentName>,
}

impl ComponentTable {
    pub fn new(host_declared: impl IntoIterator<Item = ComponentName>) -> Self {
        Self {
            components: DashMap::new(),
            host_declared: host_declared.into_iter().collect(),
        }
    }

    /// Register a descriptor. The first bundle to declare a name keeps it.
    pub fn register(&self, descriptor: ComponentDescriptor) -> bool {
        match self.components.entry(descriptor.name.clone()) {
            Entry::Occupied(existing) => {
                if existing.get().bundle != descriptor.bundle {
                    tracing::warn!(
                        "Component {} declared by both {} and {}; keeping the first",
                        descriptor.name,
                        existing.get().bundle,
                        descriptor.bundle
                    );
                }
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(descriptor));
                true
            }
        }
    }

    pub fn get(&self, name: &ComponentName) -> Option<Arc<ComponentDescriptor>> {
        self.components.get(name).map(|d| d.value().clone())
    }

    pub fn contains(&self, name: &ComponentName) -> bool {
        self.components.contains_key(name)
    }

    pub fn is_host_declared(&self, name: &ComponentName) -> bool {
        self.host_declared.contains(name)
    }

    /// Whether requests for `name` must go through a stub.
    pub fn needs_redirect(&self, name: &ComponentName) -> bool {
        !self.is_host_declared(name) && self.contains(name)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
