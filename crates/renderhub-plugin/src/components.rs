//! Component registry — named slots for opaque renderable definitions.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tracing::debug;

/// Named-slot registry mapping string keys to renderable definitions.
///
/// Entries have no lifecycle; they persist until explicitly overwritten
/// or the process ends.
pub struct ComponentRegistry {
    /// Component name → definition.
    components: RwLock<HashMap<String, Value>>,
}

impl ComponentRegistry {
    /// Creates a new empty component registry.
    pub fn new() -> Self {
        Self {
            components: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a component definition under a name.
    ///
    /// Overwrites any prior registration under that name; last writer wins.
    pub fn register(&self, name: &str, component: Value) {
        let mut components = self.components_mut();
        if components.insert(name.to_string(), component).is_some() {
            debug!(component = %name, "Component definition replaced");
        } else {
            debug!(component = %name, "Component registered");
        }
    }

    /// Returns the registered definition, or `None` if absent.
    pub fn get(&self, name: &str) -> Option<Value> {
        let components = self.components();
        components.get(name).cloned()
    }

    /// Checks whether a component is registered.
    pub fn has(&self, name: &str) -> bool {
        let components = self.components();
        components.contains_key(name)
    }

    /// Returns the number of registered components.
    pub fn count(&self) -> usize {
        let components = self.components();
        components.len()
    }

    fn components(&self) -> RwLockReadGuard<'_, HashMap<String, Value>> {
        self.components
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn components_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, Value>> {
        self.components
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("count", &self.count())
            .finish()
    }
}
