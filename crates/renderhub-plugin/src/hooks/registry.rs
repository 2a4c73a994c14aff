//! Hook registry — ordered handler lists keyed by hook name.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tracing::debug;

/// A synchronous transform handler registered under a hook name.
///
/// Handlers return a new value rather than mutate in place.
pub type HookFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Registry of hook handlers organized by hook name.
///
/// Registration is append-only; hook handlers are process-lifetime-stable,
/// so no removal path exists. Iteration order is registration order.
pub struct HookRegistry {
    /// Hook name → ordered handler list.
    handlers: RwLock<HashMap<String, Vec<HookFn>>>,
}

impl HookRegistry {
    /// Creates a new empty hook registry.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Appends a handler to the hook's ordered list.
    pub fn register(&self, hook: &str, handler: HookFn) {
        let mut handlers = self.handlers_mut();
        handlers.entry(hook.to_string()).or_default().push(handler);
        debug!(hook = %hook, "Hook handler registered");
    }

    /// Returns all handlers for a hook, in registration order.
    pub fn handlers_for(&self, hook: &str) -> Vec<HookFn> {
        let handlers = self.handlers();
        handlers.get(hook).cloned().unwrap_or_default()
    }

    /// Returns whether any handlers are registered for a hook.
    pub fn has_handlers(&self, hook: &str) -> bool {
        let handlers = self.handlers();
        handlers.get(hook).is_some_and(|list| !list.is_empty())
    }

    /// Returns the number of handlers registered for a hook.
    pub fn handler_count(&self, hook: &str) -> usize {
        let handlers = self.handlers();
        handlers.get(hook).map(Vec::len).unwrap_or(0)
    }

    /// Returns all hook names with at least one handler.
    pub fn registered_hooks(&self) -> Vec<String> {
        let handlers = self.handlers();
        handlers.keys().cloned().collect()
    }

    fn handlers(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<HookFn>>> {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn handlers_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<HookFn>>> {
        self.handlers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hooks", &self.registered_hooks())
            .finish()
    }
}
