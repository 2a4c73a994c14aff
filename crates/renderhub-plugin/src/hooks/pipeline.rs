//! Hook pipeline — chained execution of hook handlers.
//!
//! Handlers for a hook name form a sequential composition: each handler
//! receives the output of the previous one. A hook with no handlers
//! returns its input unchanged.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::registry::HookRegistry;

/// Executes hook handler chains against a shared [`HookRegistry`].
#[derive(Debug)]
pub struct HookPipeline {
    /// Hook registry.
    registry: Arc<HookRegistry>,
}

impl HookPipeline {
    /// Creates a new pipeline over the given registry.
    pub fn new(registry: Arc<HookRegistry>) -> Self {
        Self { registry }
    }

    /// Folds `data` through every handler registered under `hook`,
    /// in registration order.
    pub fn execute(&self, hook: &str, data: Value) -> Value {
        let handlers = self.registry.handlers_for(hook);

        if handlers.is_empty() {
            return data;
        }

        debug!(hook = %hook, handler_count = handlers.len(), "Executing hook chain");

        handlers
            .into_iter()
            .fold(data, |current, handler| handler(current))
    }

    /// Returns a reference to the hook registry.
    pub fn registry(&self) -> &Arc<HookRegistry> {
        &self.registry
    }
}
