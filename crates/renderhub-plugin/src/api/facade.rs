//! Extension API — the restricted surface plugin code calls back into.
//!
//! Plugins go through this facade instead of reaching into the manager's
//! catalog or active set. The indirection leaves room for per-manifest
//! permission checks without touching plugin code.

use std::sync::Arc;

use serde_json::Value;

use crate::bus::EventHandler;
use crate::manager::PluginManager;

/// Restricted wrapper over the manager and shared context.
#[derive(Debug, Clone)]
pub struct ExtensionApi {
    /// The plugin manager.
    manager: Arc<PluginManager>,
}

impl ExtensionApi {
    /// Creates a facade over the given manager.
    pub fn new(manager: Arc<PluginManager>) -> Self {
        Self { manager }
    }

    /// Registers a renderable component definition.
    pub fn register_component(&self, name: &str, component: Value) {
        self.manager.context().components.register(name, component);
    }

    /// Returns a registered component definition, if any.
    pub fn get_component(&self, name: &str) -> Option<Value> {
        self.manager.context().components.get(name)
    }

    /// Subscribes a handler to a named event channel.
    pub fn on(&self, event: &str, handler: EventHandler) {
        self.manager.context().events.on(event, handler);
    }

    /// Publishes an event to a named channel.
    pub fn emit(&self, event: &str, args: &[Value]) {
        self.manager.context().events.emit(event, args);
    }

    /// Logs an informational message through the host logger.
    pub fn log(&self, message: &str) {
        self.manager.context().logger.log(message);
    }

    /// Folds `data` through the handler chain registered under `hook`.
    pub fn execute_hook(&self, hook: &str, data: Value) -> Value {
        self.manager.execute_hook(hook, data)
    }

    /// Runs the render sweep across active plugins.
    pub fn render_with_plugins(&self, element: Value) -> Value {
        self.manager.execute_render_hook(element)
    }
}
