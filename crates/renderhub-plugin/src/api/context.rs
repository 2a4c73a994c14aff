//! Plugin context — host collaborators shared with every plugin callback.

use std::sync::Arc;

use crate::bus::EventBus;
use crate::components::ComponentRegistry;

/// Handle to the host rendering engine.
///
/// The runtime never calls engine methods itself; it forwards the
/// reference to plugin callbacks through [`PluginContext`].
pub trait RenderEngine: Send + Sync {
    /// Identifies the engine implementation.
    fn name(&self) -> &str;
}

/// Logger collaborator used for plugin-visible logging.
pub trait PluginLogger: Send + Sync {
    /// Logs an informational message.
    fn log(&self, message: &str);
    /// Logs a warning.
    fn warn(&self, message: &str);
    /// Logs an error.
    fn error(&self, message: &str);
}

/// Default logger forwarding to the `tracing` subscriber.
#[derive(Debug, Default)]
pub struct TracingLogger;

impl PluginLogger for TracingLogger {
    fn log(&self, message: &str) {
        tracing::info!(target: "renderhub::plugin", "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "renderhub::plugin", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "renderhub::plugin", "{message}");
    }
}

/// Context passed to plugins providing access to host collaborators.
///
/// Created once at startup and shared by reference across all plugins and
/// the manager; its identity is how plugins and the manager cooperate
/// without a shared global.
#[derive(Clone)]
pub struct PluginContext {
    /// Host rendering engine.
    pub engine: Arc<dyn RenderEngine>,
    /// Event bus.
    pub events: Arc<EventBus>,
    /// Component registry.
    pub components: Arc<ComponentRegistry>,
    /// Logger.
    pub logger: Arc<dyn PluginLogger>,
}

impl PluginContext {
    /// Bundles the host collaborators into a context.
    pub fn new(
        engine: Arc<dyn RenderEngine>,
        events: Arc<EventBus>,
        components: Arc<ComponentRegistry>,
        logger: Arc<dyn PluginLogger>,
    ) -> Self {
        Self {
            engine,
            events,
            components,
            logger,
        }
    }
}

impl std::fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginContext")
            .field("engine", &self.engine.name())
            .finish()
    }
}
