//! Plugin record — a manifest plus optional lifecycle callbacks.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::api::context::PluginContext;
use crate::hooks::registry::HookFn;
use crate::manifest::PluginManifest;

/// Asynchronous lifecycle callback (`on_load` / `on_unload`).
pub type LifecycleFn =
    Arc<dyn Fn(Arc<PluginContext>) -> BoxFuture<'static, Result<(), String>> + Send + Sync>;

/// Pure transform applied to rendered output during the render sweep.
pub type RenderFn = Arc<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;

/// Side-effecting observer invoked during the update sweep.
pub type UpdateFn = Arc<dyn Fn(&Value, &PluginContext) -> Result<(), String> + Send + Sync>;

/// A manifest plus optional lifecycle callbacks.
///
/// Callbacks are presence-tagged: the manager checks each `Option` before
/// invocation rather than inspecting the plugin at runtime. A plugin is
/// never mutated after registration; only its membership in the active
/// set changes.
pub struct Plugin {
    /// Declarative identity and metadata.
    pub manifest: PluginManifest,
    /// Invoked during load, before activation. May suspend and may fail.
    pub on_load: Option<LifecycleFn>,
    /// Invoked during unload, before deactivation. May suspend and may fail.
    pub on_unload: Option<LifecycleFn>,
    /// Transform from rendered output to rendered output.
    pub on_render: Option<RenderFn>,
    /// Per-frame observer; return value ignored.
    pub on_update: Option<UpdateFn>,
    /// Hook name → transform, in the order the plugin declares them.
    pub hooks: Vec<(String, HookFn)>,
}

impl Plugin {
    /// Starts building a plugin from its manifest.
    pub fn builder(manifest: PluginManifest) -> PluginBuilder {
        PluginBuilder::new(manifest)
    }

    /// Returns the plugin name.
    pub fn name(&self) -> &str {
        &self.manifest.name
    }
}

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin")
            .field("manifest", &self.manifest)
            .field("on_load", &self.on_load.is_some())
            .field("on_unload", &self.on_unload.is_some())
            .field("on_render", &self.on_render.is_some())
            .field("on_update", &self.on_update.is_some())
            .field("hooks", &self.hooks.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish()
    }
}

/// Builder assembling a [`Plugin`] from closures.
pub struct PluginBuilder {
    manifest: PluginManifest,
    on_load: Option<LifecycleFn>,
    on_unload: Option<LifecycleFn>,
    on_render: Option<RenderFn>,
    on_update: Option<UpdateFn>,
    hooks: Vec<(String, HookFn)>,
}

impl PluginBuilder {
    /// Creates a builder with the given manifest and no callbacks.
    pub fn new(manifest: PluginManifest) -> Self {
        Self {
            manifest,
            on_load: None,
            on_unload: None,
            on_render: None,
            on_update: None,
            hooks: Vec::new(),
        }
    }

    /// Sets the asynchronous load callback.
    pub fn on_load<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(Arc<PluginContext>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), String>> + Send + 'static,
    {
        self.on_load = Some(Arc::new(move |context| Box::pin(callback(context))));
        self
    }

    /// Sets the asynchronous unload callback.
    pub fn on_unload<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(Arc<PluginContext>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), String>> + Send + 'static,
    {
        self.on_unload = Some(Arc::new(move |context| Box::pin(callback(context))));
        self
    }

    /// Sets the render transform.
    pub fn on_render<F>(mut self, callback: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.on_render = Some(Arc::new(callback));
        self
    }

    /// Sets the update observer.
    pub fn on_update<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Value, &PluginContext) -> Result<(), String> + Send + Sync + 'static,
    {
        self.on_update = Some(Arc::new(callback));
        self
    }

    /// Appends a named hook transform. Declaration order is preserved.
    pub fn hook<F>(mut self, name: &str, transform: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.hooks.push((name.to_string(), Arc::new(transform)));
        self
    }

    /// Builds the plugin record.
    pub fn build(self) -> Plugin {
        Plugin {
            manifest: self.manifest,
            on_load: self.on_load,
            on_unload: self.on_unload,
            on_render: self.on_render,
            on_update: self.on_update,
            hooks: self.hooks,
        }
    }
}
