//! Plugin manager — catalog, dependency-gated activation, and hook sweeps.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::{Value, json};
use tracing::{error, info, warn};

use renderhub_core::config::plugin::PluginConfig;
use renderhub_core::error::AppError;
use renderhub_core::result::AppResult;

use crate::api::context::PluginContext;
use crate::hooks::pipeline::HookPipeline;
use crate::hooks::registry::HookRegistry;
use crate::loader::PluginResolver;
use crate::manifest::PluginManifest;
use crate::plugin::Plugin;

/// Catalog and activation state.
///
/// A name appears in `active` only if it is also a key of `plugins`,
/// and only after its declared dependencies were active at the moment
/// activation was attempted.
struct CatalogState {
    /// Every plugin ever registered, keyed by name.
    plugins: HashMap<String, Arc<Plugin>>,
    /// Names currently loaded; insertion order = activation order.
    active: Vec<String>,
    /// Names with a load or unload currently in flight.
    pending: HashSet<String>,
}

impl CatalogState {
    fn is_active(&self, name: &str) -> bool {
        self.active.iter().any(|n| n == name)
    }
}

/// Owns the plugin catalog and orchestrates lifecycle and hook sweeps.
///
/// Per plugin name the state machine is `Unregistered → Registered ⇄ Active`:
/// unloading returns a plugin to the registered-but-inactive state, from
/// which it may be loaded again; re-registration under the same name is
/// always rejected as a duplicate.
pub struct PluginManager {
    /// Shared context handed to every lifecycle callback.
    context: Arc<PluginContext>,
    /// Hook pipeline over the shared hook registry.
    pipeline: HookPipeline,
    /// Catalog state. Never held across an await.
    state: RwLock<CatalogState>,
    /// Resolver for file-based plugin loading, when configured.
    resolver: Option<Arc<dyn PluginResolver>>,
}

impl PluginManager {
    /// Creates a manager with no file resolver.
    pub fn new(context: Arc<PluginContext>) -> Self {
        Self {
            context,
            pipeline: HookPipeline::new(Arc::new(HookRegistry::new())),
            state: RwLock::new(CatalogState {
                plugins: HashMap::new(),
                active: Vec::new(),
                pending: HashSet::new(),
            }),
            resolver: None,
        }
    }

    /// Creates a manager that can resolve plugins from external files.
    pub fn with_resolver(context: Arc<PluginContext>, resolver: Arc<dyn PluginResolver>) -> Self {
        Self {
            resolver: Some(resolver),
            ..Self::new(context)
        }
    }

    /// Registers a plugin in the catalog without activating it.
    ///
    /// Fails on an invalid manifest or a name collision; in both cases the
    /// catalog and hook table are left unchanged. On success the plugin's
    /// declared hook transforms are appended to the hook table in
    /// declaration order.
    pub fn register_plugin(&self, plugin: Plugin) -> AppResult<()> {
        plugin.manifest.validate()?;

        let plugin = Arc::new(plugin);
        let name = plugin.manifest.name.clone();

        {
            let mut state = self.state_mut();
            if state.plugins.contains_key(&name) {
                return Err(AppError::conflict(format!(
                    "Plugin '{name}' is already registered"
                )));
            }
            state.plugins.insert(name.clone(), plugin.clone());
        }

        for (hook, transform) in &plugin.hooks {
            self.pipeline.registry().register(hook, transform.clone());
        }

        info!(
            plugin = %name,
            version = %plugin.manifest.version,
            hooks = plugin.hooks.len(),
            "Plugin registered"
        );

        Ok(())
    }

    /// Activates a registered plugin after its dependencies.
    ///
    /// Loading an already-active plugin is an idempotent no-op that logs a
    /// warning. Dependency resolution checks name presence in the active
    /// set; every missing name is reported in one error. `on_load` runs
    /// before the plugin joins the active set, so a failed load leaves the
    /// plugin registered-but-inactive and retryable.
    ///
    /// Concurrent load or unload attempts for the same name are rejected
    /// with a conflict error while the first is in flight.
    pub async fn load_plugin(&self, name: &str) -> AppResult<()> {
        let plugin = {
            let mut state = self.state_mut();

            let plugin = state
                .plugins
                .get(name)
                .cloned()
                .ok_or_else(|| AppError::not_found(format!("Plugin '{name}' is not registered")))?;

            if state.is_active(name) {
                warn!(plugin = %name, "Plugin already loaded");
                return Ok(());
            }

            if state.pending.contains(name) {
                return Err(AppError::conflict(format!(
                    "Plugin '{name}' has a load or unload in progress"
                )));
            }

            let missing: Vec<String> = plugin
                .manifest
                .dependencies
                .keys()
                .filter(|dep| !state.is_active(dep.as_str()))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(AppError::dependency(format!(
                    "Plugin '{name}' is missing dependencies: {}",
                    missing.join(", ")
                )));
            }

            state.pending.insert(name.to_string());
            plugin
        };

        let outcome = match plugin.on_load.clone() {
            Some(on_load) => on_load(self.context.clone()).await,
            None => Ok(()),
        };

        {
            let mut state = self.state_mut();
            state.pending.remove(name);

            if let Err(e) = outcome {
                error!(plugin = %name, error = %e, "Plugin load failed");
                return Err(AppError::plugin(format!("Plugin '{name}' load failed: {e}")));
            }

            state.active.push(name.to_string());
        }

        self.context.events.emit(
            "plugin:loaded",
            &[json!({ "name": name, "version": plugin.manifest.version })],
        );
        info!(plugin = %name, version = %plugin.manifest.version, "Plugin loaded");

        Ok(())
    }

    /// Deactivates an active plugin.
    ///
    /// Unloading a registered-but-inactive plugin is an idempotent no-op
    /// that logs a warning and does not invoke `on_unload`. A failed
    /// `on_unload` leaves the plugin active. Unloading a dependency does
    /// not cascade to its dependents.
    pub async fn unload_plugin(&self, name: &str) -> AppResult<()> {
        let plugin = {
            let mut state = self.state_mut();

            let plugin = state
                .plugins
                .get(name)
                .cloned()
                .ok_or_else(|| AppError::not_found(format!("Plugin '{name}' is not registered")))?;

            if !state.is_active(name) {
                warn!(plugin = %name, "Plugin is not loaded");
                return Ok(());
            }

            if state.pending.contains(name) {
                return Err(AppError::conflict(format!(
                    "Plugin '{name}' has a load or unload in progress"
                )));
            }

            state.pending.insert(name.to_string());
            plugin
        };

        let outcome = match plugin.on_unload.clone() {
            Some(on_unload) => on_unload(self.context.clone()).await,
            None => Ok(()),
        };

        {
            let mut state = self.state_mut();
            state.pending.remove(name);

            if let Err(e) = outcome {
                error!(plugin = %name, error = %e, "Plugin unload failed");
                return Err(AppError::plugin(format!(
                    "Plugin '{name}' unload failed: {e}"
                )));
            }

            state.active.retain(|n| n != name);
        }

        self.context.events.emit(
            "plugin:unloaded",
            &[json!({ "name": name, "version": plugin.manifest.version })],
        );
        info!(plugin = %name, "Plugin unloaded");

        Ok(())
    }

    /// Resolves a plugin from an external file, registers it, and loads it.
    ///
    /// Failures at any step are logged and re-raised; nothing is rolled
    /// back. If registration succeeds but the load fails, the plugin stays
    /// registered-but-inactive so the load can be retried via
    /// [`load_plugin`](Self::load_plugin).
    pub async fn load_plugin_from_file(&self, path: &Path) -> AppResult<String> {
        let resolver = self.resolver.as_ref().ok_or_else(|| {
            AppError::configuration("No plugin resolver configured for file loading")
        })?;

        let plugin = resolver.resolve(path).inspect_err(|e| {
            error!(path = %path.display(), error = %e, "Plugin resolution failed");
        })?;
        let name = plugin.manifest.name.clone();

        self.register_plugin(plugin).inspect_err(|e| {
            error!(path = %path.display(), error = %e, "Plugin registration failed");
        })?;

        self.load_plugin(&name).await.inspect_err(|e| {
            error!(plugin = %name, error = %e, "Plugin load failed after registration");
        })?;

        Ok(name)
    }

    /// Loads every shared library in the configured plugin directory.
    ///
    /// Per-file failures are logged and skipped; returns the names that
    /// loaded successfully. A disabled `auto_load` short-circuits to an
    /// empty list.
    pub async fn load_plugins_from_dir(&self, config: &PluginConfig) -> AppResult<Vec<String>> {
        if !config.auto_load {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&config.directory).map_err(|e| {
            AppError::with_source(
                renderhub_core::error::ErrorKind::Configuration,
                format!("Cannot read plugin directory '{}'", config.directory),
                e,
            )
        })?;

        let mut paths: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                matches!(
                    path.extension().and_then(|ext| ext.to_str()),
                    Some("so") | Some("dylib") | Some("dll")
                )
            })
            .collect();
        paths.sort();

        let mut loaded = Vec::new();
        for path in paths {
            match self.load_plugin_from_file(&path).await {
                Ok(name) => loaded.push(name),
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Skipping plugin");
                }
            }
        }

        Ok(loaded)
    }

    /// Folds `element` through every active plugin's render transform,
    /// in activation order. Plugins without a transform are skipped; a
    /// failing transform is logged and its input passes through unchanged.
    pub fn execute_render_hook(&self, element: Value) -> Value {
        let transforms: Vec<(String, crate::plugin::RenderFn)> = {
            let state = self.state();
            state
                .active
                .iter()
                .filter_map(|name| {
                    let plugin = state.plugins.get(name)?;
                    plugin
                        .on_render
                        .clone()
                        .map(|transform| (name.clone(), transform))
                })
                .collect()
        };

        let mut current = element;
        for (name, transform) in transforms {
            match transform(current.clone()) {
                Ok(next) => current = next,
                Err(e) => {
                    error!(plugin = %name, error = %e, "Render transform failed");
                }
            }
        }
        current
    }

    /// Invokes every active plugin's update observer in activation order,
    /// for side effects only. Observer failures are logged and never abort
    /// the sweep.
    pub fn execute_update_hook(&self, element: &Value) {
        let observers: Vec<(String, crate::plugin::UpdateFn)> = {
            let state = self.state();
            state
                .active
                .iter()
                .filter_map(|name| {
                    let plugin = state.plugins.get(name)?;
                    plugin
                        .on_update
                        .clone()
                        .map(|observer| (name.clone(), observer))
                })
                .collect()
        };

        for (name, observer) in observers {
            if let Err(e) = observer(element, &self.context) {
                error!(plugin = %name, error = %e, "Update observer failed");
            }
        }
    }

    /// Folds `data` through the handler chain registered under `hook`.
    pub fn execute_hook(&self, hook: &str, data: Value) -> Value {
        self.pipeline.execute(hook, data)
    }

    /// Unloads every active plugin, most recently activated first.
    ///
    /// Per-plugin failures are logged and do not stop the teardown.
    pub async fn unload_all(&self) -> AppResult<()> {
        let mut names = self.get_loaded_plugins();
        names.reverse();

        for name in &names {
            if let Err(e) = self.unload_plugin(name).await {
                error!(plugin = %name, error = %e, "Error unloading plugin");
            }
        }

        info!("All plugins unloaded");
        Ok(())
    }

    /// Returns the names of loaded plugins in activation order.
    pub fn get_loaded_plugins(&self) -> Vec<String> {
        self.state().active.clone()
    }

    /// Returns the manifest of a registered plugin.
    pub fn get_plugin_info(&self, name: &str) -> AppResult<PluginManifest> {
        self.state()
            .plugins
            .get(name)
            .map(|plugin| plugin.manifest.clone())
            .ok_or_else(|| AppError::not_found(format!("Plugin '{name}' is not registered")))
    }

    /// Checks whether a plugin is currently loaded.
    pub fn is_plugin_loaded(&self, name: &str) -> bool {
        self.state().is_active(name)
    }

    /// Returns the number of registered plugins.
    pub fn registered_count(&self) -> usize {
        self.state().plugins.len()
    }

    /// Returns the shared plugin context.
    pub fn context(&self) -> &Arc<PluginContext> {
        &self.context
    }

    /// Returns the hook registry backing the pipeline.
    pub fn hook_registry(&self) -> &Arc<HookRegistry> {
        self.pipeline.registry()
    }

    // Catalog mutations happen strictly between awaits, so poisoning can
    // only come from a panicking caller thread; recover instead of wedging.
    fn state(&self) -> RwLockReadGuard<'_, CatalogState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, CatalogState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("PluginManager")
            .field("registered", &state.plugins.len())
            .field("active", &state.active)
            .finish()
    }
}
