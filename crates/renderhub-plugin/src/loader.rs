//! Plugin resolution from external locations.
//!
//! Hosts supply a [`PluginResolver`] to
//! [`PluginManager::with_resolver`](crate::manager::PluginManager::with_resolver);
//! the `dynamic` feature additionally provides a `libloading`-backed
//! resolver for shared libraries.

use std::path::Path;

use renderhub_core::result::AppResult;

use crate::plugin::Plugin;

/// Resolves a plugin definition from an external location.
pub trait PluginResolver: Send + Sync {
    /// Produces a plugin from the given path.
    fn resolve(&self, path: &Path) -> AppResult<Plugin>;
}

#[cfg(feature = "dynamic")]
mod dynamic_loader {
    use std::path::Path;
    use std::sync::{Mutex, PoisonError};

    use tracing::info;

    use renderhub_core::error::AppError;
    use renderhub_core::result::AppResult;

    use super::PluginResolver;
    use crate::plugin::Plugin;

    /// Type of the plugin entry function exported by dynamic plugins.
    ///
    /// Dynamic plugins must export:
    /// `extern "C" fn renderhub_plugin_entry() -> *mut Plugin`
    pub type PluginEntryFn = unsafe extern "C" fn() -> *mut Plugin;

    /// Resolves plugins from shared libraries (.so / .dll / .dylib).
    pub struct DynamicLoader {
        /// Loaded libraries, kept alive for the lifetime of the loader.
        libraries: Mutex<Vec<libloading::Library>>,
    }

    impl DynamicLoader {
        /// Creates a new dynamic loader.
        pub fn new() -> Self {
            Self {
                libraries: Mutex::new(Vec::new()),
            }
        }

        /// Returns the number of libraries held open.
        pub fn loaded_count(&self) -> usize {
            self.libraries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len()
        }
    }

    impl Default for DynamicLoader {
        fn default() -> Self {
            Self::new()
        }
    }

    impl PluginResolver for DynamicLoader {
        fn resolve(&self, path: &Path) -> AppResult<Plugin> {
            // SAFETY: loads arbitrary code from a shared library; callers
            // must only point this at trusted plugins.
            let plugin = unsafe {
                let lib = libloading::Library::new(path).map_err(|e| {
                    AppError::plugin(format!(
                        "Failed to load plugin library '{}': {}",
                        path.display(),
                        e
                    ))
                })?;

                let entry: libloading::Symbol<PluginEntryFn> =
                    lib.get(b"renderhub_plugin_entry").map_err(|e| {
                        AppError::plugin(format!(
                            "Plugin '{}' missing 'renderhub_plugin_entry' symbol: {}",
                            path.display(),
                            e
                        ))
                    })?;

                let plugin = *Box::from_raw(entry());

                self.libraries
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(lib);

                plugin
            };

            info!(path = %path.display(), plugin = %plugin.manifest.name, "Dynamic plugin resolved");

            Ok(plugin)
        }
    }

    impl std::fmt::Debug for DynamicLoader {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("DynamicLoader")
                .field("loaded_count", &self.loaded_count())
                .finish()
        }
    }
}

#[cfg(feature = "dynamic")]
pub use dynamic_loader::{DynamicLoader, PluginEntryFn};
