//! # renderhub-plugin
//!
//! Plugin runtime for RenderHub. Provides:
//!
//! - Plugin catalog with manifest validation and dependency-gated activation
//! - Named publish/subscribe event bus
//! - Component registry for renderable definitions
//! - Hook registry and chained hook pipeline
//! - Render/update sweeps across active plugins
//! - Restricted extension API for plugin code
//! - Optional dynamic loading via `libloading`

pub mod api;
pub mod bus;
pub mod components;
pub mod hooks;
pub mod loader;
pub mod macros;
pub mod manager;
pub mod manifest;
pub mod plugin;
pub mod prelude;

pub use api::context::{PluginContext, PluginLogger, RenderEngine, TracingLogger};
pub use api::facade::ExtensionApi;
pub use bus::{EventBus, EventHandler};
pub use components::ComponentRegistry;
pub use hooks::pipeline::HookPipeline;
pub use hooks::registry::{HookFn, HookRegistry};
pub use loader::PluginResolver;
#[cfg(feature = "dynamic")]
pub use loader::DynamicLoader;
pub use manager::PluginManager;
pub use manifest::PluginManifest;
pub use plugin::{Plugin, PluginBuilder};
