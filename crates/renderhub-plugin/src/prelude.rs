//! Prelude for plugin authors and hosts.

pub use renderhub_core::error::{AppError, ErrorKind};
pub use renderhub_core::result::AppResult;

pub use crate::api::context::{PluginContext, PluginLogger, RenderEngine, TracingLogger};
pub use crate::api::facade::ExtensionApi;
pub use crate::bus::{EventBus, EventHandler};
pub use crate::components::ComponentRegistry;
pub use crate::hooks::pipeline::HookPipeline;
pub use crate::hooks::registry::{HookFn, HookRegistry};
pub use crate::loader::PluginResolver;
pub use crate::manager::PluginManager;
pub use crate::manifest::PluginManifest;
pub use crate::plugin::{Plugin, PluginBuilder};

#[cfg(feature = "dynamic")]
pub use crate::loader::DynamicLoader;
