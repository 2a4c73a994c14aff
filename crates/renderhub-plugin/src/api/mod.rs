//! Plugin-facing API: shared context and the restricted extension facade.

pub mod context;
pub mod facade;

pub use context::{PluginContext, PluginLogger, RenderEngine, TracingLogger};
pub use facade::ExtensionApi;
