//! Hook registry and chained hook pipeline.

pub mod pipeline;
pub mod registry;

pub use pipeline::HookPipeline;
pub use registry::{HookFn, HookRegistry};
