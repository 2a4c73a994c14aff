//! Watermark plugin for RenderHub.
//!
//! Stamps a watermark badge onto every rendered element, contributes a
//! `render:annotate` hook transform, and reacts to `document:opened`
//! events through the shared context.

mod hooks;
mod plugin;

pub use plugin::{BADGE_COMPONENT, watermark_plugin};
