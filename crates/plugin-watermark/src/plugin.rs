//! Watermark plugin assembly.

use serde_json::json;

use renderhub_plugin::manifest;
use renderhub_plugin::prelude::*;

use crate::hooks::{annotate, apply_watermark};

/// Component name the badge definition is registered under.
pub const BADGE_COMPONENT: &str = "watermark-badge";

/// Builds the watermark plugin.
///
/// On load it registers the badge component and subscribes to
/// `document:opened`; every render pass wraps the element in a layer
/// carrying the badge, and the `render:annotate` hook marks hook data
/// as annotated.
pub fn watermark_plugin(label: &str) -> Plugin {
    let mut m = manifest!(
        name: "watermark",
        version: "1.0.0",
        main: "libplugin_watermark.so",
        description: "Stamps a watermark badge onto rendered output",
        author: "RenderHub Team",
    );
    m.hooks.push("render:annotate".to_string());

    let render_label = label.to_string();
    let load_label = label.to_string();

    Plugin::builder(m)
        .on_load(move |context| {
            let label = load_label.clone();
            async move {
                context.components.register(
                    BADGE_COMPONENT,
                    json!({ "type": "badge", "label": label, "position": "bottom-right" }),
                );

                let logger = context.logger.clone();
                context.events.on(
                    "document:opened",
                    std::sync::Arc::new(move |args| {
                        let doc = args.first().cloned().unwrap_or_default();
                        logger.log(&format!("Watermarking document {doc}"));
                        Ok(())
                    }),
                );

                tracing::info!(label = %label, "Watermark plugin initialized");
                Ok(())
            }
        })
        .on_unload(|context| async move {
            context.logger.log("Watermark plugin stopped");
            Ok(())
        })
        .on_render(move |element| Ok(apply_watermark(element, &render_label)))
        .hook("render:annotate", annotate)
        .build()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    struct NullEngine;

    impl RenderEngine for NullEngine {
        fn name(&self) -> &str {
            "null"
        }
    }

    fn runtime() -> PluginManager {
        let context = Arc::new(PluginContext::new(
            Arc::new(NullEngine),
            Arc::new(EventBus::new()),
            Arc::new(ComponentRegistry::new()),
            Arc::new(TracingLogger),
        ));
        PluginManager::new(context)
    }

    #[tokio::test]
    async fn test_load_registers_badge_component() {
        let manager = runtime();
        manager.register_plugin(watermark_plugin("draft")).expect("register");
        assert!(!manager.context().components.has(BADGE_COMPONENT));

        manager.load_plugin("watermark").await.expect("load");

        let badge = manager.context().components.get(BADGE_COMPONENT).expect("badge");
        assert_eq!(badge["label"], "draft");
    }

    #[tokio::test]
    async fn test_render_sweep_stamps_badge() {
        let manager = runtime();
        manager.register_plugin(watermark_plugin("draft")).expect("register");
        manager.load_plugin("watermark").await.expect("load");

        let out = manager.execute_render_hook(json!({"type": "page"}));
        assert_eq!(out["type"], "layer");
        assert_eq!(out["children"][1]["ref"], BADGE_COMPONENT);
    }

    #[tokio::test]
    async fn test_annotate_hook_available_after_registration() {
        let manager = runtime();
        manager.register_plugin(watermark_plugin("draft")).expect("register");

        let out = manager.execute_hook("render:annotate", json!({"page": "home"}));
        assert_eq!(out["annotated"], json!(true));
    }
}
