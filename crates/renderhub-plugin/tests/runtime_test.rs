//! End-to-end tests for the plugin runtime: catalog, activation,
//! dependency gating, sweeps, and events.

use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde_json::{Value, json};

use renderhub_core::error::ErrorKind;
use renderhub_plugin::prelude::*;

struct NullEngine;

impl RenderEngine for NullEngine {
    fn name(&self) -> &str {
        "null"
    }
}

fn test_context() -> Arc<PluginContext> {
    Arc::new(PluginContext::new(
        Arc::new(NullEngine),
        Arc::new(EventBus::new()),
        Arc::new(ComponentRegistry::new()),
        Arc::new(TracingLogger),
    ))
}

fn manager() -> PluginManager {
    PluginManager::new(test_context())
}

fn bare_plugin(name: &str) -> Plugin {
    Plugin::builder(PluginManifest::new(name, "1.0.0", format!("{name}.so"))).build()
}

fn suffix_plugin(name: &str, suffix: &str) -> Plugin {
    let suffix = suffix.to_string();
    Plugin::builder(PluginManifest::new(name, "1.0.0", format!("{name}.so")))
        .on_render(move |element| match element {
            Value::String(s) => Ok(Value::String(format!("{s}{suffix}"))),
            other => Ok(other),
        })
        .build()
}

#[test]
fn register_then_info_returns_equal_manifest() {
    let manager = manager();
    let manifest = PluginManifest::new("a", "1.0.0", "a.js");
    manager
        .register_plugin(Plugin::builder(manifest.clone()).build())
        .expect("register");

    assert_eq!(manager.get_plugin_info("a").expect("info"), manifest);
}

#[test]
fn duplicate_registration_rejected_and_catalog_unchanged() {
    let manager = manager();
    manager.register_plugin(bare_plugin("a")).expect("register");
    let original = manager.get_plugin_info("a").expect("info");

    let mut second = PluginManifest::new("a", "9.9.9", "other.so");
    second.description = Some("impostor".to_string());
    let err = manager
        .register_plugin(Plugin::builder(second).build())
        .expect_err("duplicate");

    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(manager.get_plugin_info("a").expect("info"), original);
    assert_eq!(manager.registered_count(), 1);
}

#[test]
fn invalid_manifest_rejected_deterministically() {
    let manager = manager();
    for _ in 0..2 {
        let mut manifest = PluginManifest::new("b", "bad", "");
        manifest.main = String::new();
        let err = manager
            .register_plugin(Plugin::builder(manifest).build())
            .expect_err("invalid");
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("MAJOR.MINOR.PATCH"));
        assert!(err.message.contains("'main'"));
    }
    assert_eq!(manager.registered_count(), 0);
}

#[tokio::test]
async fn load_unknown_plugin_fails_not_found() {
    let manager = manager();
    let err = manager.load_plugin("ghost").await.expect_err("not found");
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn missing_dependencies_all_enumerated_and_plugin_stays_inactive() {
    let manager = manager();
    manager.register_plugin(bare_plugin("theme")).expect("register");

    let mut manifest = PluginManifest::new("gallery", "1.0.0", "gallery.so");
    manifest.dependencies.insert("theme".to_string(), "1.0.0".to_string());
    manifest.dependencies.insert("assets".to_string(), "2.0.0".to_string());
    manager
        .register_plugin(Plugin::builder(manifest).build())
        .expect("register");

    // "theme" is registered but never loaded; "assets" is unknown entirely.
    let err = manager.load_plugin("gallery").await.expect_err("deps");
    assert_eq!(err.kind, ErrorKind::Dependency);
    assert!(err.message.contains("theme"));
    assert!(err.message.contains("assets"));
    assert!(!manager.is_plugin_loaded("gallery"));
}

#[tokio::test]
async fn dependency_order_gates_activation() {
    let manager = manager();
    manager.register_plugin(bare_plugin("a")).expect("register");

    let mut manifest = PluginManifest::new("b", "1.0.0", "b.so");
    manifest.dependencies.insert("a".to_string(), "1.0.0".to_string());
    manager
        .register_plugin(Plugin::builder(manifest).build())
        .expect("register");

    let err = manager.load_plugin("b").await.expect_err("a inactive");
    assert_eq!(err.kind, ErrorKind::Dependency);

    manager.load_plugin("a").await.expect("load a");
    manager.load_plugin("b").await.expect("retry b");
    assert!(manager.is_plugin_loaded("b"));
}

#[test]
fn render_sweep_identity_with_no_active_plugins() {
    let manager = manager();
    let element = json!({"type": "page", "children": []});
    assert_eq!(manager.execute_render_hook(element.clone()), element);
}

#[tokio::test]
async fn render_sweep_composes_in_activation_order() {
    let manager = manager();
    // Register in the opposite order to activation to pin down which
    // order the sweep follows.
    manager.register_plugin(suffix_plugin("p2", "-2")).expect("register");
    manager.register_plugin(suffix_plugin("p1", "-1")).expect("register");

    manager.load_plugin("p1").await.expect("load p1");
    manager.load_plugin("p2").await.expect("load p2");

    assert_eq!(manager.execute_render_hook(json!("x")), json!("x-1-2"));
}

#[tokio::test]
async fn failing_render_transform_is_skipped() {
    let manager = manager();
    let broken = Plugin::builder(PluginManifest::new("broken", "1.0.0", "broken.so"))
        .on_render(|_| Err("render exploded".to_string()))
        .build();
    manager.register_plugin(broken).expect("register");
    manager.register_plugin(suffix_plugin("ok", "-ok")).expect("register");
    manager.load_plugin("broken").await.expect("load");
    manager.load_plugin("ok").await.expect("load");

    assert_eq!(manager.execute_render_hook(json!("x")), json!("x-ok"));
}

#[tokio::test]
async fn update_sweep_observes_active_plugins_in_order() {
    let manager = manager();
    let order = Arc::new(Mutex::new(Vec::new()));

    for name in ["first", "second"] {
        let sink = order.clone();
        let tag = name.to_string();
        let plugin = Plugin::builder(PluginManifest::new(name, "1.0.0", format!("{name}.so")))
            .on_update(move |_, _| {
                sink.lock().expect("lock").push(tag.clone());
                Ok(())
            })
            .build();
        manager.register_plugin(plugin).expect("register");
        manager.load_plugin(name).await.expect("load");
    }

    manager.execute_update_hook(&json!({"frame": 1}));
    assert_eq!(*order.lock().expect("lock"), vec!["first", "second"]);
}

#[tokio::test]
async fn load_is_idempotent_and_on_load_runs_once() {
    let manager = manager();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let plugin = Plugin::builder(PluginManifest::new("once", "1.0.0", "once.so"))
        .on_load(move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .build();
    manager.register_plugin(plugin).expect("register");

    manager.load_plugin("once").await.expect("first load");
    manager.load_plugin("once").await.expect("second load is a no-op");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(manager.get_loaded_plugins(), vec!["once"]);
}

#[tokio::test]
async fn unload_unregistered_fails_and_inactive_unload_skips_callback() {
    let manager = manager();
    let err = manager.unload_plugin("ghost").await.expect_err("not found");
    assert_eq!(err.kind, ErrorKind::NotFound);

    let called = Arc::new(AtomicBool::new(false));
    let flag = called.clone();
    let plugin = Plugin::builder(PluginManifest::new("idle", "1.0.0", "idle.so"))
        .on_unload(move |_| {
            let flag = flag.clone();
            async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }
        })
        .build();
    manager.register_plugin(plugin).expect("register");

    manager.unload_plugin("idle").await.expect("inactive no-op");
    assert!(!called.load(Ordering::SeqCst));
}

#[tokio::test]
async fn full_lifecycle_registration_persists_across_unload() {
    let manager = manager();
    manager.register_plugin(bare_plugin("a")).expect("register");

    manager.load_plugin("a").await.expect("load");
    assert!(manager.is_plugin_loaded("a"));

    manager.unload_plugin("a").await.expect("unload");
    assert!(!manager.is_plugin_loaded("a"));
    assert_eq!(manager.get_plugin_info("a").expect("info").name, "a");

    // Re-registration under the same name is still a duplicate.
    let err = manager.register_plugin(bare_plugin("a")).expect_err("dup");
    assert_eq!(err.kind, ErrorKind::Conflict);

    // The registered-to-active cycle can repeat.
    manager.load_plugin("a").await.expect("reload");
    assert!(manager.is_plugin_loaded("a"));
}

#[tokio::test]
async fn failed_on_load_leaves_plugin_inactive_and_retryable() {
    let manager = manager();
    let fail_next = Arc::new(AtomicBool::new(true));
    let gate = fail_next.clone();
    let plugin = Plugin::builder(PluginManifest::new("flaky", "1.0.0", "flaky.so"))
        .on_load(move |_| {
            let gate = gate.clone();
            async move {
                if gate.swap(false, Ordering::SeqCst) {
                    Err("bootstrap failed".to_string())
                } else {
                    Ok(())
                }
            }
        })
        .build();
    manager.register_plugin(plugin).expect("register");

    let err = manager.load_plugin("flaky").await.expect_err("first load fails");
    assert_eq!(err.kind, ErrorKind::Plugin);
    assert!(!manager.is_plugin_loaded("flaky"));

    manager.load_plugin("flaky").await.expect("retry succeeds");
    assert!(manager.is_plugin_loaded("flaky"));
}

#[tokio::test]
async fn failed_on_unload_keeps_plugin_active() {
    let manager = manager();
    let plugin = Plugin::builder(PluginManifest::new("sticky", "1.0.0", "sticky.so"))
        .on_unload(|_| async { Err("refusing to stop".to_string()) })
        .build();
    manager.register_plugin(plugin).expect("register");
    manager.load_plugin("sticky").await.expect("load");

    let err = manager.unload_plugin("sticky").await.expect_err("unload fails");
    assert_eq!(err.kind, ErrorKind::Plugin);
    assert!(manager.is_plugin_loaded("sticky"));
}

// Two concurrent loads of the same plugin used to be able to both pass
// the "already active?" check and double-run `on_load`; the in-flight
// guard now serializes them.
#[tokio::test]
async fn concurrent_loads_of_same_plugin_run_on_load_once() {
    let manager = Arc::new(manager());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let plugin = Plugin::builder(PluginManifest::new("slow", "1.0.0", "slow.so"))
        .on_load(move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                Ok(())
            }
        })
        .build();
    manager.register_plugin(plugin).expect("register");

    let first = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.load_plugin("slow").await })
    };
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    let second = manager.load_plugin("slow").await;

    first.await.expect("join").expect("first load succeeds");
    let err = second.expect_err("second load rejected while in flight");
    assert_eq!(err.kind, ErrorKind::Conflict);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(manager.get_loaded_plugins(), vec!["slow"]);
}

#[tokio::test]
async fn lifecycle_events_published_on_bus() {
    let context = test_context();
    let manager = PluginManager::new(context.clone());
    let events = Arc::new(Mutex::new(Vec::new()));

    for channel in ["plugin:loaded", "plugin:unloaded"] {
        let sink = events.clone();
        let channel_name = channel.to_string();
        context.events.on(
            channel,
            Arc::new(move |args| {
                sink.lock()
                    .expect("lock")
                    .push((channel_name.clone(), args.to_vec()));
                Ok(())
            }),
        );
    }

    manager.register_plugin(bare_plugin("a")).expect("register");
    manager.load_plugin("a").await.expect("load");
    manager.unload_plugin("a").await.expect("unload");

    let events = events.lock().expect("lock");
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].0, "plugin:loaded");
    assert_eq!(events[0].1, vec![json!({"name": "a", "version": "1.0.0"})]);
    assert_eq!(events[1].0, "plugin:unloaded");
}

#[tokio::test]
async fn unload_all_tears_down_in_reverse_activation_order() {
    let manager = manager();
    let order = Arc::new(Mutex::new(Vec::new()));

    for name in ["first", "second", "third"] {
        let sink = order.clone();
        let tag = name.to_string();
        let plugin = Plugin::builder(PluginManifest::new(name, "1.0.0", format!("{name}.so")))
            .on_unload(move |_| {
                let sink = sink.clone();
                let tag = tag.clone();
                async move {
                    sink.lock().expect("lock").push(tag);
                    Ok(())
                }
            })
            .build();
        manager.register_plugin(plugin).expect("register");
        manager.load_plugin(name).await.expect("load");
    }

    manager.unload_all().await.expect("unload all");

    assert_eq!(*order.lock().expect("lock"), vec!["third", "second", "first"]);
    assert!(manager.get_loaded_plugins().is_empty());
}

#[tokio::test]
async fn registered_hook_transforms_chain_across_plugins() {
    let manager = manager();

    let mut first = PluginManifest::new("first", "1.0.0", "first.so");
    first.hooks.push("page:title".to_string());
    manager
        .register_plugin(
            Plugin::builder(first)
                .hook("page:title", |data| match data {
                    Value::String(s) => Value::String(format!("{s} |")),
                    other => other,
                })
                .build(),
        )
        .expect("register");

    let mut second = PluginManifest::new("second", "1.0.0", "second.so");
    second.hooks.push("page:title".to_string());
    manager
        .register_plugin(
            Plugin::builder(second)
                .hook("page:title", |data| match data {
                    Value::String(s) => Value::String(format!("{s} RenderHub")),
                    other => other,
                })
                .build(),
        )
        .expect("register");

    // Hook chains follow registration order and run without activation.
    assert_eq!(
        manager.execute_hook("page:title", json!("Home")),
        json!("Home | RenderHub")
    );
    assert_eq!(manager.execute_hook("unknown", json!(7)), json!(7));
}

struct StaticResolver {
    fail_load: bool,
}

impl PluginResolver for StaticResolver {
    fn resolve(&self, path: &Path) -> AppResult<Plugin> {
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| AppError::plugin("unresolvable path"))?;
        let mut builder =
            Plugin::builder(PluginManifest::new(name, "1.0.0", path.display().to_string()));
        if self.fail_load {
            builder = builder.on_load(|_| async { Err("bootstrap failed".to_string()) });
        }
        Ok(builder.build())
    }
}

#[tokio::test]
async fn load_from_file_registers_and_activates() {
    let context = test_context();
    let manager =
        PluginManager::with_resolver(context, Arc::new(StaticResolver { fail_load: false }));

    let name = manager
        .load_plugin_from_file(Path::new("/plugins/marquee.so"))
        .await
        .expect("load from file");

    assert_eq!(name, "marquee");
    assert!(manager.is_plugin_loaded("marquee"));
}

#[tokio::test]
async fn load_from_file_failure_keeps_plugin_registered() {
    let context = test_context();
    let manager =
        PluginManager::with_resolver(context, Arc::new(StaticResolver { fail_load: true }));

    let err = manager
        .load_plugin_from_file(Path::new("/plugins/marquee.so"))
        .await
        .expect_err("load fails");
    assert_eq!(err.kind, ErrorKind::Plugin);

    // Registration is not rolled back, so the load can be retried alone.
    assert!(manager.get_plugin_info("marquee").is_ok());
    assert!(!manager.is_plugin_loaded("marquee"));
}

#[tokio::test]
async fn load_from_file_without_resolver_is_a_configuration_error() {
    let manager = manager();
    let err = manager
        .load_plugin_from_file(Path::new("/plugins/marquee.so"))
        .await
        .expect_err("no resolver");
    assert_eq!(err.kind, ErrorKind::Configuration);
}
