//! Render and hook transforms for the watermark plugin.

use serde_json::{Value, json};

/// Wraps a rendered element in a layer carrying the watermark badge.
pub fn apply_watermark(element: Value, label: &str) -> Value {
    json!({
        "type": "layer",
        "children": [
            element,
            { "type": "component", "ref": super::BADGE_COMPONENT, "label": label },
        ],
    })
}

/// Marks hook data as annotated by the watermark plugin.
///
/// Non-object data passes through untouched.
pub fn annotate(data: Value) -> Value {
    match data {
        Value::Object(mut map) => {
            map.insert("annotated".to_string(), json!(true));
            Value::Object(map)
        }
        other => other,
    }
}
