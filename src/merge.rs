//! Deep-merge over JSON values
//!
//! Used in two places: merging the in-process override onto the loaded
//! document, and layering a custom plugin object over its preset baseline.
//!
//! Merge semantics:
//! - Objects: deep-merge by key
//! - Arrays: REPLACE (overlay wins entirely)
//! - Scalars: override (overlay wins)

use serde_json::Value;

/// Deep merge two JSON values; `overlay` takes precedence.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = if let Some(base_value) = base_map.remove(&key) {
                    deep_merge(base_value, overlay_value)
                } else {
                    overlay_value
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }

        // Arrays are replaced wholesale, never concatenated
        (Value::Array(_), overlay @ Value::Array(_)) => overlay,

        (_, overlay) => overlay,
    }
}
