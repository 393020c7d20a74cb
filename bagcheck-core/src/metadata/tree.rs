//! Key lookup and replacement over arbitrary JSON trees.
//!
//! For edits outside the typed sidecar fields. Both functions walk every
//! object and array at any depth; `update_key` never mutates its input.

use serde_json::Value;

/// A copy of `value` with every field named `key` set to `new_value`.
pub fn update_key(value: &Value, key: &str, new_value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = if k == key {
                        new_value.clone()
                    } else {
                        update_key(v, key, new_value)
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| update_key(item, key, new_value))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Every value stored under a field named `key`, in document order.
pub fn find_key<'a>(value: &'a Value, key: &str) -> Vec<&'a Value> {
    let mut found = Vec::new();
    collect(value, key, &mut found);
    found
}

fn collect<'a>(value: &'a Value, key: &str, found: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                if k == key {
                    found.push(v);
                } else {
                    collect(v, key, found);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect(item, key, found);
            }
        }
        _ => {}
    }
}
