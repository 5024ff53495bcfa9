//! Tree primitives shared by the engine and rule implementations.
//!
//! Data trees are owned `serde_json::Value`s. Paths are key sequences where a
//! key addresses an object member, or an array element when it parses as an
//! index.

use serde_json::{Map, Value};

// ─── Lookup ─────────────────────────────────────────────────────────────────

/// Returns the direct child of `value` addressed by `key`.
pub fn child<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(key),
        Value::Array(arr) => key.parse::<usize>().ok().and_then(|i| arr.get(i)),
        _ => None,
    }
}

fn child_mut<'a>(value: &'a mut Value, key: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(key),
        Value::Array(arr) => key.parse::<usize>().ok().and_then(|i| arr.get_mut(i)),
        _ => None,
    }
}

/// Resolves a key path against a value tree.
///
/// Returns `None` if any key is absent or a scalar is reached before the path
/// ends. An empty path returns the root.
pub fn resolve_keys<'a>(value: &'a Value, keys: &[String]) -> Option<&'a Value> {
    keys.iter().try_fold(value, |current, key| child(current, key))
}

/// Resolves a bracketed field's submitted value.
///
/// Missing segments and empty-string leaves both come back as `null`, so
/// "absent" and "submitted empty" gate rules the same way.
pub fn reduce_keys(data: &Value, keys: &[String]) -> Value {
    match resolve_keys(data, keys) {
        Some(Value::String(s)) if s.is_empty() => Value::Null,
        Some(v) => v.clone(),
        None => Value::Null,
    }
}

// ─── Assignment ─────────────────────────────────────────────────────────────

/// Writes `new` at `keys`, creating intermediate objects as needed.
///
/// Scalars in the way are replaced by objects. Arrays accept an index up to
/// their length (appending at the end); any other key turns the array into an
/// object keyed by the former indices.
pub fn assign_keys(root: &mut Value, keys: &[String], new: Value) {
    let Some((key, rest)) = keys.split_first() else {
        *root = new;
        return;
    };

    prepare_container(root, key);

    if child_mut(root, key).is_none() {
        match root {
            Value::Array(arr) => arr.push(Value::Null),
            Value::Object(map) => {
                map.insert(key.clone(), Value::Null);
            }
            _ => return,
        }
    }

    if let Some(slot) = child_mut(root, key) {
        assign_keys(slot, rest, new);
    }
}

fn prepare_container(value: &mut Value, key: &str) {
    match value {
        Value::Object(_) => {}
        Value::Array(arr) => {
            let addressable = key.parse::<usize>().is_ok_and(|i| i <= arr.len());
            if !addressable {
                let map: Map<String, Value> = std::mem::take(arr)
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), v))
                    .collect();
                *value = Value::Object(map);
            }
        }
        _ => *value = Value::Object(Map::new()),
    }
}

// ─── Inspection ─────────────────────────────────────────────────────────────

/// `null`, `""`, `[]` and `{}` count as empty.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(arr) => arr.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// True for a non-empty array or object.
pub fn is_fan_out(value: &Value) -> bool {
    match value {
        Value::Array(arr) => !arr.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => false,
    }
}

/// Keys addressing each element of a container, in order.
pub fn element_keys(value: &Value) -> Vec<String> {
    match value {
        Value::Array(arr) => (0..arr.len()).map(|i| i.to_string()).collect(),
        Value::Object(map) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

/// Text form of a scalar, as rules compare it.
///
/// Booleans follow form conventions (`true` → `"1"`, `false` → `""`).
/// Containers have no text form.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) | Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}
