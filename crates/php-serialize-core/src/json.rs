//! JSON conversion for decoded values.
//!
//! This module provides conversion from [`Value`] to JSON using
//! serde_json. Enable the `serde` feature to use this module.

use serde_json::{json, Map, Value as JsonValue};

use crate::types::Value;

/// Convert a codec value to a JSON value.
///
/// # Mapping Rules
///
/// | Codec value | JSON |
/// |-------------|------|
/// | `Null` | `null` |
/// | `Bool` | `boolean` |
/// | `Int` | `number` |
/// | `Float` | `number` (NaN becomes `null`) |
/// | `Bytes` | `string` (lossy UTF-8 conversion) |
/// | `String` | `string` |
/// | `List` | `array` |
/// | `Array` (keys `0..n-1`) | `array` |
/// | `Array` (other keys) | `object` |
/// | `Object` | `object` with a `__class__` field |
/// | `Foreign` | `null` (opaque to JSON) |
///
/// # Example
///
/// ```rust
/// use php_serialize_core::{loads, to_json};
///
/// let data = br#"a:2:{s:4:"name";s:5:"Alice";s:3:"age";i:30;}"#;
/// let value = loads(data).unwrap();
/// assert_eq!(to_json(&value), serde_json::json!({"name": "Alice", "age": 30}));
/// ```
pub fn to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => json!(*i),
        Value::Float(f) => {
            if f.is_nan() {
                JsonValue::Null
            } else if f.is_infinite() {
                if f.is_sign_positive() {
                    json!("Infinity")
                } else {
                    json!("-Infinity")
                }
            } else {
                json!(*f)
            }
        }
        Value::Bytes(b) => JsonValue::String(String::from_utf8_lossy(b).into_owned()),
        Value::String(s) => JsonValue::String(s.clone()),
        Value::List(items) => JsonValue::Array(items.iter().map(to_json).collect()),
        Value::Array(entries) => {
            // Contiguous zero-based integer keys render as a JSON array.
            if entries.to_list().is_ok() {
                let mut indexed: Vec<(i64, JsonValue)> = entries
                    .iter()
                    .map(|(k, v)| (k.as_int().unwrap_or_default(), to_json(v)))
                    .collect();
                indexed.sort_by_key(|(i, _)| *i);
                JsonValue::Array(indexed.into_iter().map(|(_, v)| v).collect())
            } else {
                let mut map = Map::new();
                for (k, v) in entries.iter() {
                    let key = match k {
                        Value::Int(i) => i.to_string(),
                        Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
                        Value::String(s) => s.clone(),
                        _ => continue, // Skip invalid keys
                    };
                    map.insert(key, to_json(v));
                }
                JsonValue::Object(map)
            }
        }
        Value::Object(obj) => {
            let mut map = Map::new();
            map.insert("__class__".to_string(), json!(obj.name()));
            for (name, v) in obj.members().iter() {
                let key = match name {
                    Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
                    Value::String(s) => s.clone(),
                    _ => continue,
                };
                map.insert(key, to_json(v));
            }
            JsonValue::Object(map)
        }
        Value::Foreign(_) => JsonValue::Null,
    }
}

/// Convert a codec value to a JSON string.
pub fn to_json_string(value: &Value) -> serde_json::Result<String> {
    serde_json::to_string(&to_json(value))
}

/// Convert a codec value to a pretty-printed JSON string.
pub fn to_json_string_pretty(value: &Value) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&to_json(value))
}
