//! JSON-schema normalization for the Gemini function-declaration dialect
//!
//! Tool servers publish schemas generated from typed signatures, which carry
//! `title` annotations and lowercase type keywords. Gemini rejects the former
//! and expects the latter in uppercase (`STRING`, `OBJECT`, ...).

use serde_json::{Map, Value};

/// Recursively clean a schema: drop every `title` key, uppercase every
/// string-valued `type`. Objects and arrays are walked uniformly, so nested
/// `properties`, `items` and combinator branches are all covered.
pub fn clean_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let mut cleaned = Map::with_capacity(map.len());
            for (key, value) in map {
                match (key.as_str(), value) {
                    ("title", _) => {}
                    ("type", Value::String(kind)) => {
                        cleaned.insert(key.clone(), Value::String(kind.to_uppercase()));
                    }
                    _ => {
                        cleaned.insert(key.clone(), clean_schema(value));
                    }
                }
            }
            Value::Object(cleaned)
        }
        Value::Array(items) => Value::Array(items.iter().map(clean_schema).collect()),
        other => other.clone(),
    }
}

/// True if any object node at any depth has a `title` key
pub fn contains_title(schema: &Value) -> bool {
    match schema {
        Value::Object(map) => map.contains_key("title") || map.values().any(contains_title),
        Value::Array(items) => items.iter().any(contains_title),
        _ => false,
    }
}
