//! Property-based tests for schema translation
//!
//! Invariants:
//! - Cleaning is idempotent
//! - No node of a cleaned schema carries a `title` key
//! - Every string `type` in a cleaned schema is uppercase
//! - Non-schema leaves survive untouched

use super::schema::{clean_schema, contains_title};
use proptest::prelude::*;
use serde_json::{Map, Value};

// ============================================================================
// Strategies
// ============================================================================

fn arb_type_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("string".to_string()),
        Just("integer".to_string()),
        Just("number".to_string()),
        Just("boolean".to_string()),
        Just("object".to_string()),
        Just("array".to_string()),
        Just("Null".to_string()),
    ]
}

fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1000i64..1000).prop_map(|n| Value::Number(n.into())),
        "[a-zA-Z0-9 ]{0,20}".prop_map(Value::String),
    ]
}

/// Schema-shaped JSON: objects mixing `title`, `type` and arbitrary keys,
/// nested through objects and arrays.
fn arb_schema() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            (
                proptest::option::of("[A-Za-z ]{1,12}"),
                proptest::option::of(arb_type_name()),
                proptest::collection::btree_map("[a-z_]{1,8}", inner, 0..4),
            )
                .prop_map(|(title, kind, rest)| {
                    let mut map: Map<String, Value> = rest.into_iter().collect();
                    if let Some(title) = title {
                        map.insert("title".to_string(), Value::String(title));
                    }
                    if let Some(kind) = kind {
                        map.insert("type".to_string(), Value::String(kind));
                    }
                    Value::Object(map)
                }),
        ]
    })
}

fn all_types_uppercase(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.iter().all(|(key, v)| match (key.as_str(), v) {
            ("type", Value::String(kind)) => kind.to_uppercase() == *kind,
            _ => all_types_uppercase(v),
        }),
        Value::Array(items) => items.iter().all(all_types_uppercase),
        _ => true,
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_clean_is_idempotent(schema in arb_schema()) {
        let once = clean_schema(&schema);
        prop_assert_eq!(clean_schema(&once), once);
    }

    #[test]
    fn prop_clean_removes_every_title(schema in arb_schema()) {
        prop_assert!(!contains_title(&clean_schema(&schema)));
    }

    #[test]
    fn prop_clean_uppercases_every_type(schema in arb_schema()) {
        prop_assert!(all_types_uppercase(&clean_schema(&schema)));
    }

    #[test]
    fn prop_clean_preserves_leaves(leaf in arb_leaf()) {
        prop_assert_eq!(clean_schema(&leaf), leaf);
    }
}
