//! Semantic equality of configuration payloads
//!
//! Two payloads are equal when, after dropping the ignored top-level keys,
//! their canonical forms match. The canonical form is compact JSON with every
//! object's keys sorted recursively, so key encounter order never matters.

use serde_json::{Map, Value};

/// Canonical text of `value`: recursively key-sorted compact JSON
#[must_use]
pub fn canonical_form(value: &Value) -> String {
    canonicalize(value, &[]).to_string()
}

/// Compare two payloads, ignoring the given top-level keys
///
/// Non-object payloads are compared whole.
#[must_use]
pub fn is_equal(left: &Value, right: &Value, ignored: &[&str]) -> bool {
    let equal = canonicalize(left, ignored).to_string() == canonicalize(right, ignored).to_string();
    if !equal {
        tracing::debug!(?ignored, "payloads differ after canonicalization");
    }
    equal
}

/// Rebuild `value` with sorted keys, dropping `ignored` keys at the top level
fn canonicalize(value: &Value, ignored: &[&str]) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map
                .iter()
                .filter(|(key, _)| !ignored.contains(&key.as_str()))
                .collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));

            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(key, val)| (key.clone(), canonicalize(val, &[])))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| canonicalize(v, &[])).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_matter() {
        let a: Value = serde_json::from_str(r#"{"a": 1, "b": 2}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"b": 2, "a": 1}"#).unwrap();
        assert!(is_equal(&a, &b, &[]));
        assert_eq!(canonical_form(&a), canonical_form(&b));
    }

    #[test]
    fn nested_key_order_does_not_matter() {
        let a: Value =
            serde_json::from_str(r#"{"x": {"p": [1, {"k": 1, "j": 2}], "q": null}}"#).unwrap();
        let b: Value =
            serde_json::from_str(r#"{"x": {"q": null, "p": [1, {"j": 2, "k": 1}]}}"#).unwrap();
        assert!(is_equal(&a, &b, &[]));
    }

    #[test]
    fn canonical_form_sorts_keys() {
        let value: Value = serde_json::from_str(r#"{"b": {"d": 1, "c": 2}, "a": [true]}"#).unwrap();
        assert_eq!(canonical_form(&value), r#"{"a":[true],"b":{"c":2,"d":1}}"#);
    }

    #[test]
    fn ignored_keys_are_dropped() {
        let a = json!({"templateId": "x", "lastUpdatedOn": 1, "templateName": "t"});
        let b = json!({"templateId": "y", "lastUpdatedOn": 2, "templateName": "t"});
        assert!(!is_equal(&a, &b, &[]));
        assert!(is_equal(&a, &b, &["templateId", "lastUpdatedOn"]));
    }

    #[test]
    fn ignored_keys_only_apply_at_top_level() {
        let a = json!({"inner": {"templateId": "x"}});
        let b = json!({"inner": {"templateId": "y"}});
        assert!(!is_equal(&a, &b, &["templateId"]));
    }

    #[test]
    fn same_characters_different_structure_differ() {
        // A character-sorted blob would call these equal
        let a = json!({"ab": "c"});
        let b = json!({"ac": "b"});
        assert!(!is_equal(&a, &b, &[]));
    }

    #[test]
    fn array_order_matters() {
        assert!(!is_equal(&json!([1, 2]), &json!([2, 1]), &[]));
    }

    #[test]
    fn non_object_payloads_compare_whole() {
        assert!(is_equal(&json!([{"a": 1}]), &json!([{"a": 1}]), &["a"]));
        assert!(!is_equal(&json!("x"), &json!("y"), &[]));
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            any::<i32>().prop_map(Value::from),
            "[a-z]{0,6}".prop_map(Value::String),
            any::<bool>().prop_map(Value::Bool),
            Just(Value::Null),
        ];
        leaf.prop_recursive(3, 24, 5, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,4}", inner, 0..5)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_equal_to_self(value in arb_value(), ignored in prop::collection::vec("[a-z]{1,4}", 0..3)) {
            let ignored: Vec<&str> = ignored.iter().map(String::as_str).collect();
            prop_assert!(is_equal(&value, &value, &ignored));
        }

        #[test]
        fn prop_reversed_insertion_order_equal(entries in prop::collection::btree_map("[a-z]{1,4}", any::<i32>(), 0..8)) {
            let forward: Map<String, Value> = entries.iter().map(|(k, v)| (k.clone(), Value::from(*v))).collect();
            let reversed: Map<String, Value> = entries.iter().rev().map(|(k, v)| (k.clone(), Value::from(*v))).collect();
            prop_assert!(is_equal(&Value::Object(forward), &Value::Object(reversed), &[]));
        }
    }
}
