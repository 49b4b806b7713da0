//! Property tests for validation on arbitrary JSON.

use portico_core::{Coercion, FieldSpec, Model, SchemaCache, TypeSpec};
use proptest::prelude::*;
use serde_json::Value;

struct Item;

impl Model for Item {
    const NAME: &'static str = "Item";

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::of::<String>("name"),
            FieldSpec::of::<i64>("count").alias("itemCount"),
            FieldSpec::of::<Vec<f64>>("prices"),
            FieldSpec::of::<Option<bool>>("active"),
        ]
    }
}

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<f64>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            proptest::collection::btree_map("[a-zA-Z_]{1,9}", inner, 0..5)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn model_validation_reports_instead_of_panicking(value in arb_json()) {
        let cache = SchemaCache::new();
        for mode in [Coercion::Strict, Coercion::Lax] {
            match cache.validate(&TypeSpec::model::<Item>(), &value, mode) {
                Ok(normalized) => {
                    let object = normalized.as_object().unwrap();
                    prop_assert!(object.contains_key("name"));
                    prop_assert!(object.contains_key("count"));
                    prop_assert!(!object.contains_key("itemCount"));
                }
                Err(failures) => prop_assert!(!failures.is_empty()),
            }
        }
    }

    #[test]
    fn accepted_integers_keep_their_value(f in any::<f64>()) {
        let cache = SchemaCache::new();
        if let Ok(out) = cache.validate(&TypeSpec::Integer, &Value::from(f), Coercion::Strict) {
            let n = out.as_i64().unwrap();
            prop_assert_eq!(n as f64, f);
        }
    }
}
