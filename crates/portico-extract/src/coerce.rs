//! Raw request text to JSON candidates.
//!
//! String-sourced parameters are gathered here into JSON values shaped like
//! their declared type; the lax validator then converts the text. Scalars
//! take the last occurrence, sequences keep every occurrence in order, and
//! models are assembled from flat keys.

use portico_core::{ModelInfo, TypeSpec};
use serde_json::{Map, Value};

/// Shapes the occurrences of one key for `ty`. `None` when there are none.
#[must_use]
pub fn gather(ty: &TypeSpec, occurrences: &[&str]) -> Option<Value> {
    let last = occurrences.last()?;
    if ty.required_type().is_sequence() {
        Some(Value::Array(
            occurrences
                .iter()
                .map(|v| Value::String((*v).to_string()))
                .collect(),
        ))
    } else {
        Some(Value::String((*last).to_string()))
    }
}

/// Builds a model object from flat keys.
///
/// Each field is looked up by its alias first, then by its declared name.
/// Returns `None` when no field key occurs at all.
pub fn gather_model<'a, F>(info: &ModelInfo, mut lookup: F) -> Option<Value>
where
    F: FnMut(&str) -> Vec<&'a str>,
{
    let mut object = Map::new();
    for field in info.fields() {
        let mut key = field.wire_name();
        let mut occurrences = lookup(key);
        if occurrences.is_empty() && field.alias_name().is_some() {
            key = field.name();
            occurrences = lookup(key);
        }
        if let Some(value) = gather(field.ty(), &occurrences) {
            object.insert(key.to_string(), value);
        }
    }
    (!object.is_empty()).then_some(Value::Object(object))
}

/// Whether `content_type` names a JSON media type.
#[must_use]
pub fn is_json(content_type: &str) -> bool {
    content_type.parse::<mime::Mime>().is_ok_and(|m| {
        (m.type_() == mime::APPLICATION && m.subtype() == mime::JSON)
            || m.suffix() == Some(mime::JSON)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_core::{FieldSpec, Model, ModelRef, SchemaCache};
    use serde_json::json;

    #[test]
    fn test_gather_scalar_takes_last() {
        assert_eq!(gather(&TypeSpec::Integer, &["1", "2"]), Some(json!("2")));
        assert_eq!(gather(&TypeSpec::Integer, &[]), None);
    }

    #[test]
    fn test_gather_sequence_keeps_order() {
        let ty = TypeSpec::optional(TypeSpec::array(TypeSpec::String));
        assert_eq!(gather(&ty, &["a", "b", "c"]), Some(json!(["a", "b", "c"])));
    }

    struct Filter;

    impl Model for Filter {
        const NAME: &'static str = "Filter";

        fn fields() -> Vec<FieldSpec> {
            vec![
                FieldSpec::of::<Option<i64>>("min_price").alias("minPrice"),
                FieldSpec::of::<Vec<String>>("tags"),
            ]
        }
    }

    #[test]
    fn test_gather_model_flat_keys() {
        let cache = SchemaCache::new();
        let info = cache.describe(&ModelRef::of::<Filter>());
        let pairs = [("minPrice", "3"), ("tags", "a"), ("tags", "b"), ("other", "x")];
        let lookup = |key: &str| {
            pairs
                .iter()
                .filter(|(k, _)| *k == key)
                .map(|(_, v)| *v)
                .collect::<Vec<&str>>()
        };
        assert_eq!(
            gather_model(&info, lookup),
            Some(json!({"minPrice": "3", "tags": ["a", "b"]}))
        );
        assert_eq!(gather_model(&info, |_| Vec::new()), None);
    }

    #[test]
    fn test_is_json() {
        assert!(is_json("application/json"));
        assert!(is_json("application/json; charset=utf-8"));
        assert!(is_json("application/problem+json"));
        assert!(!is_json("text/plain"));
        assert!(!is_json("garbage"));
    }
}
