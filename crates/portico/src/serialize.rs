//! Response serialization against declared contracts.

use std::sync::Arc;

use bytes::Bytes;
use portico_config::ScalarStyle;
use portico_core::{Coercion, HandlerContractError, ResponseContract, SchemaCache};
use serde_json::{json, Value};

/// A handler result that satisfied its contract.
#[derive(Debug, Clone, PartialEq)]
pub struct Serialized {
    /// Status code to send.
    pub status: u16,
    /// JSON body; `None` sends no body at all.
    pub body: Option<Value>,
}

impl Serialized {
    /// The encoded body, empty when there is none.
    ///
    /// # Errors
    ///
    /// Returns the encoder error, which only happens for non-string map keys.
    pub fn to_bytes(&self) -> Result<Bytes, serde_json::Error> {
        match &self.body {
            Some(body) => serde_json::to_vec(body).map(Bytes::from),
            None => Ok(Bytes::new()),
        }
    }
}

/// Checks handler output against the endpoint's [`ResponseContract`] and
/// renders it for the wire.
///
/// The value is validated strictly: a contract of `Integer` rejects `"42"`.
/// Nested models are then written with aliases or declared names according to
/// the cache's alias policy.
///
/// # Example
///
/// ```
/// use portico::{ResponseSerializer, ScalarStyle};
/// use portico_core::{ResponseContract, SchemaCache, TypeSpec};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let serializer = ResponseSerializer::new(Arc::new(SchemaCache::new()), ScalarStyle::Wrapped);
/// let out = serializer
///     .serialize(Some(json!(7)), &ResponseContract::new(TypeSpec::Integer), 200)
///     .unwrap();
/// assert_eq!(out.body, Some(json!({"value": 7})));
/// ```
#[derive(Debug, Clone)]
pub struct ResponseSerializer {
    cache: Arc<SchemaCache>,
    scalar_style: ScalarStyle,
}

impl ResponseSerializer {
    /// Creates a serializer over `cache`.
    #[must_use]
    pub fn new(cache: Arc<SchemaCache>, scalar_style: ScalarStyle) -> Self {
        Self {
            cache,
            scalar_style,
        }
    }

    /// The scalar style.
    #[must_use]
    pub fn scalar_style(&self) -> ScalarStyle {
        self.scalar_style
    }

    /// Serializes `value` for a response with `status`.
    ///
    /// `None` is the handler returning nothing. It is accepted as an empty
    /// body when the contract declares none or the status is `204`/`304`,
    /// and as JSON `null` when the contract type is optional.
    ///
    /// # Errors
    ///
    /// - [`HandlerContractError::MissingBody`] when a body is required
    /// - [`HandlerContractError::UnexpectedBody`] when none is allowed
    /// - [`HandlerContractError::Mismatch`] when the value does not validate
    pub fn serialize(
        &self,
        value: Option<Value>,
        contract: &ResponseContract,
        status: u16,
    ) -> Result<Serialized, HandlerContractError> {
        let bodiless = matches!(status, 204 | 304);

        let Some(ty) = contract.ty().filter(|_| !bodiless) else {
            return match value {
                None => Ok(Serialized { status, body: None }),
                Some(_) => Err(HandlerContractError::UnexpectedBody),
            };
        };

        let value = match value {
            Some(value) => value,
            None if ty.is_optional() => Value::Null,
            None => return Err(HandlerContractError::MissingBody),
        };

        let validated = self
            .cache
            .validate(ty, &value, Coercion::Strict)
            .map_err(|failures| HandlerContractError::Mismatch { failures })?;
        let dumped = self.cache.dump(ty, validated);

        let body = if self.scalar_style == ScalarStyle::Wrapped && ty.is_scalar() {
            json!({ "value": dumped })
        } else {
            dumped
        };
        Ok(Serialized {
            status,
            body: Some(body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_core::{FieldSpec, Model, TypeSpec};

    struct Item;

    impl Model for Item {
        const NAME: &'static str = "Item";

        fn fields() -> Vec<FieldSpec> {
            vec![
                FieldSpec::of::<i64>("id"),
                FieldSpec::of::<String>("name"),
                FieldSpec::of::<String>("display_name").alias("displayName").optional(),
            ]
        }
    }

    fn serializer(by_alias: bool, style: ScalarStyle) -> ResponseSerializer {
        ResponseSerializer::new(Arc::new(SchemaCache::with_alias_policy(by_alias)), style)
    }

    #[test]
    fn test_model_output() {
        let out = serializer(true, ScalarStyle::Bare)
            .serialize(
                Some(json!({"id": 42, "name": "x"})),
                &ResponseContract::new(TypeSpec::model::<Item>()),
                200,
            )
            .unwrap();
        assert_eq!(out.status, 200);
        assert_eq!(
            out.body,
            Some(json!({"id": 42, "name": "x", "displayName": null}))
        );
        let bytes = out.to_bytes().unwrap();
        assert_eq!(serde_json::from_slice::<Value>(&bytes).unwrap(), out.body.unwrap());
    }

    #[test]
    fn test_alias_policy() {
        let contract = ResponseContract::new(TypeSpec::model::<Item>());
        let value = json!({"id": 1, "name": "x", "display_name": "X"});

        let aliased = serializer(true, ScalarStyle::Bare)
            .serialize(Some(value.clone()), &contract, 200)
            .unwrap();
        assert_eq!(aliased.body.unwrap()["displayName"], "X");

        let declared = serializer(false, ScalarStyle::Bare)
            .serialize(Some(value), &contract, 200)
            .unwrap();
        assert_eq!(declared.body.unwrap()["display_name"], "X");
    }

    #[test]
    fn test_mismatch_is_contract_error() {
        let err = serializer(true, ScalarStyle::Bare)
            .serialize(
                Some(json!({"id": "forty-two", "name": "x"})),
                &ResponseContract::new(TypeSpec::model::<Item>()),
                200,
            )
            .unwrap_err();
        match err {
            HandlerContractError::Mismatch { failures } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].path_string(), "id");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_scalar_styles() {
        let contract = ResponseContract::new(TypeSpec::String);
        let bare = serializer(true, ScalarStyle::Bare)
            .serialize(Some(json!("ok")), &contract, 200)
            .unwrap();
        assert_eq!(bare.body, Some(json!("ok")));

        let wrapped = serializer(true, ScalarStyle::Wrapped)
            .serialize(Some(json!("ok")), &contract, 200)
            .unwrap();
        assert_eq!(wrapped.body, Some(json!({"value": "ok"})));
    }

    #[test]
    fn test_strict_scalars() {
        let err = serializer(true, ScalarStyle::Bare)
            .serialize(Some(json!("42")), &ResponseContract::new(TypeSpec::Integer), 200)
            .unwrap_err();
        assert!(matches!(err, HandlerContractError::Mismatch { .. }));
    }

    #[test]
    fn test_empty_bodies() {
        let s = serializer(true, ScalarStyle::Bare);
        let typed = ResponseContract::new(TypeSpec::model::<Item>());

        let no_content = s.serialize(None, &typed, 204).unwrap();
        assert_eq!(no_content.body, None);
        assert!(no_content.to_bytes().unwrap().is_empty());

        assert!(s.serialize(None, &ResponseContract::empty(), 200).unwrap().body.is_none());
        assert!(matches!(
            s.serialize(None, &typed, 200),
            Err(HandlerContractError::MissingBody)
        ));
        assert!(matches!(
            s.serialize(Some(json!(1)), &ResponseContract::empty(), 200),
            Err(HandlerContractError::UnexpectedBody)
        ));
    }

    #[test]
    fn test_none_for_optional_is_null() {
        let out = serializer(true, ScalarStyle::Bare)
            .serialize(
                None,
                &ResponseContract::new(TypeSpec::optional(TypeSpec::model::<Item>())),
                200,
            )
            .unwrap();
        assert_eq!(out.body, Some(Value::Null));
    }
}
