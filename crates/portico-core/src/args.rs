//! Resolved handler arguments.

use crate::view::UploadedFile;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Failure reading a resolved argument.
#[derive(Debug, Error)]
pub enum ArgumentError {
    /// No argument with that name was resolved.
    #[error("argument '{name}' was not resolved")]
    Missing {
        /// Argument name.
        name: String,
    },
    /// The validated value does not deserialize into the requested type.
    #[error("argument '{name}' cannot be read as {target}: {source}")]
    Deserialize {
        /// Argument name.
        name: String,
        /// Requested Rust type.
        target: &'static str,
        /// serde error.
        #[source]
        source: serde_json::Error,
    },
    /// The injected value has a different Rust type.
    #[error("argument '{name}' is not a {target}")]
    WrongType {
        /// Argument name.
        name: String,
        /// Requested Rust type.
        target: &'static str,
    },
}

impl From<ArgumentError> for crate::ApiError {
    fn from(err: ArgumentError) -> Self {
        Self::internal_with_source("handler argument mismatch", err)
    }
}

/// Request-scoped argument values keyed by descriptor name.
///
/// JSON-shaped values (path, query, header, cookie, body) are read with
/// [`get`](Self::get); files with [`file`](Self::file); dependency values and
/// principals with [`injected`](Self::injected).
///
/// # Example
///
/// ```
/// use portico_core::ResolvedArguments;
/// use serde_json::json;
///
/// let mut args = ResolvedArguments::new();
/// args.insert_value("item_id", json!(5));
/// args.insert_value("q", json!(null));
///
/// let id: u64 = args.get("item_id").unwrap();
/// let q: Option<String> = args.get("q").unwrap();
/// assert_eq!((id, q), (5, None));
/// ```
#[derive(Default, Clone)]
pub struct ResolvedArguments {
    values: IndexMap<String, Value>,
    files: IndexMap<String, Vec<UploadedFile>>,
    injected: IndexMap<String, Arc<dyn Any + Send + Sync>>,
}

impl ResolvedArguments {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a JSON value.
    pub fn insert_value(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Stores uploaded files.
    pub fn insert_files(&mut self, name: impl Into<String>, files: Vec<UploadedFile>) {
        self.files.insert(name.into(), files);
    }

    /// Stores an injected value.
    pub fn insert_injected(&mut self, name: impl Into<String>, value: Arc<dyn Any + Send + Sync>) {
        self.injected.insert(name.into(), value);
    }

    /// Raw JSON value.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Deserializes a JSON value into `T`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, ArgumentError> {
        let value = self.values.get(name).ok_or_else(|| ArgumentError::Missing {
            name: name.to_string(),
        })?;
        T::deserialize(value).map_err(|source| ArgumentError::Deserialize {
            name: name.to_string(),
            target: std::any::type_name::<T>(),
            source,
        })
    }

    /// First uploaded file under `name`.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name).and_then(|files| files.first())
    }

    /// Every uploaded file under `name`.
    #[must_use]
    pub fn files(&self, name: &str) -> &[UploadedFile] {
        self.files.get(name).map_or(&[], Vec::as_slice)
    }

    /// Injected dependency value or principal.
    pub fn injected<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, ArgumentError> {
        let value = self.injected.get(name).ok_or_else(|| ArgumentError::Missing {
            name: name.to_string(),
        })?;
        Arc::clone(value)
            .downcast::<T>()
            .map_err(|_| ArgumentError::WrongType {
                name: name.to_string(),
                target: std::any::type_name::<T>(),
            })
    }

    /// Whether any kind of argument named `name` was resolved.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
            || self.files.contains_key(name)
            || self.injected.contains_key(name)
    }

    /// The JSON values as one object, in resolution order.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

impl fmt::Debug for ResolvedArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedArguments")
            .field("values", &self.values)
            .field("files", &self.files.keys().collect::<Vec<_>>())
            .field("injected", &self.injected.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        name: String,
        price: f64,
    }

    #[test]
    fn test_get_typed() {
        let mut args = ResolvedArguments::new();
        args.insert_value("item", json!({"name": "pen", "price": 1.5}));
        let item: Item = args.get("item").unwrap();
        assert_eq!(item, Item { name: "pen".into(), price: 1.5 });

        assert!(matches!(
            args.get::<u32>("item"),
            Err(ArgumentError::Deserialize { .. })
        ));
        assert!(matches!(
            args.get::<u32>("other"),
            Err(ArgumentError::Missing { .. })
        ));
    }

    #[test]
    fn test_injected_downcast() {
        let mut args = ResolvedArguments::new();
        args.insert_injected("user", Arc::new("alice".to_string()));
        assert_eq!(args.injected::<String>("user").unwrap().as_str(), "alice");
        assert!(matches!(
            args.injected::<u32>("user"),
            Err(ArgumentError::WrongType { .. })
        ));
    }

    #[test]
    fn test_files() {
        let mut args = ResolvedArguments::new();
        args.insert_files(
            "upload",
            vec![UploadedFile::new(Some("a.txt".into()), None, Bytes::from_static(b"a"))],
        );
        assert_eq!(args.file("upload").and_then(UploadedFile::filename), Some("a.txt"));
        assert!(args.files("none").is_empty());
        assert!(args.contains("upload"));
    }

    #[test]
    fn test_to_json_order() {
        let mut args = ResolvedArguments::new();
        args.insert_value("b", json!(1));
        args.insert_value("a", json!(2));
        let keys: Vec<String> = args.to_json().as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
