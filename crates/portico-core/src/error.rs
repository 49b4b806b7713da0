//! Error types for Portico.
//!
//! Four families of errors live here:
//!
//! - [`ConfigurationError`] - raised while routes are registered or the
//!   document is generated; never produced at request time
//! - [`ValidationFailure`] - one entry of the fail-together list produced by
//!   the resolver and the schema validator
//! - [`HandlerContractError`] - a handler returned something its declared
//!   response contract does not permit (a server defect)
//! - [`ApiError`] - errors handlers raise on purpose (`NotFound`, `Conflict`)
//!
//! None of these types know HTTP status codes. The facade's transport module
//! owns that mapping.

use crate::param::ParamSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias using [`ApiError`].
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors detected while declaring endpoints, including routers or generating
/// the document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The path template is malformed.
    #[error("invalid path template '{template}': {reason}")]
    InvalidPathTemplate {
        /// The offending template.
        template: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A `{placeholder}` in the template has no path descriptor.
    #[error("path placeholder '{name}' in '{template}' has no path parameter")]
    UndeclaredPathParameter {
        /// The template.
        template: String,
        /// The placeholder name.
        name: String,
    },

    /// A path descriptor names a placeholder the template does not contain.
    #[error("path parameter '{name}' does not appear in '{template}'")]
    UnusedPathParameter {
        /// The template.
        template: String,
        /// The descriptor name.
        name: String,
    },

    /// More than one body descriptor on a single endpoint.
    #[error("{method} {path} declares more than one body parameter: {names:?}")]
    MultipleBodies {
        /// HTTP method.
        method: String,
        /// Path template.
        path: String,
        /// Names of all body descriptors.
        names: Vec<String>,
    },

    /// Two descriptors on one endpoint share a name.
    #[error("{method} {path} declares parameter '{name}' more than once")]
    DuplicateParameter {
        /// HTTP method.
        method: String,
        /// Path template.
        path: String,
        /// The repeated name.
        name: String,
    },

    /// The success status code is not a valid HTTP status.
    #[error("status code {status} is outside 100..=599")]
    InvalidStatusCode {
        /// The rejected status.
        status: u16,
    },

    /// The (method, path) pair is already registered.
    #[error("route {method} {path} is already registered")]
    DuplicateRoute {
        /// HTTP method.
        method: String,
        /// Path template.
        path: String,
    },

    /// The endpoint was built without a handler.
    #[error("{method} {path} has no handler")]
    MissingHandler {
        /// HTTP method.
        method: String,
        /// Path template.
        path: String,
    },

    /// A regex constraint does not compile.
    #[error("invalid pattern '{pattern}' on '{field}': {reason}")]
    InvalidPattern {
        /// Field or parameter carrying the constraint.
        field: String,
        /// The pattern source.
        pattern: String,
        /// Compiler message.
        reason: String,
    },

    /// Two distinct model types declare the same schema name.
    #[error("schema name '{name}' is declared by both {first} and {second}")]
    SchemaNameCollision {
        /// The shared declared name.
        name: String,
        /// Rust type name of the first model.
        first: String,
        /// Rust type name of the second model.
        second: String,
    },

    /// Two endpoints share an operation id.
    #[error("operation id '{operation_id}' is used by more than one endpoint")]
    DuplicateOperationId {
        /// The repeated operation id.
        operation_id: String,
    },
}

/// Classification of a single validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A required value is absent.
    #[serde(rename = "missing_error")]
    Missing,
    /// The value has the wrong type and cannot be coerced.
    #[serde(rename = "type_error")]
    Type,
    /// The value has the right type but violates a constraint.
    #[serde(rename = "value_error")]
    Value,
    /// The raw input could not be parsed at all (malformed JSON).
    #[serde(rename = "parse_error")]
    Parse,
}

impl ErrorKind {
    /// Returns the wire name of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing_error",
            Self::Type => "type_error",
            Self::Value => "value_error",
            Self::Parse => "parse_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a field path: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Object key.
    Key(String),
    /// Array index.
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// A single validation failure with its location and field path.
///
/// # Example
///
/// ```
/// use portico_core::{ErrorKind, ParamSource, ValidationFailure};
///
/// let failure = ValidationFailure::missing(vec!["item".into(), "price".into()])
///     .at(ParamSource::Body);
/// assert_eq!(failure.kind, ErrorKind::Missing);
/// assert_eq!(failure.path_string(), "item.price");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    /// Which request part the value came from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<ParamSource>,
    /// Path from the parameter to the failing value.
    pub field_path: Vec<PathSegment>,
    /// Human-readable message.
    pub message: String,
    /// Failure classification.
    pub kind: ErrorKind,
}

impl ValidationFailure {
    /// Creates a failure of the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind, field_path: Vec<PathSegment>, message: impl Into<String>) -> Self {
        Self {
            location: None,
            field_path,
            message: message.into(),
            kind,
        }
    }

    /// A required value is absent.
    #[must_use]
    pub fn missing(field_path: Vec<PathSegment>) -> Self {
        Self::new(ErrorKind::Missing, field_path, "field required")
    }

    /// Wrong type.
    #[must_use]
    pub fn type_error(field_path: Vec<PathSegment>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, field_path, message)
    }

    /// Constraint violation.
    #[must_use]
    pub fn value_error(field_path: Vec<PathSegment>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Value, field_path, message)
    }

    /// Unparseable input.
    #[must_use]
    pub fn parse_error(field_path: Vec<PathSegment>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, field_path, message)
    }

    /// Sets the request location.
    #[must_use]
    pub fn at(mut self, location: ParamSource) -> Self {
        self.location = Some(location);
        self
    }

    /// Prepends a segment to the field path.
    #[must_use]
    pub fn prefixed(mut self, segment: impl Into<PathSegment>) -> Self {
        self.field_path.insert(0, segment.into());
        self
    }

    /// Returns the field path joined with dots.
    #[must_use]
    pub fn path_string(&self) -> String {
        self.field_path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = self.location {
            write!(f, "{location}.")?;
        }
        write!(f, "{}: {} ({})", self.path_string(), self.message, self.kind)
    }
}

/// A handler's return value violates its declared response contract.
///
/// This is always a server-side defect and never the client's fault.
#[derive(Debug, Error)]
pub enum HandlerContractError {
    /// The value does not validate against the contract type.
    #[error("handler output does not match the response contract ({} failure(s))", failures.len())]
    Mismatch {
        /// The validation failures against the contract.
        failures: Vec<ValidationFailure>,
    },

    /// The handler returned nothing but the contract requires a body.
    #[error("handler returned no value but the response contract requires a body")]
    MissingBody,

    /// The handler returned a body but the contract declares none.
    #[error("handler returned a value but the response contract declares no body")]
    UnexpectedBody,

    /// The handler output could not be turned into JSON.
    #[error("handler output could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Categories of handler-raised errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The request is semantically invalid.
    Validation,
    /// Missing or invalid credentials.
    Authentication,
    /// Permission denied.
    Authorization,
    /// Resource not found.
    NotFound,
    /// Conflicting state.
    Conflict,
    /// A downstream service failed.
    Unavailable,
    /// Internal server error.
    Internal,
}

impl ErrorCategory {
    /// Returns the snake_case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Authentication => "authentication",
            Self::Authorization => "authorization",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
        }
    }
}

/// Errors raised on purpose by handlers and dependency providers.
///
/// # Example
///
/// ```
/// use portico_core::{ApiError, ErrorCategory};
///
/// fn find(id: u64) -> Result<String, ApiError> {
///     Err(ApiError::not_found(format!("item {id} not found")))
/// }
///
/// let err = find(3).unwrap_err();
/// assert_eq!(err.category(), ErrorCategory::NotFound);
/// assert_eq!(err.code(), "NOT_FOUND");
/// ```
#[derive(Debug, Error)]
pub enum ApiError {
    /// Semantically invalid request.
    #[error("Validation error: {message}")]
    Validation {
        /// Message.
        message: String,
    },

    /// Missing or invalid credentials.
    #[error("Authentication error: {message}")]
    Authentication {
        /// Message.
        message: String,
    },

    /// Permission denied.
    #[error("Authorization denied: {message}")]
    Authorization {
        /// Message.
        message: String,
    },

    /// Resource not found.
    #[error("Not found: {message}")]
    NotFound {
        /// Message.
        message: String,
    },

    /// Conflict.
    #[error("Conflict: {message}")]
    Conflict {
        /// Message.
        message: String,
    },

    /// Downstream dependency unavailable.
    #[error("Unavailable: {message}")]
    Unavailable {
        /// Message.
        message: String,
    },

    /// Internal error; the source is never exposed to clients.
    #[error("Internal error: {message}")]
    Internal {
        /// Message.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl ApiError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates an authentication error.
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Creates an authorization error.
    #[must_use]
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error wrapping a cause.
    #[must_use]
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Authentication { .. } => ErrorCategory::Authentication,
            Self::Authorization { .. } => ErrorCategory::Authorization,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::Unavailable { .. } => ErrorCategory::Unavailable,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Authentication { .. } => "AUTHENTICATION_ERROR",
            Self::Authorization { .. } => "AUTHORIZATION_DENIED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            Self::Unavailable { .. } => "SERVICE_UNAVAILABLE",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Returns the client-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Validation { message }
            | Self::Authentication { message }
            | Self::Authorization { message }
            | Self::NotFound { message }
            | Self::Conflict { message }
            | Self::Unavailable { message }
            | Self::Internal { message, .. } => message,
        }
    }

    /// Builds the response envelope for this error.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope::new(self.code(), self.message(), self.category())
    }
}

/// JSON body of every error response.
///
/// ```json
/// {"error": {"code": "NOT_FOUND", "message": "...", "category": "not_found"}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error detail.
    pub error: ErrorDetail,
}

/// Error detail inside an [`ErrorEnvelope`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Category.
    pub category: ErrorCategory,
    /// Extra structured data (validation failures, limits).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorEnvelope {
    /// Creates an envelope without details.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>, category: ErrorCategory) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                category,
                details: None,
            },
        }
    }

    /// Attaches structured details.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_wire_names() {
        assert_eq!(
            serde_json::to_value(ErrorKind::Missing).unwrap(),
            serde_json::json!("missing_error")
        );
        assert_eq!(ErrorKind::Parse.as_str(), "parse_error");
    }

    #[test]
    fn test_path_segments_serialize_untagged() {
        let failure = ValidationFailure::type_error(
            vec!["item".into(), "tags".into(), 1.into()],
            "value is not a valid string",
        )
        .at(ParamSource::Body);
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["field_path"], serde_json::json!(["item", "tags", 1]));
        assert_eq!(json["location"], "body");
        assert_eq!(json["kind"], "type_error");
    }

    #[test]
    fn test_prefixed_and_display() {
        let failure = ValidationFailure::missing(vec!["price".into()])
            .prefixed("item")
            .at(ParamSource::Body);
        assert_eq!(failure.path_string(), "item.price");
        assert_eq!(failure.to_string(), "body.item.price: field required (missing_error)");
    }

    #[test]
    fn test_api_error_envelope() {
        let err = ApiError::conflict("version mismatch");
        let envelope = err.to_envelope();
        assert_eq!(envelope.error.code, "CONFLICT");
        assert_eq!(envelope.error.category, ErrorCategory::Conflict);
        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json["error"].get("details").is_none());
    }

    #[test]
    fn test_internal_hides_source() {
        let err = ApiError::internal_with_source("database failed", anyhow::anyhow!("timeout"));
        assert_eq!(err.message(), "database failed");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_configuration_error_display() {
        let err = ConfigurationError::DuplicateRoute {
            method: "GET".to_string(),
            path: "/items".to_string(),
        };
        assert_eq!(err.to_string(), "route GET /items is already registered");
    }
}
