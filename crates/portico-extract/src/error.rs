//! Resolution error types.
//!
//! The resolver never picks a status code; it returns one of these outcomes
//! and the facade's transport layer translates it.

use portico_core::{ApiError, AuthenticationError, ErrorKind, ValidationFailure};
use thiserror::Error;

/// Why a request could not be turned into handler arguments.
///
/// When several things go wrong at once, the variant follows a fixed
/// precedence: authentication, then dependency, then payload size, then
/// validation.
///
/// # Example
///
/// ```rust
/// use portico_core::ValidationFailure;
/// use portico_extract::ResolveError;
///
/// let err = ResolveError::Validation(vec![ValidationFailure::missing(vec!["q".into()])]);
/// assert!(!err.has_parse_error());
/// assert!(err.to_string().contains("1 error"));
/// ```
#[derive(Debug, Error)]
pub enum ResolveError {
    /// One or more parameters failed validation.
    #[error("request validation failed with {} error(s)", .0.len())]
    Validation(Vec<ValidationFailure>),

    /// Credentials were missing or rejected.
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthenticationError),

    /// A dependency provider failed.
    #[error("dependency '{name}' failed: {error}")]
    Dependency {
        /// Descriptor name of the dependency.
        name: String,
        /// The provider's error.
        #[source]
        error: ApiError,
    },

    /// The body exceeds the configured limit.
    #[error("request body of {actual} bytes exceeds the limit of {limit} bytes")]
    PayloadTooLarge {
        /// Configured limit.
        limit: usize,
        /// Observed size.
        actual: usize,
    },
}

impl ResolveError {
    /// Short outcome label used in logs and metrics.
    #[must_use]
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::Authentication(_) => "authentication_failed",
            Self::Dependency { .. } => "dependency_failed",
            Self::PayloadTooLarge { .. } => "payload_too_large",
        }
    }

    /// Whether any validation failure is a malformed-input failure.
    #[must_use]
    pub fn has_parse_error(&self) -> bool {
        match self {
            Self::Validation(failures) => failures.iter().any(|f| f.kind == ErrorKind::Parse),
            _ => false,
        }
    }

    /// The validation failures, if this is a validation outcome.
    #[must_use]
    pub fn failures(&self) -> Option<&[ValidationFailure]> {
        match self {
            Self::Validation(failures) => Some(failures),
            _ => None,
        }
    }
}

/// Failure building [`RequestParts`](crate::RequestParts) from a raw request.
#[derive(Debug, Error)]
pub enum PartsError {
    /// The query string is not valid `application/x-www-form-urlencoded`.
    #[error("invalid query string: {0}")]
    Query(#[from] serde_urlencoded::de::Error),

    /// The multipart body could not be parsed.
    #[error(transparent)]
    Multipart(#[from] crate::multipart::MultipartError),

    /// The URI does not parse.
    #[error("invalid request URI: {0}")]
    Uri(#[from] http::uri::InvalidUri),

    /// A header name or value is invalid.
    #[error("invalid header '{0}'")]
    InvalidHeader(String),
}
