//! Error types for document generation.

use portico_core::ConfigurationError;
use thiserror::Error;

/// Errors that can occur while generating or rendering the document.
#[derive(Debug, Error)]
pub enum DocsError {
    /// The registered endpoints cannot be described consistently
    /// (schema name collisions, repeated operation ids).
    #[error("invalid API configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The endpoint's method has no slot in an OpenAPI path item.
    #[error("method {method} on {path} cannot be documented")]
    UnsupportedMethod {
        /// HTTP method.
        method: String,
        /// Path template.
        path: String,
    },

    /// Failed to serialize the document to JSON.
    #[error("failed to serialize OpenAPI document: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for documentation operations.
pub type DocsResult<T> = Result<T, DocsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_error() {
        let err: DocsError = serde_json::from_str::<String>("invalid")
            .unwrap_err()
            .into();
        assert!(matches!(err, DocsError::Serialization(_)));
        assert!(err.to_string().contains("serialize"));
    }

    #[test]
    fn test_configuration_error() {
        let err: DocsError = ConfigurationError::DuplicateOperationId {
            operation_id: "get_items".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            DocsError::Configuration(ConfigurationError::DuplicateOperationId { .. })
        ));
        assert!(err.to_string().contains("get_items"));
    }
}
