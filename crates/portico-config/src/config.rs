//! Configuration types.

use portico_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Default request body limit (1 MiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Complete Portico configuration.
///
/// # Example
///
/// ```
/// use portico_config::PorticoConfig;
///
/// let config = PorticoConfig::default();
/// assert_eq!(config.docs.openapi_url, "/openapi.json");
/// assert!(config.serialization.by_alias);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct PorticoConfig {
    /// Generated document and documentation pages.
    #[serde(default)]
    pub docs: DocsConfig,

    /// Response serialization policy.
    #[serde(default)]
    pub serialization: SerializationConfig,

    /// Request resolution limits.
    #[serde(default)]
    pub resolver: ResolverSettings,

    /// Logging setup.
    #[serde(default)]
    pub logging: LogConfig,
}

impl PorticoConfig {
    /// Debug logging, pretty output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            logging: LogConfig::development(),
            ..Self::default()
        }
    }

    /// JSON logging; documentation pages stay on.
    #[must_use]
    pub fn production() -> Self {
        Self {
            logging: LogConfig::production(),
            ..Self::default()
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if:
    /// - a documentation URL does not start with `/`, or two of them coincide
    /// - the document title is empty
    /// - a resolver limit is zero
    /// - the log level is empty or does not parse
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.docs.validate()?;
        self.resolver.validate()?;
        self.logging
            .validate()
            .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))
    }
}

/// Document metadata and the URLs its pages are served at.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DocsConfig {
    /// Serve the JSON document and both pages. `false` removes all three.
    pub enabled: bool,

    /// `info.title`.
    pub title: String,

    /// `info.version`.
    pub version: String,

    /// `info.description`.
    pub description: Option<String>,

    /// URL of the JSON document.
    pub openapi_url: String,

    /// URL of the Swagger UI page.
    pub docs_url: String,

    /// URL of the ReDoc page.
    pub redoc_url: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            title: "Portico API".to_string(),
            version: "0.1.0".to_string(),
            description: None,
            openapi_url: "/openapi.json".to_string(),
            docs_url: "/docs".to_string(),
            redoc_url: "/redoc".to_string(),
        }
    }
}

impl DocsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.title.trim().is_empty() {
            return Err(ConfigError::invalid_value("docs.title", "must not be empty"));
        }
        let urls = [
            ("docs.openapi_url", &self.openapi_url),
            ("docs.docs_url", &self.docs_url),
            ("docs.redoc_url", &self.redoc_url),
        ];
        for (i, (field, url)) in urls.iter().enumerate() {
            if !url.starts_with('/') {
                return Err(ConfigError::invalid_value(*field, "must start with '/'"));
            }
            if let Some((other, _)) = urls[..i].iter().find(|(_, u)| u == url) {
                return Err(ConfigError::invalid_value(
                    *field,
                    format!("same URL as {other}"),
                ));
            }
        }
        Ok(())
    }
}

/// How bare scalar handler results are written.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScalarStyle {
    /// `42`
    #[default]
    Bare,
    /// `{"value": 42}`
    Wrapped,
}

/// Response serialization policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SerializationConfig {
    /// Write model fields under their aliases (and publish aliased schemas).
    pub by_alias: bool,

    /// Scalar result style.
    pub scalar_style: ScalarStyle,
}

impl Default for SerializationConfig {
    fn default() -> Self {
        Self {
            by_alias: true,
            scalar_style: ScalarStyle::Bare,
        }
    }
}

/// Request resolution limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverSettings {
    /// Largest accepted request body, in bytes.
    pub max_body_size: usize,

    /// Largest accepted multipart part, in bytes.
    pub max_field_size: usize,

    /// Most parts accepted in one multipart body.
    pub max_fields: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            max_field_size: DEFAULT_MAX_BODY_SIZE,
            max_fields: 32,
        }
    }
}

impl ResolverSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("resolver.max_body_size", self.max_body_size),
            ("resolver.max_field_size", self.max_field_size),
            ("resolver.max_fields", self.max_fields),
        ] {
            if value == 0 {
                return Err(ConfigError::invalid_value(field, "must be greater than 0"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_telemetry::LogFormat;

    #[test]
    fn test_defaults_are_valid() {
        let config = PorticoConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.docs.enabled);
        assert_eq!(config.serialization.scalar_style, ScalarStyle::Bare);
        assert_eq!(config.resolver.max_body_size, DEFAULT_MAX_BODY_SIZE);
    }

    #[test]
    fn test_presets() {
        assert_eq!(PorticoConfig::development().logging.format, LogFormat::Pretty);
        assert_eq!(PorticoConfig::production().logging.format, LogFormat::Json);
        assert!(PorticoConfig::development().validate().is_ok());
    }

    #[test]
    fn test_docs_url_must_be_absolute() {
        let mut config = PorticoConfig::default();
        config.docs.docs_url = "docs".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("docs.docs_url"));
    }

    #[test]
    fn test_docs_urls_must_differ() {
        let mut config = PorticoConfig::default();
        config.docs.redoc_url = "/docs".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("docs.redoc_url"));
        assert!(err.to_string().contains("docs.docs_url"));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let mut config = PorticoConfig::default();
        config.resolver.max_body_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "resolver.max_body_size"
        ));
    }

    #[test]
    fn test_empty_log_level_rejected() {
        let mut config = PorticoConfig::default();
        config.logging.level = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result = serde_json::from_str::<PorticoConfig>(r#"{"docs": {"swagger": true}}"#);
        assert!(result.is_err());
        let result = serde_json::from_str::<PorticoConfig>(r#"{"server": {}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_scalar_style_names() {
        let style: ScalarStyle = serde_json::from_str(r#""wrapped""#).unwrap();
        assert_eq!(style, ScalarStyle::Wrapped);
    }
}
