//! Layered configuration loading.
//!
//! Layers apply in order, later ones winning: a preset, then any number of
//! TOML or JSON documents, then `PREFIX__SECTION__KEY` environment variables.
//! A document only overrides the keys it names; everything else keeps the
//! value of the layer below.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use portico_telemetry::LogFormat;
use serde_json::Value;

use crate::{ConfigError, PorticoConfig, ScalarStyle};

/// Builds a [`PorticoConfig`] from defaults, files, and the environment.
///
/// # Example
///
/// ```no_run
/// use portico_config::ConfigLoader;
///
/// # fn main() -> Result<(), portico_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_development()
///     .with_optional_file("portico.toml")?
///     .with_env_prefix("PORTICO")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: PorticoConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a loader holding the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: PorticoConfig::default(),
            env_prefix: None,
        }
    }

    /// Reset to the default configuration.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = PorticoConfig::default();
        self
    }

    /// Reset to the development preset.
    ///
    /// ```
    /// use portico_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = PorticoConfig::development();
        self
    }

    /// Reset to the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = PorticoConfig::production();
        self
    }

    /// Layer a file on top, picking the format from its extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - the file does not exist or cannot be read
    /// - the extension is neither `.toml` nor `.json`
    /// - the content does not parse or names an unknown field
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;
        if format != "toml" && format != "json" {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        self.with_string(&content, &format)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists and fails to load.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Layer a document given as a string. `format` is `"toml"` or `"json"`.
    ///
    /// ```
    /// use portico_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[docs]\ntitle = \"Inventory\"", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    /// assert_eq!(config.docs.title, "Inventory");
    /// assert_eq!(config.docs.docs_url, "/docs");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the format is unknown or the content is invalid.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let layer: Value = match format.to_lowercase().as_str() {
            "toml" => {
                // Typed parse first so unknown fields report TOML positions.
                let _: PorticoConfig = toml::from_str(content)?;
                let raw: toml::Value = toml::from_str(content)?;
                serde_json::to_value(raw)?
            }
            "json" => {
                let _: PorticoConfig = serde_json::from_str(content)?;
                serde_json::from_str(content)?
            }
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        self.merge(layer)?;
        Ok(self)
    }

    /// Read `PREFIX__SECTION__KEY` variables when loading.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load `.env` from the working directory into the process environment,
    /// if there is one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Dotenv`] if the file exists but is malformed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Load a specific env file into the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Dotenv`] if the file is missing or malformed.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        dotenvy::from_path(path.as_ref())?;
        Ok(self)
    }

    /// Apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override does not parse or the final
    /// configuration fails [`PorticoConfig::validate`].
    pub fn load(mut self) -> Result<PorticoConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }
        self.config.validate()?;
        Ok(self.config)
    }

    /// Return the configuration without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> PorticoConfig {
        self.config
    }

    fn merge(&mut self, layer: Value) -> Result<(), ConfigError> {
        let mut base = serde_json::to_value(&self.config)?;
        merge_values(&mut base, layer);
        self.config = serde_json::from_value(base)?;
        Ok(())
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        // Sorted so that failures are reported in a stable order.
        let vars: BTreeMap<String, String> = env::vars()
            .filter(|(k, _)| k.starts_with(&marker))
            .collect();
        for (key, value) in vars {
            self.apply_env_var(&key, &value, prefix)?;
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let rest = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;
        let parts: Vec<&str> = rest.split("__").collect();

        let config = &mut self.config;
        match parts.as_slice() {
            ["DOCS", "ENABLED"] => config.docs.enabled = parse_bool(key, value)?,
            ["DOCS", "TITLE"] => config.docs.title = value.to_string(),
            ["DOCS", "VERSION"] => config.docs.version = value.to_string(),
            ["DOCS", "DESCRIPTION"] => {
                config.docs.description = (!value.is_empty()).then(|| value.to_string());
            }
            ["DOCS", "OPENAPI_URL"] => config.docs.openapi_url = value.to_string(),
            ["DOCS", "DOCS_URL"] => config.docs.docs_url = value.to_string(),
            ["DOCS", "REDOC_URL"] => config.docs.redoc_url = value.to_string(),

            ["SERIALIZATION", "BY_ALIAS"] => {
                config.serialization.by_alias = parse_bool(key, value)?;
            }
            ["SERIALIZATION", "SCALAR_STYLE"] => {
                config.serialization.scalar_style = match value.to_lowercase().as_str() {
                    "bare" => ScalarStyle::Bare,
                    "wrapped" => ScalarStyle::Wrapped,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'bare' or 'wrapped'",
                        ))
                    }
                };
            }

            ["RESOLVER", "MAX_BODY_SIZE"] => config.resolver.max_body_size = parse_usize(key, value)?,
            ["RESOLVER", "MAX_FIELD_SIZE"] => {
                config.resolver.max_field_size = parse_usize(key, value)?;
            }
            ["RESOLVER", "MAX_FIELDS"] => config.resolver.max_fields = parse_usize(key, value)?,

            ["LOGGING", "ENABLED"] => config.logging.enabled = parse_bool(key, value)?,
            ["LOGGING", "LEVEL"] => config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    "compact" => LogFormat::Compact,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json', 'pretty' or 'compact'",
                        ))
                    }
                };
            }
            ["LOGGING", "SPAN_EVENTS"] => config.logging.span_events = parse_bool(key, value)?,
            ["LOGGING", "FILE_LINE_INFO"] => {
                config.logging.file_line_info = parse_bool(key, value)?;
            }
            ["LOGGING", "INCLUDE_TARGET"] => {
                config.logging.include_target = parse_bool(key, value)?;
            }

            _ => return Err(ConfigError::env_parse_error(key, "unknown configuration key")),
        }
        Ok(())
    }
}

fn merge_values(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(slot) => merge_values(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env_parse_error(key, "expected boolean")),
    }
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}
