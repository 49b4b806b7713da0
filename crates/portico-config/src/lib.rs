//! # Portico Config
//!
//! Typed configuration for Portico services:
//! - TOML and JSON files, with unknown fields rejected
//! - `PREFIX__SECTION__KEY` environment overrides and `.env` files
//! - layering, where each document overrides only the keys it names
//!
//! ```no_run
//! use portico_config::ConfigLoader;
//!
//! # fn main() -> Result<(), portico_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_file("portico.toml")?
//!     .with_env_prefix("PORTICO")
//!     .load()?;
//!
//! println!("serving docs at {}", config.docs.docs_url);
//! # Ok(())
//! # }
//! ```
//!
//! ```toml
//! [docs]
//! title = "Inventory"
//! version = "2.1.0"
//! openapi_url = "/openapi.json"
//!
//! [serialization]
//! by_alias = true
//! scalar_style = "bare"
//!
//! [resolver]
//! max_body_size = 1048576
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

#![doc(html_root_url = "https://docs.rs/portico-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;

pub use config::{
    DocsConfig, PorticoConfig, ResolverSettings, ScalarStyle, SerializationConfig,
    DEFAULT_MAX_BODY_SIZE,
};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use portico_telemetry::{LogConfig, LogFormat};
