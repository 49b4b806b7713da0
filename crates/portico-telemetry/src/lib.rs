//! # Portico Telemetry
//!
//! Logging setup and metric helpers for Portico.
//!
//! - [`init_logging`] installs a `tracing-subscriber` registry with an
//!   env filter and a JSON, pretty or compact `fmt` layer.
//! - [`metrics`] records Portico's counters through the `metrics` facade.
//!   No exporter is installed; hosts bring their own recorder.

#![doc(html_root_url = "https://docs.rs/portico-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
