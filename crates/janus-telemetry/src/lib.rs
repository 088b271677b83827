//! Logging for Janus services.
//!
//! Janus logs through `tracing`. This crate installs the subscriber: JSON
//! lines for production, pretty output for development, filtered by an
//! `EnvFilter` directive such as `info` or `janus_core=debug,hyper=warn`.
//!
//! ```rust,ignore
//! use janus_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(request_id = %id, "request handled");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
