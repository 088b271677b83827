//! Typed configuration for Janus services.
//!
//! Values load in layers (preset, file, environment) into a
//! [`JanusConfig`], which validates itself and produces the
//! [`AdapterConfig`](janus_core::AdapterConfig) every transport adapter
//! shares.
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! request_timeout_ms = 30000
//! max_body_bytes = 1048576
//! shutdown_timeout_secs = 30
//!
//! [render]
//! default_format = "json"
//! template_dir = "templates"
//! template_extension = "hbs"
//! strict_mode = false
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ```
//!
//! Every key can be overridden as `JANUS__SECTION__KEY`, e.g.
//! `JANUS__RENDER__DEFAULT_FORMAT=yaml`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::JanusConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{LoggingConfig, RenderConfig, ServerConfig};
