//! Configuration sections.

use std::path::PathBuf;
use std::time::Duration;

use janus_core::{Format, DEFAULT_MAX_BODY_BYTES};
use janus_telemetry::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};

/// HTTP server section.
///
/// ```
/// use janus_config::ServerConfig;
///
/// let server = ServerConfig::default();
/// assert_eq!(server.http_addr, "0.0.0.0:8080");
/// assert_eq!(server.max_body_bytes, 1024 * 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address, e.g. `0.0.0.0:8080`.
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Request body limit in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Grace period for in-flight requests on shutdown, in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            request_timeout_ms: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl ServerConfig {
    /// Request timeout as a duration.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Shutdown grace period as a duration.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_request_timeout() -> u64 {
    30_000
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

fn default_shutdown_timeout() -> u64 {
    30
}

/// Response rendering section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    /// Format used when `Accept` does not decide.
    #[serde(default)]
    pub default_format: Format,

    /// Directory of templates. No registry is built when unset.
    #[serde(default)]
    pub template_dir: Option<PathBuf>,

    /// Extension of template files.
    #[serde(default = "default_template_extension")]
    pub template_extension: String,

    /// Fail rendering on missing template fields.
    #[serde(default)]
    pub strict_mode: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            default_format: Format::Json,
            template_dir: None,
            template_extension: default_template_extension(),
            strict_mode: false,
        }
    }
}

fn default_template_extension() -> String {
    "hbs".to_string()
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Install a subscriber.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// `EnvFilter` directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::Json,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl From<&LoggingConfig> for LogConfig {
    fn from(logging: &LoggingConfig) -> Self {
        let preset = match logging.format {
            LogFormat::Json => Self::production(),
            LogFormat::Pretty => Self::development(),
        };
        Self {
            enabled: logging.enabled,
            level: logging.level.clone(),
            format: logging.format,
            ..preset
        }
    }
}
