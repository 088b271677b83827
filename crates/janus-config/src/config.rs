//! Root configuration type.

use janus_core::{AdapterConfig, Format, TemplateRegistry};
use janus_telemetry::{create_env_filter, LogFormat};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, LoggingConfig, RenderConfig, ServerConfig};

/// Complete configuration of a Janus service.
///
/// ```
/// use janus_config::JanusConfig;
///
/// let config = JanusConfig::default();
/// assert!(config.validate().is_ok());
/// assert!(config.render.template_dir.is_none());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct JanusConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Rendering and negotiation settings.
    #[serde(default)]
    pub render: RenderConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl JanusConfig {
    /// Pretty `debug` logs, strict templates.
    #[must_use]
    pub fn development() -> Self {
        Self {
            render: RenderConfig {
                strict_mode: true,
                ..RenderConfig::default()
            },
            logging: LoggingConfig {
                enabled: true,
                level: "debug".to_string(),
                format: LogFormat::Pretty,
            },
            ..Self::default()
        }
    }

    /// JSON `info` logs.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Checks values that deserialization alone cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }

        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }

        if self.render.template_extension.trim_start_matches('.').is_empty() {
            return Err(ConfigError::invalid_value(
                "render.template_extension",
                "must not be empty",
            ));
        }

        if self.render.default_format == Format::Html && self.render.template_dir.is_none() {
            return Err(ConfigError::invalid_value(
                "render.default_format",
                "html requires render.template_dir",
            ));
        }

        if let Err(err) = create_env_filter(&self.logging.level) {
            return Err(ConfigError::invalid_value("logging.level", err.to_string()));
        }

        Ok(())
    }

    /// Builds the adapter configuration, loading templates if a directory
    /// is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Templates`] if the template directory cannot
    /// be loaded.
    pub fn adapter_config(&self) -> Result<AdapterConfig, ConfigError> {
        let config = AdapterConfig::new()
            .with_default_format(self.render.default_format)
            .with_max_body_bytes(self.server.max_body_bytes);

        let Some(dir) = &self.render.template_dir else {
            return Ok(config);
        };

        let registry = TemplateRegistry::builder()
            .strict_mode(self.render.strict_mode)
            .extension(&self.render.template_extension)
            .directory(dir)
            .map_err(ConfigError::Templates)?
            .build();

        Ok(config.with_templates(registry))
    }
}
