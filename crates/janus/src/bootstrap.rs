//! Startup helpers tying configuration to the adapters.

use janus_config::{ConfigError, JanusConfig};
use janus_hyper::ServerBuilder;
use janus_telemetry::{LogConfig, TelemetryResult};

/// Installs the global subscriber described by `config.logging`.
///
/// # Errors
///
/// Fails if a subscriber is already installed or the level is invalid.
pub fn init_logging(config: &JanusConfig) -> TelemetryResult<()> {
    janus_telemetry::init_logging(&LogConfig::from(&config.logging))
}

/// Prepares a hyper server from configuration, loading templates.
///
/// # Errors
///
/// Fails if the configured template directory cannot be loaded.
pub fn hyper_server(config: &JanusConfig) -> Result<ServerBuilder, ConfigError> {
    let adapter = config.adapter_config()?;
    Ok(janus_hyper::Server::builder()
        .http_addr(config.server.http_addr.clone())
        .adapter_config(adapter)
        .request_timeout(config.server.request_timeout())
        .shutdown_timeout(config.server.shutdown_timeout()))
}
