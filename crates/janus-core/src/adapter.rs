//! Startup configuration shared by every context an adapter creates.

use std::sync::Arc;

use http::StatusCode;

use crate::render::TemplateRegistry;
use crate::Format;

/// Default request body limit (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Read-only settings handed to a transport adapter at startup.
///
/// Cloning is cheap; the template registry is shared.
///
/// ```
/// use janus_core::{AdapterConfig, Format};
/// use http::StatusCode;
///
/// let config = AdapterConfig::new()
///     .with_default_format(Format::Yaml)
///     .with_default_status(StatusCode::CREATED);
///
/// assert_eq!(config.default_format(), Format::Yaml);
/// assert_eq!(config.default_status(), Some(StatusCode::CREATED));
/// ```
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    templates: Option<Arc<TemplateRegistry>>,
    default_format: Format,
    default_status: Option<StatusCode>,
    max_body_bytes: usize,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            templates: None,
            default_format: Format::Json,
            default_status: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl AdapterConfig {
    /// Creates a configuration with no templates, JSON as the default
    /// format and a 1 MiB body limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the template registry.
    #[must_use]
    pub fn with_templates(mut self, templates: impl Into<Arc<TemplateRegistry>>) -> Self {
        self.templates = Some(templates.into());
        self
    }

    /// Sets the format used when the `Accept` header does not decide.
    #[must_use]
    pub fn with_default_format(mut self, format: Format) -> Self {
        self.default_format = format;
        self
    }

    /// Sets the status used when a handler sets none (e.g. `201` on create
    /// routes).
    #[must_use]
    pub fn with_default_status(mut self, status: StatusCode) -> Self {
        self.default_status = Some(status);
        self
    }

    /// Sets the request body limit in bytes.
    #[must_use]
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Returns the template registry, if configured.
    #[must_use]
    pub fn templates(&self) -> Option<&TemplateRegistry> {
        self.templates.as_deref()
    }

    /// Returns the default format.
    #[must_use]
    pub fn default_format(&self) -> Format {
        self.default_format
    }

    /// Returns the default status.
    #[must_use]
    pub fn default_status(&self) -> Option<StatusCode> {
        self.default_status
    }

    /// Returns the request body limit in bytes.
    #[must_use]
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }
}
