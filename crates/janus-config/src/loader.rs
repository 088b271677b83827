//! Layered configuration loading.
//!
//! Layers apply in order, later ones winning:
//! 1. a preset (`with_defaults`, `with_development`, `with_production`)
//! 2. a TOML or JSON file, or a string
//! 3. environment variables named `PREFIX__SECTION__KEY`

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use janus_core::Format;
use janus_telemetry::LogFormat;

use crate::{ConfigError, JanusConfig};

/// Builds a [`JanusConfig`] from layered sources.
///
/// ```no_run
/// use janus_config::ConfigLoader;
///
/// # fn main() -> Result<(), janus_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_production()
///     .with_optional_file("janus.toml")?
///     .with_env_prefix("JANUS")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: JanusConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Creates a loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets to default values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = JanusConfig::default();
        self
    }

    /// Resets to the development preset.
    ///
    /// ```
    /// use janus_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = JanusConfig::development();
        self
    }

    /// Resets to the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = JanusConfig::production();
        self
    }

    /// Loads a `.toml` or `.json` file, replacing the current values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is missing, unreadable, has an
    /// unknown extension, or does not parse.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        self.config = parse(&content, &extension)?;
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration from a string in `toml` or `json` format.
    ///
    /// ```
    /// use janus_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[render]\ndefault_format = \"xml\"", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    /// assert_eq!(config.render.default_format, janus_core::Format::Xml);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the format is unknown or parsing fails.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, &format.to_lowercase())?;
        Ok(self)
    }

    /// Enables environment overrides under `prefix`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Loads `.env` into the process environment if present.
    ///
    /// # Errors
    ///
    /// Currently infallible; a missing or unreadable `.env` is skipped.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Ok(self)
    }

    /// Applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an override does not parse or the result
    /// fails [`JanusConfig::validate`].
    pub fn load(mut self) -> Result<JanusConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let vars: Vec<(String, String)> = env::vars()
                .filter(|(k, _)| k.starts_with(&prefix))
                .collect();
            for (key, value) in vars {
                self.apply_env_var(&key, &value, &prefix)?;
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> JanusConfig {
        self.config
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let rest = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;
        let parts: Vec<&str> = rest.split("__").collect();

        let config = &mut self.config;
        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => config.server.http_addr = value.to_string(),
            ["SERVER", "REQUEST_TIMEOUT_MS"] => {
                config.server.request_timeout_ms = parse_number(key, value)?;
            }
            ["SERVER", "MAX_BODY_BYTES"] => {
                config.server.max_body_bytes = parse_number(key, value)?;
            }
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                config.server.shutdown_timeout_secs = parse_number(key, value)?;
            }
            ["RENDER", "DEFAULT_FORMAT"] => {
                config.render.default_format = Format::from_str(value)
                    .map_err(|e| ConfigError::env_parse_error(key, e.to_string()))?;
            }
            ["RENDER", "TEMPLATE_DIR"] => {
                config.render.template_dir = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            ["RENDER", "TEMPLATE_EXTENSION"] => {
                config.render.template_extension = value.to_string();
            }
            ["RENDER", "STRICT_MODE"] => config.render.strict_mode = parse_bool(key, value)?,
            ["LOGGING", "ENABLED"] => config.logging.enabled = parse_bool(key, value)?,
            ["LOGGING", "LEVEL"] => config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                config.logging.format = LogFormat::from_str(value)
                    .map_err(|e| ConfigError::env_parse_error(key, e.to_string()))?;
            }
            // Unrelated variables sharing the prefix are left alone.
            _ => {}
        }

        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<JanusConfig, ConfigError> {
    match format {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env_parse_error(key, "expected boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_load() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, JanusConfig::default());
    }

    #[test]
    fn test_toml_string() {
        let toml = r#"
            [server]
            http_addr = "127.0.0.1:3000"
            max_body_bytes = 2048

            [logging]
            format = "pretty"
        "#;
        let config = ConfigLoader::new()
            .with_string(toml, "TOML")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.server.http_addr, "127.0.0.1:3000");
        assert_eq!(config.server.max_body_bytes, 2048);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.render.default_format, Format::Json);
    }

    #[test]
    fn test_json_string() {
        let json = r#"{"render": {"default_format": "yaml", "strict_mode": true}}"#;
        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.render.default_format, Format::Yaml);
        assert!(config.render.strict_mode);
    }

    #[test]
    fn test_unknown_format() {
        let result = ConfigLoader::new().with_string("a: b", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_unknown_field_in_file() {
        let result = ConfigLoader::new().with_string("[server]\nworkers = 4", "toml");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_file_loading() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[server]\nrequest_timeout_ms = 500").unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.server.request_timeout_ms, 500);
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::new().with_file("/definitely/not/janus.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));

        let config = ConfigLoader::new()
            .with_optional_file("/definitely/not/janus.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, JanusConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("JANUS__SERVER__HTTP_ADDR", "127.0.0.1:9000", "JANUS")
            .unwrap();
        loader
            .apply_env_var("JANUS__SERVER__MAX_BODY_BYTES", "4096", "JANUS")
            .unwrap();
        loader
            .apply_env_var("JANUS__RENDER__DEFAULT_FORMAT", "xml", "JANUS")
            .unwrap();
        loader
            .apply_env_var("JANUS__RENDER__STRICT_MODE", "on", "JANUS")
            .unwrap();
        loader
            .apply_env_var("JANUS__LOGGING__FORMAT", "pretty", "JANUS")
            .unwrap();
        loader
            .apply_env_var("JANUS__UNRELATED", "ignored", "JANUS")
            .unwrap();

        let config = loader.load_unvalidated();
        assert_eq!(config.server.http_addr, "127.0.0.1:9000");
        assert_eq!(config.server.max_body_bytes, 4096);
        assert_eq!(config.render.default_format, Format::Xml);
        assert!(config.render.strict_mode);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_env_parse_errors() {
        let mut loader = ConfigLoader::new();
        assert!(loader
            .apply_env_var("JANUS__SERVER__REQUEST_TIMEOUT_MS", "soon", "JANUS")
            .is_err());
        assert!(loader
            .apply_env_var("JANUS__LOGGING__ENABLED", "maybe", "JANUS")
            .is_err());
        assert!(loader
            .apply_env_var("JANUS__RENDER__DEFAULT_FORMAT", "csv", "JANUS")
            .is_err());
        assert!(loader.apply_env_var("JANUSX", "1", "JANUS").is_err());
    }

    #[test]
    fn test_validation_runs_on_load() {
        let result = ConfigLoader::new()
            .with_string("[server]\nhttp_addr = \"nowhere\"", "toml")
            .unwrap()
            .load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
