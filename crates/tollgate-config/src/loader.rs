//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, and environment variables.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use crate::{
    AccessLogConfig, BasicAuthConfig, ConfigError, LogFormat, MonitorConfig, TollgateConfig,
};

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values (built into the code)
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use tollgate_config::ConfigLoader;
///
/// # fn main() -> Result<(), tollgate_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("gateway.toml")?
///     .with_env_prefix("TOLLGATE")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: TollgateConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: TollgateConfig::default(),
            env_prefix: None,
        }
    }

    /// Start with default configuration values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = TollgateConfig::default();
        self
    }

    /// Start with development preset configuration.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = TollgateConfig::development();
        self
    }

    /// Start with production preset configuration.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = TollgateConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// Supports TOML (.toml) and JSON (.json) formats, chosen by extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format (`toml` or
    /// `json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or the format is unknown.
    ///
    /// # Example
    ///
    /// ```
    /// use tollgate_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [interceptors.monitor]
    ///     platform = "shop"
    ///
    ///     [[routes]]
    ///     method = "get"
    ///     path = "/orders"
    ///     handler = "listOrders"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.interceptors.monitor.unwrap().platform, "shop");
    /// assert_eq!(config.routes[0].handler, "listOrders");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Environment variables use the format `PREFIX__SECTION__KEY`.
    /// For example, with prefix "TOLLGATE":
    /// - `TOLLGATE__TELEMETRY__LOGGING__LEVEL=debug`
    /// - `TOLLGATE__INTERCEPTORS__MONITOR__PLATFORM=shop`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file into the process environment, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a `.env` file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::validation_error(format!(
                "failed to load .env file: {e}"
            ))),
        }
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies environment variable overrides (if a prefix was set) and
    /// validates the final configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override cannot be parsed or validation
    /// fails.
    pub fn load(self) -> Result<TollgateConfig, ConfigError> {
        let config = self.load_unvalidated_with_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Finalize without applying environment overrides or validating.
    #[must_use]
    pub fn load_unvalidated(self) -> TollgateConfig {
        self.config
    }

    fn load_unvalidated_with_env(mut self) -> Result<TollgateConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let vars: BTreeMap<String, String> = env::vars()
                .filter(|(k, _)| k.starts_with(&prefix))
                .collect();
            self.apply_env_overrides(&prefix, &vars)?;
        }
        Ok(self.config)
    }

    fn parse_file(content: &str, path: &Path) -> Result<TollgateConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    fn apply_env_overrides(
        &mut self,
        prefix: &str,
        vars: &BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        for (key, value) in vars {
            self.apply_env_var(key, value, prefix)?;
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(key_without_prefix) = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
        else {
            // Shares the prefix but not the separator (TOLLGATEWAY_...).
            return Ok(());
        };

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["TELEMETRY", "SERVICE_NAME"] => {
                config.telemetry.service_name = value.to_string();
            }
            ["TELEMETRY", "ENVIRONMENT"] => {
                config.telemetry.environment = value.to_string();
            }

            ["TELEMETRY", "METRICS", "ENABLED"] => {
                config.telemetry.metrics.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["TELEMETRY", "METRICS", "ADDR"] => {
                config.telemetry.metrics.addr = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }

            ["TELEMETRY", "LOGGING", "ENABLED"] => {
                config.telemetry.logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["TELEMETRY", "LOGGING", "LEVEL"] => {
                config.telemetry.logging.level = value.to_string();
            }
            ["TELEMETRY", "LOGGING", "FORMAT"] => {
                config.telemetry.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["TELEMETRY", "LOGGING", "ANSI_ENABLED"] => {
                config.telemetry.logging.ansi_enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["TELEMETRY", "LOGGING", "INCLUDE_LOCATION"] => {
                config.telemetry.logging.include_location = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            ["INTERCEPTORS", "BASIC_AUTH", "USERNAME"] => {
                config
                    .interceptors
                    .basic_auth
                    .get_or_insert_with(BasicAuthConfig::default)
                    .username = value.to_string();
            }
            ["INTERCEPTORS", "BASIC_AUTH", "PASSWORD"] => {
                config
                    .interceptors
                    .basic_auth
                    .get_or_insert_with(BasicAuthConfig::default)
                    .password = value.to_string();
            }
            ["INTERCEPTORS", "ACCESS_LOG", "ENABLED"] => {
                config.interceptors.access_log = AccessLogConfig {
                    enabled: parse_bool(value)
                        .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?,
                };
            }
            ["INTERCEPTORS", "MONITOR", "PLATFORM"] => {
                config.interceptors.monitor = Some(MonitorConfig {
                    platform: value.to_string(),
                });
            }

            // Routes are file-only.
            _ => {}
        }

        Ok(())
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
