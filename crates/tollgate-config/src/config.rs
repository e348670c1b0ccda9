//! Main configuration types.
//!
//! This module provides the top-level [`TollgateConfig`] struct and its builder.

use serde::{Deserialize, Serialize};

use crate::{
    ConfigError, InterceptorsConfig, LogFormat, RouteConfig, TelemetryConfigSection,
};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Complete gateway configuration.
///
/// This is the root configuration type that contains all configuration sections.
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use tollgate_config::TollgateConfig;
///
/// let config = TollgateConfig::default();
/// assert!(config.interceptors.access_log.enabled);
/// assert!(config.routes.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct TollgateConfig {
    /// Telemetry configuration (metrics, logging).
    #[serde(default)]
    pub telemetry: TelemetryConfigSection,

    /// Interceptors registered on the shared pipeline.
    #[serde(default)]
    pub interceptors: InterceptorsConfig,

    /// Route manifest.
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

impl TollgateConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use tollgate_config::{MonitorConfig, TollgateConfig};
    ///
    /// let config = TollgateConfig::builder()
    ///     .monitor(MonitorConfig { platform: "shop".to_string() })
    ///     .build();
    ///
    /// assert_eq!(config.interceptors.monitor.unwrap().platform, "shop");
    /// ```
    #[must_use]
    pub fn builder() -> TollgateConfigBuilder {
        TollgateConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The metrics address is not a socket address
    /// - The log level is not a level or filter directive
    /// - The basic-auth username or monitor platform is empty
    /// - A route has an empty path or handler name
    pub fn validate(&self) -> Result<(), ConfigError> {
        let telemetry = &self.telemetry;

        if let Some(addr) = &telemetry.metrics.addr {
            if addr.parse::<std::net::SocketAddr>().is_err() {
                return Err(ConfigError::invalid_value(
                    "telemetry.metrics.addr",
                    format!("invalid socket address: {addr}"),
                ));
            }
        }

        let level = telemetry.logging.level.trim();
        if !level.contains('=') && !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "telemetry.logging.level",
                format!("expected one of {LOG_LEVELS:?} or a filter directive, got '{level}'"),
            ));
        }

        if let Some(basic_auth) = &self.interceptors.basic_auth {
            if basic_auth.username.trim().is_empty() {
                return Err(ConfigError::invalid_value(
                    "interceptors.basic_auth.username",
                    "must not be empty",
                ));
            }
        }

        if let Some(monitor) = &self.interceptors.monitor {
            if monitor.platform.trim().is_empty() {
                return Err(ConfigError::invalid_value(
                    "interceptors.monitor.platform",
                    "must not be empty",
                ));
            }
        }

        for (index, route) in self.routes.iter().enumerate() {
            if route.path.is_empty() {
                return Err(ConfigError::invalid_value(
                    format!("routes[{index}].path"),
                    "must not be empty",
                ));
            }
            if route.handler.trim().is_empty() {
                return Err(ConfigError::invalid_value(
                    format!("routes[{index}].handler"),
                    "must not be empty",
                ));
            }
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Pretty, colored debug logs with source locations.
    ///
    /// # Example
    ///
    /// ```
    /// use tollgate_config::TollgateConfig;
    ///
    /// let config = TollgateConfig::development();
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = LogFormat::Pretty;
        config.telemetry.logging.ansi_enabled = true;
        config.telemetry.logging.include_location = true;
        config.telemetry.environment = "development".to_string();

        config
    }

    /// Create a production configuration preset.
    ///
    /// JSON info logs and in-process metrics.
    ///
    /// # Example
    ///
    /// ```
    /// use tollgate_config::{LogFormat, TollgateConfig};
    ///
    /// let config = TollgateConfig::production();
    /// assert_eq!(config.telemetry.logging.format, LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = LogFormat::Json;
        config.telemetry.logging.ansi_enabled = false;
        config.telemetry.metrics.enabled = true;
        config.telemetry.environment = "production".to_string();

        config
    }
}

impl TelemetryConfigSection {
    /// Converts this section into the runtime telemetry configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use tollgate_config::TelemetryConfigSection;
    ///
    /// let section = TelemetryConfigSection {
    ///     service_name: "orders".to_string(),
    ///     ..Default::default()
    /// };
    /// let telemetry = section.to_telemetry_config();
    /// assert_eq!(telemetry.logging.service_name, "orders");
    /// assert!(telemetry.logging.json_format);
    /// ```
    #[must_use]
    pub fn to_telemetry_config(&self) -> tollgate_telemetry::TelemetryConfig {
        let logging = tollgate_telemetry::LogConfig {
            enabled: self.logging.enabled,
            level: self.logging.level.clone(),
            json_format: self.logging.format == LogFormat::Json,
            file_line_info: self.logging.include_location,
            ansi: self.logging.ansi_enabled,
            ..tollgate_telemetry::LogConfig::production()
        };
        let metrics = tollgate_telemetry::MetricsConfig {
            enabled: self.metrics.enabled,
            addr: self.metrics.addr.clone(),
            duration_buckets: self.metrics.histogram_buckets.clone(),
        };

        tollgate_telemetry::TelemetryConfig::builder()
            .service_name(&self.service_name)
            .environment(&self.environment)
            .logging(logging)
            .metrics(metrics)
            .build()
    }
}

/// Builder for [`TollgateConfig`].
#[derive(Debug, Default)]
pub struct TollgateConfigBuilder {
    telemetry: Option<TelemetryConfigSection>,
    interceptors: InterceptorsConfig,
    routes: Vec<RouteConfig>,
}

impl TollgateConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the telemetry configuration.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetryConfigSection) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Register the basic-auth interceptor with these credentials.
    #[must_use]
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.interceptors.basic_auth = Some(crate::BasicAuthConfig {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Enable or disable the access log interceptor.
    #[must_use]
    pub fn access_log(mut self, enabled: bool) -> Self {
        self.interceptors.access_log.enabled = enabled;
        self
    }

    /// Register the API monitor interceptor.
    #[must_use]
    pub fn monitor(mut self, monitor: crate::MonitorConfig) -> Self {
        self.interceptors.monitor = Some(monitor);
        self
    }

    /// Append a route to the manifest.
    #[must_use]
    pub fn route(mut self, route: RouteConfig) -> Self {
        self.routes.push(route);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> TollgateConfig {
        TollgateConfig {
            telemetry: self.telemetry.unwrap_or_default(),
            interceptors: self.interceptors,
            routes: self.routes,
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<TollgateConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
