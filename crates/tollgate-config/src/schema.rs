//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use serde::{Deserialize, Serialize};
use tollgate_core::Bindings;

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Enable metrics collection.
    #[serde(default)]
    pub enabled: bool,

    /// Prometheus scrape endpoint address. Without one, metrics are only
    /// available in-process.
    #[serde(default)]
    pub addr: Option<String>,

    /// Histogram bucket boundaries for request duration.
    #[serde(default = "default_histogram_buckets")]
    pub histogram_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: None,
            histogram_buckets: default_histogram_buckets(),
        }
    }
}

fn default_histogram_buckets() -> Vec<f64> {
    vec![
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ]
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or filter directive (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telemetry configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfigSection {
    /// Service name for telemetry identification.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Deployment environment (e.g., "development", "staging", "production").
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TelemetryConfigSection {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            environment: default_environment(),
            metrics: MetricsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_service_name() -> String {
    "tollgate".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

/// Credentials checked by the basic-auth interceptor.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct BasicAuthConfig {
    /// Accepted user name.
    pub username: String,

    /// Accepted password.
    pub password: String,
}

impl std::fmt::Debug for BasicAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Access log interceptor settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AccessLogConfig {
    /// Register the access log interceptor.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for AccessLogConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// API monitor interceptor settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    /// Platform name stamped on every trace event.
    pub platform: String,
}

/// Which interceptors the gateway registers.
///
/// Registration order is fixed: basic auth, access log, monitor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct InterceptorsConfig {
    /// Basic auth. Absent means not registered.
    #[serde(default)]
    pub basic_auth: Option<BasicAuthConfig>,

    /// Access log.
    #[serde(default)]
    pub access_log: AccessLogConfig,

    /// API monitor. Absent means not registered.
    #[serde(default)]
    pub monitor: Option<MonitorConfig>,
}

/// One entry of the route manifest.
///
/// ```toml
/// [[routes]]
/// method = "get"
/// path = "/users/{id}"
/// handler = "getUser"
/// bindings = { name = "getUser", security = { auth = "BasicAuth" } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    /// Registration method (`get`, `put`, `post`, `delete`, `patch`,
    /// `options`, `search`, or `use`).
    pub method: String,

    /// Route path.
    pub path: String,

    /// Name of the handler to resolve.
    pub handler: String,

    /// Route bindings.
    #[serde(default)]
    pub bindings: Bindings,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_config_default() {
        let config = MetricsConfig::default();
        assert!(!config.enabled);
        assert!(config.addr.is_none());
        assert!(!config.histogram_buckets.is_empty());
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_log_format_deserialize() {
        let format: LogFormat = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(format, LogFormat::Json);

        let format: LogFormat = serde_json::from_str(r#""pretty""#).unwrap();
        assert_eq!(format, LogFormat::Pretty);
    }

    #[test]
    fn test_telemetry_config_default() {
        let config = TelemetryConfigSection::default();
        assert_eq!(config.service_name, "tollgate");
        assert_eq!(config.environment, "development");
    }

    #[test]
    fn test_interceptors_default_registers_access_log_only() {
        let config = InterceptorsConfig::default();
        assert!(config.basic_auth.is_none());
        assert!(config.access_log.enabled);
        assert!(config.monitor.is_none());
    }

    #[test]
    fn test_basic_auth_debug_hides_password() {
        let config = BasicAuthConfig {
            username: "admin".to_string(),
            password: "s3cret".to_string(),
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("admin"));
        assert!(!debug.contains("s3cret"));
    }

    #[test]
    fn test_route_config_deserialize() {
        let toml = r#"
            method = "get"
            path = "/users/{id}"
            handler = "getUser"
            bindings = { name = "getUser", security = { auth = "BasicAuth" }, tier = "gold" }
        "#;
        let route: RouteConfig = toml::from_str(toml).unwrap();
        assert_eq!(route.method, "get");
        assert_eq!(route.bindings.name(), Some("getUser"));
        assert_eq!(route.bindings.auth_scheme(), Some("BasicAuth"));
        assert_eq!(
            route.bindings.get("tier"),
            Some(&serde_json::Value::from("gold"))
        );
    }

    #[test]
    fn test_route_config_unknown_field_rejected() {
        let toml = r#"
            method = "get"
            path = "/"
            handler = "root"
            verb = "GET"
        "#;
        let result: Result<RouteConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }
}
