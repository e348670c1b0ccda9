//! Telemetry configuration.

use crate::logging::LogConfig;
use crate::metrics::MetricsConfig;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name (used in logs).
    pub service_name: String,

    /// Environment (production, staging, development).
    pub environment: String,

    /// Metrics configuration.
    pub metrics: MetricsConfig,

    /// Logging configuration.
    pub logging: LogConfig,
}

impl TelemetryConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> TelemetryConfigBuilder {
        TelemetryConfigBuilder::new()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "tollgate".to_string(),
            environment: "development".to_string(),
            metrics: MetricsConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Builder for [`TelemetryConfig`].
#[derive(Debug, Default)]
pub struct TelemetryConfigBuilder {
    service_name: Option<String>,
    environment: Option<String>,
    metrics: Option<MetricsConfig>,
    logging: Option<LogConfig>,
}

impl TelemetryConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the service name.
    #[must_use]
    pub fn service_name(mut self, name: &str) -> Self {
        self.service_name = Some(name.to_string());
        self
    }

    /// Sets the environment.
    #[must_use]
    pub fn environment(mut self, env: &str) -> Self {
        self.environment = Some(env.to_string());
        self
    }

    /// Sets the metrics configuration.
    #[must_use]
    pub fn metrics(mut self, config: MetricsConfig) -> Self {
        self.metrics = Some(config);
        self
    }

    /// Sets the logging configuration.
    #[must_use]
    pub fn logging(mut self, config: LogConfig) -> Self {
        self.logging = Some(config);
        self
    }

    /// Enables metrics and exposes them on the given address.
    #[must_use]
    pub fn metrics_addr(mut self, addr: &str) -> Self {
        let config = self.metrics.take().unwrap_or_default();
        self.metrics = Some(MetricsConfig {
            enabled: true,
            addr: Some(addr.to_string()),
            ..config
        });
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> TelemetryConfig {
        let defaults = TelemetryConfig::default();

        let service_name = self.service_name.unwrap_or(defaults.service_name);
        let environment = self.environment.unwrap_or(defaults.environment);

        let mut logging = self.logging.unwrap_or(defaults.logging);
        logging.service_name = service_name.clone();

        TelemetryConfig {
            service_name,
            environment,
            metrics: self.metrics.unwrap_or(defaults.metrics),
            logging,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "tollgate");
        assert_eq!(config.environment, "development");
        assert!(config.metrics.addr.is_none());
    }

    #[test]
    fn test_builder_propagates_service_name() {
        let config = TelemetryConfig::builder()
            .service_name("orders-gateway")
            .environment("production")
            .build();

        assert_eq!(config.service_name, "orders-gateway");
        assert_eq!(config.environment, "production");
        assert_eq!(config.logging.service_name, "orders-gateway");
    }

    #[test]
    fn test_builder_metrics_addr() {
        let config = TelemetryConfig::builder()
            .metrics(MetricsConfig {
                enabled: false,
                ..MetricsConfig::default()
            })
            .metrics_addr("0.0.0.0:9999")
            .build();

        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.addr.as_deref(), Some("0.0.0.0:9999"));
    }
}
