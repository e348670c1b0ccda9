//! Prometheus metrics for Tollgate.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `tollgate_requests_total` | Counter | `endpoint`, `method`, `status` | Finished requests |
//! | `tollgate_request_duration_seconds` | Histogram | `endpoint`, `method` | Request latency |
//! | `tollgate_chain_aborts_total` | Counter | `hook`, `interceptor` | Aborted interceptor passes |
//!
//! The recording helpers are no-ops until a recorder is installed, so the
//! pipeline can call them unconditionally.
//!
//! # Example
//!
//! ```rust,ignore
//! use tollgate_telemetry::metrics::record_request;
//! use std::time::Duration;
//!
//! record_request("listUsers", "GET", 200, Duration::from_millis(45));
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

/// Finished-request counter.
pub const REQUESTS_TOTAL: &str = "tollgate_requests_total";

/// Request latency histogram.
pub const REQUEST_DURATION_SECONDS: &str = "tollgate_request_duration_seconds";

/// Aborted-pass counter.
pub const CHAIN_ABORTS_TOTAL: &str = "tollgate_chain_aborts_total";

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Address to serve `/metrics` on (e.g., "0.0.0.0:9090").
    ///
    /// When unset, the recorder is installed without a listener and metrics
    /// are read through [`render_metrics`].
    pub addr: Option<String>,

    /// Histogram buckets for request duration.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: None,
            // 1ms .. 10s
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

/// Initializes the metrics subsystem.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` if the listener address does
/// not parse, or `TelemetryError::MetricsInit` if a recorder is already
/// installed or the exporter cannot be built.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    match &config.addr {
        Some(addr) => {
            let addr: SocketAddr = addr
                .parse()
                .map_err(|e| TelemetryError::InvalidAddress(format!("{addr}: {e}")))?;
            builder
                .with_http_listener(addr)
                .install()
                .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
        }
        None => {
            let handle = builder
                .install_recorder()
                .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
            let _ = METRICS_HANDLE.set(handle);
        }
    }

    register_metric_descriptions();
    Ok(())
}

/// Renders metrics in Prometheus format.
///
/// Returns `None` unless metrics were initialized without a listener.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(REQUESTS_TOTAL, "Total number of finished requests");
    describe_histogram!(REQUEST_DURATION_SECONDS, "Request duration in seconds");
    describe_counter!(
        CHAIN_ABORTS_TOTAL,
        "Interceptor passes aborted by a failing or panicking hook"
    );
}

/// Records a finished request.
///
/// Updates `tollgate_requests_total` and `tollgate_request_duration_seconds`.
///
/// # Arguments
///
/// * `endpoint` - The route name from the bindings (e.g., "listUsers")
/// * `method` - The request method
/// * `status_code` - HTTP status code of the response
/// * `duration` - Time from request arrival to response completion
pub fn record_request(endpoint: &str, method: &str, status_code: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "endpoint" => endpoint.to_string(),
        "method" => method.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(
        REQUEST_DURATION_SECONDS,
        "endpoint" => endpoint.to_string(),
        "method" => method.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Records an aborted interceptor pass.
pub fn record_chain_abort(hook: &str, interceptor: &str) {
    counter!(
        CHAIN_ABORTS_TOTAL,
        "hook" => hook.to_string(),
        "interceptor" => interceptor.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert!(config.addr.is_none());
        assert_eq!(config.duration_buckets.len(), 12);
    }

    #[test]
    fn test_record_functions_dont_panic() {
        // No recorder installed: the macros are no-ops.
        record_request("listUsers", "GET", 200, Duration::from_millis(10));
        record_chain_abort("pre_invoke", "BasicAuth");
    }

    #[test]
    fn test_disabled_metrics_skip_install() {
        let config = MetricsConfig {
            enabled: false,
            ..MetricsConfig::default()
        };
        assert!(init_metrics(&config).is_ok());
    }

    #[test]
    fn test_invalid_address_is_rejected() {
        let config = MetricsConfig {
            addr: Some("not an address".to_string()),
            ..MetricsConfig::default()
        };
        let err = init_metrics(&config).unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidAddress(_)));
    }
}
