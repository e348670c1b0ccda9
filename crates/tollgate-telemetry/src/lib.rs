//! Structured logging and Prometheus metrics for Tollgate.
//!
//! - **Logging**: `tracing-subscriber` with JSON or pretty output and an
//!   `EnvFilter` level directive
//! - **Metrics**: Prometheus-format metrics via the `metrics` crate
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `tollgate_requests_total` | Counter | `endpoint`, `method`, `status` | Finished requests |
//! | `tollgate_request_duration_seconds` | Histogram | `endpoint`, `method` | Request latency |
//! | `tollgate_chain_aborts_total` | Counter | `hook`, `interceptor` | Aborted interceptor passes |
//!
//! # Example
//!
//! ```rust,ignore
//! use tollgate_telemetry::{TelemetryConfig, init_telemetry};
//!
//! let config = TelemetryConfig::builder()
//!     .service_name("orders-gateway")
//!     .metrics_addr("0.0.0.0:9090")
//!     .build();
//!
//! init_telemetry(&config)?;
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, render_metrics, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;

    ::tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        "Telemetry initialized"
    );
    Ok(())
}
