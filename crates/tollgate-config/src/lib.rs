//! Typed configuration for the Tollgate gateway.
//!
//! This crate provides a strongly-typed configuration with support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Overview
//!
//! [`TollgateConfig`] has three sections:
//!
//! - [`TelemetryConfigSection`] - logging and metrics
//! - [`InterceptorsConfig`] - which interceptors the gateway registers
//! - a route manifest of [`RouteConfig`] entries
//!
//! # Example
//!
//! ```no_run
//! use tollgate_config::ConfigLoader;
//!
//! # fn main() -> Result<(), tollgate_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_file("gateway.toml")?
//!     .with_env_prefix("TOLLGATE")
//!     .load()?;
//!
//! println!("{} routes configured", config.routes.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [telemetry]
//! service_name = "orders-gateway"
//! environment = "production"
//!
//! [telemetry.metrics]
//! enabled = true
//! addr = "0.0.0.0:9090"
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//!
//! [interceptors.basic_auth]
//! username = "admin"
//! password = "change-me"
//!
//! [interceptors.access_log]
//! enabled = true
//!
//! [interceptors.monitor]
//! platform = "shop"
//!
//! [[routes]]
//! method = "get"
//! path = "/orders/{id}"
//! handler = "getOrder"
//! bindings = { name = "getOrder", security = { auth = "BasicAuth" } }
//! ```
//!
//! # Environment Variable Overrides
//!
//! Scalar values can be overridden via environment variables using the
//! format `PREFIX__SECTION__KEY`. For example:
//!
//! - `TOLLGATE__TELEMETRY__LOGGING__LEVEL=debug`
//! - `TOLLGATE__INTERCEPTORS__BASIC_AUTH__PASSWORD=secret`
//! - `TOLLGATE__INTERCEPTORS__ACCESS_LOG__ENABLED=false`

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{TollgateConfig, TollgateConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{
    AccessLogConfig, BasicAuthConfig, InterceptorsConfig, LogFormat, LoggingConfig,
    MetricsConfig, MonitorConfig, RouteConfig, TelemetryConfigSection,
};
