//! Gateway assembly errors.

use thiserror::Error;
use tollgate_config::ConfigError;
use tollgate_core::TollgateError;
use tollgate_telemetry::TelemetryError;

/// Errors raised while assembling a [`Gateway`](crate::Gateway).
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A manifest route could not be registered.
    #[error("route {index} ({method} {path}) could not be registered: {source}")]
    Route {
        /// Position in the manifest.
        index: usize,
        /// Registration method as written.
        method: String,
        /// Route path.
        path: String,
        /// Underlying registration error.
        #[source]
        source: TollgateError,
    },

    /// Logging or metrics could not be initialized.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

impl GatewayError {
    /// Returns the registration error of a failed manifest route.
    #[must_use]
    pub const fn route_error(&self) -> Option<&TollgateError> {
        match self {
            Self::Route { source, .. } => Some(source),
            _ => None,
        }
    }
}
