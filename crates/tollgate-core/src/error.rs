//! Error types for Tollgate.
//!
//! This module provides [`TollgateError`], the error type surfaced by the
//! registration API and the request pipeline, and [`ChainAbort`], the
//! failure produced when an interceptor aborts a pass.
//!
//! # Propagation
//!
//! | Error | Raised by | Surfaced to |
//! |---|---|---|
//! | [`TollgateError::ChainAbort`] | an interceptor signalling failure (or panicking) | the pipeline's failure sink |
//! | [`TollgateError::UnsupportedOperation`] | `all`, `param`, `route` registration | the registration caller |
//! | [`TollgateError::InvalidArgument`] | bad path or unresolvable handler | the registration caller |
//! | [`TollgateError::ResponseAlreadySent`] | finishing a response twice | the code that finished it |
//!
//! None of these escape to crash the process: chain aborts are terminal for
//! the current request only.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`TollgateError`].
pub type TollgateResult<T> = Result<T, TollgateError>;

/// Error code used when an interceptor hook panics instead of signalling.
pub const HOOK_PANIC_CODE: &str = "E_PIPELINE_PANIC";

/// The reason an interceptor gave for failing a pass.
///
/// The field names serialize as `errorCode`, `reason`, and `httpStatus`, so a
/// failing interceptor can write the rejection itself as its terminal
/// response body.
///
/// # Example
///
/// ```
/// use tollgate_core::Rejection;
/// use http::StatusCode;
///
/// let rejection = Rejection::new("E_SECAUTH_0001", "Unauthenticated user")
///     .with_status(StatusCode::UNAUTHORIZED);
///
/// let json = serde_json::to_value(&rejection).unwrap();
/// assert_eq!(json["errorCode"], "E_SECAUTH_0001");
/// assert_eq!(json["httpStatus"], 401);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rejection {
    /// Machine-readable error code.
    pub error_code: String,
    /// Human-readable reason.
    pub reason: String,
    /// HTTP status the interceptor answered with, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
}

impl Rejection {
    /// Creates a rejection with a code and reason.
    #[must_use]
    pub fn new(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            error_code: code.into(),
            reason: reason.into(),
            http_status: None,
        }
    }

    /// Attaches the HTTP status of the terminal response.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.http_status = Some(status.as_u16());
        self
    }

    /// Returns the attached HTTP status, if it is a valid status code.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.http_status
            .and_then(|code| StatusCode::from_u16(code).ok())
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code, self.reason)
    }
}

/// A pass over the interceptor registry was aborted.
///
/// Produced when an interceptor signals failure, or when its hook panics
/// (in which case the rejection code is [`HOOK_PANIC_CODE`]).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("interceptor '{interceptor}' aborted the {hook} pass: {rejection}")]
pub struct ChainAbort {
    /// Name of the interceptor that aborted the pass.
    pub interceptor: String,
    /// The hook that was running (`begin`, `end`, `pre_invoke`, `post_invoke`).
    pub hook: &'static str,
    /// The failure reason.
    pub rejection: Rejection,
}

impl ChainAbort {
    /// Creates a new chain abort.
    #[must_use]
    pub fn new(interceptor: impl Into<String>, hook: &'static str, rejection: Rejection) -> Self {
        Self {
            interceptor: interceptor.into(),
            hook,
            rejection,
        }
    }

    /// Returns true if the abort came from a panicking hook.
    #[must_use]
    pub fn is_panic(&self) -> bool {
        self.rejection.error_code == HOOK_PANIC_CODE
    }
}

/// Standard error type for Tollgate.
#[derive(Debug, Error)]
pub enum TollgateError {
    /// An interceptor aborted a pass.
    #[error(transparent)]
    ChainAbort(#[from] ChainAbort),

    /// The registration method is deliberately not supported.
    #[error("unsupported operation: {operation}")]
    UnsupportedOperation {
        /// The method that was called.
        operation: &'static str,
    },

    /// A registration argument was rejected.
    #[error("invalid argument '{argument}': {message}")]
    InvalidArgument {
        /// The offending argument.
        argument: &'static str,
        /// Why it was rejected.
        message: String,
    },

    /// The response was already finished.
    #[error("response already sent")]
    ResponseAlreadySent,
}

impl TollgateError {
    /// Creates an unsupported operation error.
    #[must_use]
    pub const fn unsupported(operation: &'static str) -> Self {
        Self::UnsupportedOperation { operation }
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(argument: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            message: message.into(),
        }
    }

    /// Returns true if this is an [`TollgateError::UnsupportedOperation`].
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedOperation { .. })
    }

    /// Returns true if this is an [`TollgateError::InvalidArgument`].
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}
