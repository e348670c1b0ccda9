//! # Tollgate Core
//!
//! Core types shared by every Tollgate crate.
//!
//! - [`Exchange`] - Shared request/response carrier with a one-shot completion sink
//! - [`RequestId`] - UUID v7 request identifier
//! - [`Bindings`] - Per-route binding metadata (route name, auth scheme, extra keys)
//! - [`Verb`] / [`EndpointDescriptor`] - Registration verbs and recorded endpoints
//! - [`StepHandler`] / [`Next`] - Dispatch-step handler and its continuation
//! - [`Params`] - Path parameters captured by the matched route
//! - [`TollgateError`] / [`ChainAbort`] / [`Rejection`] - Error taxonomy

#![doc(html_root_url = "https://docs.rs/tollgate-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bindings;
mod endpoint;
mod error;
mod exchange;
mod handler;
mod params;

pub use bindings::{Bindings, SecurityBinding};
pub use endpoint::{EndpointDescriptor, Verb};
pub use error::{ChainAbort, Rejection, TollgateError, TollgateResult, HOOK_PANIC_CODE};
pub use exchange::{CompletionHook, Exchange, Request, RequestId, Response};
pub use handler::{step_fn, BoxFuture, Next, StepHandler};
pub use params::Params;
