//! # Tollgate Pipeline
//!
//! Request-lifecycle interceptors for dispatch-step based HTTP routing.
//!
//! Each route's target handler is wrapped in a [`PipelineProxy`]. Every
//! proxy shares one [`HandlerRegistry`], an ordered list of
//! [`Interceptor`]s, and walks it with a [`ChainInvoker`]:
//!
//! ```text
//!            first step only          every step
//! request ──► begin (forward) ──► pre_invoke (forward) ──► target
//!                                                           │
//!                    post_invoke (backward) ◄── advance ────┤
//!                                                           │
//!   end (backward) ◄── post_invoke if still owed ◄── response finished
//! ```
//!
//! Interceptors answer each hook with a [`Signal`]: `Continue`, `Stop` (skip
//! the rest of the pass) or `Fail` (abort the pass and everything after it).
//! A [`CompletionGuard`] attached to the exchange makes `begin` and `end`
//! run once per response, however many proxied steps it passes through.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use tollgate_core::{step_fn, Bindings, Exchange, Next};
//! use tollgate_pipeline::{AccessLogInterceptor, HandlerRegistry, PipelineProxy};
//!
//! let registry = Arc::new(HandlerRegistry::new());
//! registry.add(AccessLogInterceptor::new());
//!
//! let target = step_fn(|exchange: Exchange, _next: Next| async move {
//!     let _ = exchange.end("ok").await;
//! });
//! let handler = PipelineProxy::new(target, Bindings::named("health"), registry)
//!     .into_step_handler();
//! # let _ = handler;
//! ```

#![doc(html_root_url = "https://docs.rs/tollgate-pipeline/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod context;
pub mod guard;
pub mod interceptor;
pub mod interceptors;
pub mod proxy;
pub mod registry;
pub mod sink;

pub use chain::ChainInvoker;
pub use context::RequestContext;
pub use guard::CompletionGuard;
pub use interceptor::{ready, Direction, Hook, Interceptor, Signal};
pub use interceptors::{
    AccessLogInterceptor, ApiMonitorInterceptor, BasicAuthInterceptor, ChannelMonitorSink,
    LogMonitorSink, MonitorSink, TraceEvent,
};
pub use proxy::PipelineProxy;
pub use registry::{HandlerRegistry, SharedInterceptor};
pub use sink::{FailureSink, LogFailureSink};

pub use tollgate_core::BoxFuture;
