//! # Tollgate
//!
//! **Interceptor pipeline for HTTP routes**
//!
//! Tollgate wraps every registered route handler in a proxy that drives a
//! shared, ordered list of interceptors through four hooks:
//!
//! - `begin` - once per request, in registration order, before the first proxied step
//! - `pre_invoke` - before every proxied step, in registration order
//! - `post_invoke` - after every proxied step, in reverse order
//! - `end` - once per request, in reverse order, when the response is finished
//!
//! Any hook may stop its own pass or fail it, and a failed pass keeps the
//! target handler from running.
//!
//! ## Architecture
//!
//! ```text
//! Request → LayerStack → PipelineProxy ─┬─ begin (first step only) → pre_invoke → target
//!                                       │                                          ↓ next
//!                                       └─ ... next step ...     ←  post_invoke ←──┘
//! Response finished → post_invoke (unsettled step) → end
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use bytes::Bytes;
//! use tollgate::prelude::*;
//! use tollgate::{ConfigLoader, Gateway};
//!
//! # tokio_test::block_on(async {
//! let config = ConfigLoader::new()
//!     .with_string(
//!         r#"
//!         [interceptors.basic_auth]
//!         username = "admin"
//!         password = "secret"
//!
//!         [[routes]]
//!         method = "get"
//!         path = "/orders"
//!         handler = "listOrders"
//!         bindings = { name = "listOrders", security = { auth = "BasicAuth" } }
//!         "#,
//!         "toml",
//!     )
//!     .unwrap()
//!     .load()
//!     .unwrap();
//!
//! let gateway = Gateway::builder(config)
//!     .handler(
//!         "listOrders",
//!         step_fn(|exchange: Exchange, _next: Next| async move {
//!             let _ = exchange.end("[]").await;
//!         }),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let request = http::Request::builder().uri("/orders").body(Bytes::new()).unwrap();
//! let exchange = gateway.dispatch(request).await;
//! assert_eq!(exchange.status(), http::StatusCode::UNAUTHORIZED);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/tollgate/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod gateway;

pub use error::GatewayError;
pub use gateway::{init_telemetry, Gateway, GatewayBuilder};

// Re-export core types
pub use tollgate_core as core;

// Re-export pipeline types
pub use tollgate_pipeline as pipeline;

// Re-export router types
pub use tollgate_router as router;

// Re-export telemetry
pub use tollgate_telemetry as telemetry;

// Re-export configuration
pub use tollgate_config as config;
pub use tollgate_config::{ConfigLoader, TollgateConfig};

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use tollgate::prelude::*;
/// ```
pub mod prelude {
    pub use tollgate_core::{
        step_fn, Bindings, BoxFuture, EndpointDescriptor, Exchange, Next, Rejection, RequestId,
        StepHandler, TollgateError, TollgateResult, Verb,
    };

    pub use tollgate_pipeline::{
        ready, FailureSink, HandlerRegistry, Hook, Interceptor, PipelineProxy, RequestContext,
        Signal,
    };

    pub use tollgate_pipeline::{
        AccessLogInterceptor, ApiMonitorInterceptor, BasicAuthInterceptor, MonitorSink,
        TraceEvent,
    };

    pub use tollgate_router::{DispatchPrimitive, HandlerTable, LayerStack, PolicyRouter};
}
