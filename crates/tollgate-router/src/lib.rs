//! # Tollgate Router
//!
//! Route registration that puts every target handler behind the
//! interceptor pipeline.
//!
//! - [`PolicyRouter`] - the registration surface (`get` .. `search`,
//!   `mount`, `register`/`unregister`, `endpoints`)
//! - [`DispatchPrimitive`] - the seam to whatever matches requests to
//!   handlers
//! - [`LayerStack`] - an in-memory dispatch primitive
//! - [`EndpointRegistry`] - introspection of registered routes
//! - [`HandlerTable`] - named handlers for manifest-driven registration
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use tollgate_core::{step_fn, Bindings, Exchange, Next};
//! use tollgate_pipeline::HandlerRegistry;
//! use tollgate_router::{LayerStack, PolicyRouter};
//!
//! # tokio_test::block_on(async {
//! let stack = Arc::new(LayerStack::new());
//! let router = PolicyRouter::new(stack.clone(), Arc::new(HandlerRegistry::new()));
//!
//! router
//!     .get(
//!         "/users/{id}",
//!         step_fn(|exchange: Exchange, _next: Next| async move {
//!             let _ = exchange.end("alice").await;
//!         }),
//!         Bindings::named("getUser"),
//!     )
//!     .unwrap();
//!
//! let request = http::Request::builder().uri("/users/7").body(Bytes::new()).unwrap();
//! let exchange = stack.dispatch(request).await;
//! assert_eq!(exchange.response().unwrap().body(), &Bytes::from("alice"));
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/tollgate-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod dispatch;
mod endpoints;
mod handlers;
mod pattern;
mod policy_router;

pub use dispatch::{DispatchPrimitive, LayerStack};
pub use endpoints::EndpointRegistry;
pub use handlers::HandlerTable;
pub use tollgate_core::Params;
pub use pattern::PathPattern;
pub use policy_router::{parse_registration_method, PolicyRouter};
