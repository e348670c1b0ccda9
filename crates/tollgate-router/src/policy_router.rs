//! Policy-aware route registration.
//!
//! A [`PolicyRouter`] sits in front of a [`DispatchPrimitive`]. Every
//! target handler registered through it is wrapped in a [`PipelineProxy`]
//! bound to the router's shared [`HandlerRegistry`], forwarded to the
//! primitive, and recorded in the [`EndpointRegistry`].
//!
//! | Method | Verb recorded |
//! |---|---|
//! | `get`, `put`, `post`, `delete`, `patch`, `options`, `search` | upper-cased verb |
//! | `mount` (the generic `use` registration) | `ALL` |
//! | `all`, `param`, `route` | always fail with `UnsupportedOperation` |

use crate::dispatch::DispatchPrimitive;
use crate::endpoints::EndpointRegistry;
use crate::handlers::HandlerTable;
use std::sync::Arc;
use tollgate_core::{
    Bindings, EndpointDescriptor, StepHandler, TollgateError, TollgateResult, Verb,
};
use tollgate_pipeline::{
    FailureSink, HandlerRegistry, Interceptor, LogFailureSink, PipelineProxy, SharedInterceptor,
};
use tracing::debug;

/// Parses a registration method name (case-insensitive).
///
/// `use` maps to [`Verb::All`].
///
/// # Errors
///
/// Returns [`TollgateError::UnsupportedOperation`] for `all`, `param`, and
/// `route`, and [`TollgateError::InvalidArgument`] for anything else that
/// is not a supported verb.
pub fn parse_registration_method(method: &str) -> TollgateResult<Verb> {
    match method.trim().to_ascii_lowercase().as_str() {
        "get" => Ok(Verb::Get),
        "put" => Ok(Verb::Put),
        "post" => Ok(Verb::Post),
        "delete" => Ok(Verb::Delete),
        "patch" => Ok(Verb::Patch),
        "options" => Ok(Verb::Options),
        "search" => Ok(Verb::Search),
        "use" => Ok(Verb::All),
        "all" => Err(TollgateError::unsupported("all")),
        "param" => Err(TollgateError::unsupported("param")),
        "route" => Err(TollgateError::unsupported("route")),
        _ => Err(TollgateError::invalid_argument(
            "method",
            format!("unknown registration method '{method}'"),
        )),
    }
}

/// Registration facade over a dispatch primitive.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tollgate_core::{step_fn, Bindings, Exchange, Next};
/// use tollgate_pipeline::{AccessLogInterceptor, HandlerRegistry};
/// use tollgate_router::{LayerStack, PolicyRouter};
///
/// let router = PolicyRouter::new(
///     Arc::new(LayerStack::new()),
///     Arc::new(HandlerRegistry::new()),
/// );
/// router.register(AccessLogInterceptor::new());
///
/// let list_users = step_fn(|exchange: Exchange, _next: Next| async move {
///     let _ = exchange.end("[]").await;
/// });
/// router.get("/users", list_users, Bindings::named("listUsers")).unwrap();
///
/// let endpoints = router.endpoints();
/// assert_eq!(endpoints[0].method, "GET");
/// assert_eq!(endpoints[0].name.as_deref(), Some("listUsers"));
/// ```
pub struct PolicyRouter<D: DispatchPrimitive> {
    dispatch: Arc<D>,
    registry: Arc<HandlerRegistry>,
    endpoints: EndpointRegistry,
    sink: Arc<dyn FailureSink>,
}

impl<D: DispatchPrimitive> PolicyRouter<D> {
    /// Creates a router over a dispatch primitive and a shared registry.
    #[must_use]
    pub fn new(dispatch: Arc<D>, registry: Arc<HandlerRegistry>) -> Self {
        Self {
            dispatch,
            registry,
            endpoints: EndpointRegistry::new(),
            sink: Arc::new(LogFailureSink),
        }
    }

    /// Replaces the sink every proxy reports aborted passes to.
    #[must_use]
    pub fn with_failure_sink(mut self, sink: Arc<dyn FailureSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns the dispatch primitive.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<D> {
        &self.dispatch
    }

    /// Returns the shared interceptor registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    /// Registers `handler` for `verb` on `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TollgateError::InvalidArgument`] if `path` is empty.
    /// Nothing is forwarded to the dispatch primitive in that case.
    pub fn add_route(
        &self,
        verb: Verb,
        path: &str,
        handler: StepHandler,
        bindings: Bindings,
    ) -> TollgateResult<()> {
        if path.is_empty() {
            return Err(TollgateError::invalid_argument(
                "path",
                "path must be a non-empty string",
            ));
        }

        let name = bindings.name().map(str::to_string);
        let proxy = PipelineProxy::new(handler, bindings, self.registry.clone())
            .with_failure_sink(self.sink.clone());
        self.dispatch
            .register(verb, path, proxy.into_step_handler());
        self.endpoints
            .record(EndpointDescriptor::new(name.clone(), path, verb));

        debug!(method = %verb, path, route = name.as_deref().unwrap_or("-"), "Route registered");
        Ok(())
    }

    /// Registers a `GET` route.
    ///
    /// # Errors
    ///
    /// See [`add_route`](Self::add_route).
    pub fn get(&self, path: &str, handler: StepHandler, bindings: Bindings) -> TollgateResult<()> {
        self.add_route(Verb::Get, path, handler, bindings)
    }

    /// Registers a `PUT` route.
    ///
    /// # Errors
    ///
    /// See [`add_route`](Self::add_route).
    pub fn put(&self, path: &str, handler: StepHandler, bindings: Bindings) -> TollgateResult<()> {
        self.add_route(Verb::Put, path, handler, bindings)
    }

    /// Registers a `POST` route.
    ///
    /// # Errors
    ///
    /// See [`add_route`](Self::add_route).
    pub fn post(&self, path: &str, handler: StepHandler, bindings: Bindings) -> TollgateResult<()> {
        self.add_route(Verb::Post, path, handler, bindings)
    }

    /// Registers a `DELETE` route.
    ///
    /// # Errors
    ///
    /// See [`add_route`](Self::add_route).
    pub fn delete(
        &self,
        path: &str,
        handler: StepHandler,
        bindings: Bindings,
    ) -> TollgateResult<()> {
        self.add_route(Verb::Delete, path, handler, bindings)
    }

    /// Registers a `PATCH` route.
    ///
    /// # Errors
    ///
    /// See [`add_route`](Self::add_route).
    pub fn patch(&self, path: &str, handler: StepHandler, bindings: Bindings) -> TollgateResult<()> {
        self.add_route(Verb::Patch, path, handler, bindings)
    }

    /// Registers an `OPTIONS` route.
    ///
    /// # Errors
    ///
    /// See [`add_route`](Self::add_route).
    pub fn options(
        &self,
        path: &str,
        handler: StepHandler,
        bindings: Bindings,
    ) -> TollgateResult<()> {
        self.add_route(Verb::Options, path, handler, bindings)
    }

    /// Registers a `SEARCH` route.
    ///
    /// # Errors
    ///
    /// See [`add_route`](Self::add_route).
    pub fn search(
        &self,
        path: &str,
        handler: StepHandler,
        bindings: Bindings,
    ) -> TollgateResult<()> {
        self.add_route(Verb::Search, path, handler, bindings)
    }

    /// Registers a handler for every method under a path prefix (the
    /// generic `use` registration). Recorded with method `ALL`.
    ///
    /// # Errors
    ///
    /// See [`add_route`](Self::add_route).
    pub fn mount(&self, path: &str, handler: StepHandler, bindings: Bindings) -> TollgateResult<()> {
        self.add_route(Verb::All, path, handler, bindings)
    }

    /// Registers a route whose method and handler are given by name, as in
    /// a route manifest.
    ///
    /// # Errors
    ///
    /// Fails like [`parse_registration_method`] for the method, with
    /// [`TollgateError::InvalidArgument`] if `handler` is not in `table`,
    /// and like [`add_route`](Self::add_route) otherwise.
    pub fn add_named_route(
        &self,
        method: &str,
        path: &str,
        handler: &str,
        bindings: Bindings,
        table: &HandlerTable,
    ) -> TollgateResult<()> {
        let verb = parse_registration_method(method)?;
        let handler = table.resolve(handler)?;
        self.add_route(verb, path, handler, bindings)
    }

    /// Not supported: register each verb explicitly.
    ///
    /// # Errors
    ///
    /// Always returns [`TollgateError::UnsupportedOperation`].
    pub fn all(&self, _path: &str, _handler: StepHandler) -> TollgateResult<()> {
        Err(TollgateError::unsupported("all"))
    }

    /// Not supported: path parameters are read from the exchange instead.
    ///
    /// # Errors
    ///
    /// Always returns [`TollgateError::UnsupportedOperation`].
    pub fn param(&self, _name: &str, _handler: StepHandler) -> TollgateResult<()> {
        Err(TollgateError::unsupported("param"))
    }

    /// Not supported: sub-routers cannot be mounted.
    ///
    /// # Errors
    ///
    /// Always returns [`TollgateError::UnsupportedOperation`].
    pub fn route(&self, _path: &str) -> TollgateResult<()> {
        Err(TollgateError::unsupported("route"))
    }

    /// Appends an interceptor to the shared registry.
    pub fn register(&self, interceptor: impl Interceptor) {
        self.registry.add(interceptor);
    }

    /// Appends an already-shared interceptor to the shared registry.
    pub fn register_shared(&self, interceptor: SharedInterceptor) {
        self.registry.add_shared(interceptor);
    }

    /// Removes every interceptor with the given name, returning the count.
    pub fn unregister(&self, name: &str) -> usize {
        self.registry.remove(name)
    }

    /// Returns an independent copy of every registered endpoint.
    #[must_use]
    pub fn endpoints(&self) -> Vec<EndpointDescriptor> {
        self.endpoints.snapshot()
    }
}

impl<D: DispatchPrimitive + std::fmt::Debug> std::fmt::Debug for PolicyRouter<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyRouter")
            .field("dispatch", &self.dispatch)
            .field("registry", &self.registry)
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}
