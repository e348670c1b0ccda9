//! The composition root: one shared interceptor registry, one router, and
//! the routes of a manifest.

use crate::GatewayError;
use std::sync::Arc;
use tollgate_config::{InterceptorsConfig, TollgateConfig};
use tollgate_core::{EndpointDescriptor, Exchange, Request, StepHandler};
use tollgate_pipeline::{
    AccessLogInterceptor, ApiMonitorInterceptor, BasicAuthInterceptor, FailureSink,
    HandlerRegistry, LogMonitorSink, MonitorSink,
};
use tollgate_router::{HandlerTable, LayerStack, PolicyRouter};
use tracing::info;

/// Initializes logging and metrics from the telemetry section.
///
/// Call once per process, before building a gateway.
///
/// # Errors
///
/// Returns [`GatewayError::Telemetry`] if a subscriber or recorder is
/// already installed or the metrics address cannot be bound.
pub fn init_telemetry(config: &TollgateConfig) -> Result<(), GatewayError> {
    tollgate_telemetry::init_telemetry(&config.telemetry.to_telemetry_config())?;
    Ok(())
}

/// Builder for [`Gateway`].
pub struct GatewayBuilder {
    config: TollgateConfig,
    handlers: HandlerTable,
    monitor_sink: Option<Arc<dyn MonitorSink>>,
    failure_sink: Option<Arc<dyn FailureSink>>,
}

impl GatewayBuilder {
    /// Creates a builder for the given configuration.
    #[must_use]
    pub fn new(config: TollgateConfig) -> Self {
        Self {
            config,
            handlers: HandlerTable::new(),
            monitor_sink: None,
            failure_sink: None,
        }
    }

    /// Makes a handler available to the route manifest under `name`.
    #[must_use]
    pub fn handler(mut self, name: impl Into<String>, handler: StepHandler) -> Self {
        self.handlers.insert(name, handler);
        self
    }

    /// Replaces the handler table.
    #[must_use]
    pub fn handlers(mut self, handlers: HandlerTable) -> Self {
        self.handlers = handlers;
        self
    }

    /// Sets where closed monitor events go. Defaults to [`LogMonitorSink`].
    #[must_use]
    pub fn monitor_sink(mut self, sink: Arc<dyn MonitorSink>) -> Self {
        self.monitor_sink = Some(sink);
        self
    }

    /// Sets where aborted interceptor passes are reported.
    #[must_use]
    pub fn failure_sink(mut self, sink: Arc<dyn FailureSink>) -> Self {
        self.failure_sink = Some(sink);
        self
    }

    /// Validates the configuration, registers the configured interceptors,
    /// and registers every manifest route.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if validation fails and
    /// [`GatewayError::Route`] for the first manifest route that cannot be
    /// registered.
    pub fn build(self) -> Result<Gateway, GatewayError> {
        self.config.validate()?;

        let registry = Arc::new(HandlerRegistry::new());
        let monitor_sink = self
            .monitor_sink
            .unwrap_or_else(|| Arc::new(LogMonitorSink));
        register_interceptors(&registry, &self.config.interceptors, monitor_sink);

        let stack = Arc::new(LayerStack::new());
        let mut router = PolicyRouter::new(stack.clone(), registry);
        if let Some(sink) = self.failure_sink {
            router = router.with_failure_sink(sink);
        }

        for (index, route) in self.config.routes.iter().enumerate() {
            router
                .add_named_route(
                    &route.method,
                    &route.path,
                    &route.handler,
                    route.bindings.clone(),
                    &self.handlers,
                )
                .map_err(|source| GatewayError::Route {
                    index,
                    method: route.method.clone(),
                    path: route.path.clone(),
                    source,
                })?;
        }

        info!(
            interceptors = ?router.registry().names(),
            routes = self.config.routes.len(),
            "Gateway assembled"
        );

        Ok(Gateway { stack, router })
    }
}

impl std::fmt::Debug for GatewayBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayBuilder")
            .field("config", &self.config)
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}

fn register_interceptors(
    registry: &HandlerRegistry,
    interceptors: &InterceptorsConfig,
    monitor_sink: Arc<dyn MonitorSink>,
) {
    if let Some(basic_auth) = &interceptors.basic_auth {
        registry.add(BasicAuthInterceptor::new(
            basic_auth.username.clone(),
            basic_auth.password.clone(),
        ));
    }
    if interceptors.access_log.enabled {
        registry.add(AccessLogInterceptor::new());
    }
    if let Some(monitor) = &interceptors.monitor {
        registry.add(ApiMonitorInterceptor::new(
            monitor.platform.clone(),
            monitor_sink,
        ));
    }
}

/// An assembled gateway.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use tollgate::prelude::*;
/// use tollgate::{Gateway, TollgateConfig};
///
/// # tokio_test::block_on(async {
/// let config = TollgateConfig::builder().access_log(false).build();
/// let gateway = Gateway::builder(config).build().unwrap();
///
/// gateway
///     .router()
///     .get(
///         "/ping",
///         step_fn(|exchange: Exchange, _next: Next| async move {
///             let _ = exchange.end("pong").await;
///         }),
///         Bindings::named("ping"),
///     )
///     .unwrap();
///
/// let request = http::Request::builder().uri("/ping").body(Bytes::new()).unwrap();
/// let exchange = gateway.dispatch(request).await;
/// assert_eq!(exchange.response().unwrap().body(), &Bytes::from("pong"));
/// # });
/// ```
#[derive(Debug)]
pub struct Gateway {
    stack: Arc<LayerStack>,
    router: PolicyRouter<LayerStack>,
}

impl Gateway {
    /// Starts building a gateway.
    #[must_use]
    pub fn builder(config: TollgateConfig) -> GatewayBuilder {
        GatewayBuilder::new(config)
    }

    /// Returns the router, for registering routes or interceptors after
    /// assembly.
    #[must_use]
    pub fn router(&self) -> &PolicyRouter<LayerStack> {
        &self.router
    }

    /// Returns the shared interceptor registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        self.router.registry()
    }

    /// Returns a copy of every registered endpoint.
    #[must_use]
    pub fn endpoints(&self) -> Vec<EndpointDescriptor> {
        self.router.endpoints()
    }

    /// Dispatches a request through the registered routes.
    pub async fn dispatch(&self, request: Request) -> Exchange {
        self.stack.dispatch(request).await
    }

    /// Dispatches an existing exchange.
    pub async fn handle(&self, exchange: Exchange) {
        self.stack.handle(exchange).await;
    }
}
