//! The per-hook view of a request.

use std::sync::Arc;
use tollgate_core::{Bindings, Exchange, RequestId, StepHandler};

/// What an interceptor hook sees.
///
/// Lifecycle hooks (`begin`, `end`) get the exchange and the bindings of the
/// route that owns the lifecycle. Step hooks (`pre_invoke`, `post_invoke`)
/// additionally get the step's target handler.
#[derive(Clone)]
pub struct RequestContext {
    exchange: Exchange,
    bindings: Arc<Bindings>,
    target: Option<StepHandler>,
}

impl RequestContext {
    /// Creates a lifecycle context.
    #[must_use]
    pub fn new(exchange: Exchange, bindings: Arc<Bindings>) -> Self {
        Self {
            exchange,
            bindings,
            target: None,
        }
    }

    /// Attaches the dispatch step's target handler.
    #[must_use]
    pub fn with_target(mut self, target: StepHandler) -> Self {
        self.target = Some(target);
        self
    }

    /// Returns the shared exchange.
    #[must_use]
    pub fn exchange(&self) -> &Exchange {
        &self.exchange
    }

    /// Returns the route bindings.
    #[must_use]
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Returns the route name, or `-` for unnamed routes.
    #[must_use]
    pub fn route_name(&self) -> &str {
        self.bindings.name().unwrap_or("-")
    }

    /// Returns the step's target handler, if this is a step context.
    #[must_use]
    pub fn target(&self) -> Option<&StepHandler> {
        self.target.as_ref()
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.exchange.id()
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("exchange", &self.exchange)
            .field("bindings", &self.bindings)
            .field("has_target", &self.target.is_some())
            .finish()
    }
}
