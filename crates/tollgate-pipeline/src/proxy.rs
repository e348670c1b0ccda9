//! Wraps a route's target handler with the interceptor lifecycle.
//!
//! For every dispatch step it handles, a [`PipelineProxy`]:
//!
//! 1. attaches the response's [`CompletionGuard`] (first step only arms it),
//! 2. runs the `begin` pass if no earlier step did,
//! 3. runs the `pre_invoke` pass,
//! 4. calls the target with a continuation that runs the `post_invoke` pass
//!    before advancing to the next step.
//!
//! If a `begin` or `pre_invoke` hook finishes the response itself, the `end` pass has
//! already run by the time the target is called. The step then owes no
//! `post_invoke` pass, so no hook runs after `end`.
//!
//! An aborted pass is handed to the [`FailureSink`] and nothing after it
//! runs: not the target, not the next step.

use crate::chain::ChainInvoker;
use crate::context::RequestContext;
use crate::guard::CompletionGuard;
use crate::interceptor::Hook;
use crate::registry::HandlerRegistry;
use crate::sink::{FailureSink, LogFailureSink};
use std::sync::Arc;
use tollgate_core::{Bindings, Exchange, Next, StepHandler};
use tracing::{debug, trace};

/// A target handler bound to a route and a shared interceptor registry.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tollgate_core::{step_fn, Bindings, Exchange, Next};
/// use tollgate_pipeline::{HandlerRegistry, PipelineProxy};
///
/// let registry = Arc::new(HandlerRegistry::new());
/// let target = step_fn(|exchange: Exchange, _next: Next| async move {
///     let _ = exchange.end("pong").await;
/// });
///
/// let proxy = PipelineProxy::new(target, Bindings::named("ping"), registry);
/// let handler = proxy.into_step_handler();
/// # let _ = handler;
/// ```
#[derive(Clone)]
pub struct PipelineProxy {
    target: StepHandler,
    bindings: Arc<Bindings>,
    registry: Arc<HandlerRegistry>,
    sink: Arc<dyn FailureSink>,
}

impl PipelineProxy {
    /// Creates a proxy that reports aborted passes to [`LogFailureSink`].
    #[must_use]
    pub fn new(target: StepHandler, bindings: Bindings, registry: Arc<HandlerRegistry>) -> Self {
        Self {
            target,
            bindings: Arc::new(bindings),
            registry,
            sink: Arc::new(LogFailureSink),
        }
    }

    /// Replaces the failure sink.
    #[must_use]
    pub fn with_failure_sink(mut self, sink: Arc<dyn FailureSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns the route bindings.
    #[must_use]
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Handles one dispatch step.
    pub async fn invoke(&self, exchange: Exchange, next: Next) {
        let guard = CompletionGuard::attach(&exchange, &self.registry, &self.sink, &self.bindings);
        let invoker = ChainInvoker::new(&self.registry);
        let finished_before = guard.is_finalized();

        if guard.claim_begin() {
            let ctx = RequestContext::new(exchange.clone(), self.bindings.clone());
            if let Err(abort) = invoker.forward(Hook::Begin, &ctx).await {
                self.sink.report(&ctx, &abort);
                return;
            }
        }

        let ctx = RequestContext::new(exchange.clone(), self.bindings.clone())
            .with_target(self.target.clone());
        if let Err(abort) = invoker.forward(Hook::PreInvoke, &ctx).await {
            self.sink.report(&ctx, &abort);
            return;
        }

        // A hook that ended the response already triggered the `end` pass.
        let ended_in_pre = !finished_before && guard.is_finalized();
        if ended_in_pre {
            debug!(request_id = %exchange.id(), "Response finished before target, skipping post_invoke");
        }
        let step =
            (!ended_in_pre).then(|| guard.enter_step(self.bindings.clone(), self.target.clone()));
        let registry = self.registry.clone();
        let sink = self.sink.clone();
        let advance = Next::new(move || async move {
            if step.as_ref().is_some_and(|step| guard.settle(step)) {
                if let Err(abort) = ChainInvoker::new(&registry)
                    .backward(Hook::PostInvoke, &ctx)
                    .await
                {
                    sink.report(&ctx, &abort);
                    return;
                }
            }
            next.run().await;
        });

        trace!(request_id = %exchange.id(), route = self.bindings.name().unwrap_or("-"), "Invoking target");
        (self.target)(exchange, advance).await;
    }

    /// Converts the proxy into a handler a dispatch primitive can register.
    #[must_use]
    pub fn into_step_handler(self) -> StepHandler {
        let proxy = Arc::new(self);
        Arc::new(move |exchange, next| {
            let proxy = proxy.clone();
            Box::pin(async move { proxy.invoke(exchange, next).await })
        })
    }
}

impl std::fmt::Debug for PipelineProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineProxy")
            .field("bindings", &self.bindings)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
