//! Per-response lifecycle tracking.
//!
//! A response can pass through several proxied dispatch steps, but its
//! `begin` and `end` passes must each run once. The first proxy to see an
//! exchange attaches a [`CompletionGuard`] to it and arms the exchange's
//! completion hook; later proxies find the same guard and only adopt their
//! own bindings.
//!
//! Each proxied step also owes one `post_invoke` pass. The step is marked
//! active just before its target runs, unless a `begin` or `pre_invoke`
//! hook already finished the response. The pass runs when the step is
//! settled, either by its handler advancing to the next step or, failing
//! that, when the response finishes. Whichever comes first wins.
//!
//! On completion the guard runs the outstanding `post_invoke` pass (if any)
//! and then the `end` pass. A failing `post_invoke` pass skips `end`.

use crate::chain::ChainInvoker;
use crate::context::RequestContext;
use crate::interceptor::Hook;
use crate::registry::HandlerRegistry;
use crate::sink::FailureSink;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tollgate_core::{Bindings, Exchange, StepHandler};
use tracing::{debug, trace};

/// A proxied dispatch step that still owes its `post_invoke` pass.
pub(crate) struct StepMarker {
    bindings: Arc<Bindings>,
    target: StepHandler,
    settled: AtomicBool,
}

impl StepMarker {
    pub(crate) fn context(&self, exchange: Exchange) -> RequestContext {
        RequestContext::new(exchange, self.bindings.clone()).with_target(self.target.clone())
    }
}

/// Lifecycle state attached to one exchange.
pub struct CompletionGuard {
    registry: Arc<HandlerRegistry>,
    sink: Arc<dyn FailureSink>,
    begin_fired: AtomicBool,
    finalized: AtomicBool,
    bindings: Mutex<Arc<Bindings>>,
    active_step: Mutex<Option<Arc<StepMarker>>>,
}

impl CompletionGuard {
    fn new(
        registry: Arc<HandlerRegistry>,
        sink: Arc<dyn FailureSink>,
        bindings: Arc<Bindings>,
    ) -> Self {
        Self {
            registry,
            sink,
            begin_fired: AtomicBool::new(false),
            finalized: AtomicBool::new(false),
            bindings: Mutex::new(bindings),
            active_step: Mutex::new(None),
        }
    }

    /// Returns the guard attached to an exchange, if any proxy has seen it.
    #[must_use]
    pub fn of(exchange: &Exchange) -> Option<Arc<Self>> {
        exchange.extension::<Arc<Self>>()
    }

    /// Returns the exchange's guard, attaching and arming a new one if this
    /// is the first proxied step for the response.
    pub(crate) fn attach(
        exchange: &Exchange,
        registry: &Arc<HandlerRegistry>,
        sink: &Arc<dyn FailureSink>,
        bindings: &Arc<Bindings>,
    ) -> Arc<Self> {
        let (guard, created) = exchange.extension_or_insert_with(|| {
            Arc::new(Self::new(registry.clone(), sink.clone(), bindings.clone()))
        });

        if !created {
            trace!(request_id = %exchange.id(), "Completion already tracked");
            *guard.bindings.lock() = bindings.clone();
            return guard;
        }

        let finalizer = guard.clone();
        let armed = exchange.on_complete(Box::new(move |exchange| {
            Box::pin(async move { finalizer.finalize(exchange).await })
        }));
        if !armed {
            // Finished before any proxy saw it: there is no lifecycle to run.
            debug!(request_id = %exchange.id(), "Response already finished");
            guard.finalized.store(true, Ordering::Release);
        }
        guard
    }

    /// Claims the right to run the `begin` pass. True exactly once per
    /// response, and never after it was finalized.
    pub(crate) fn claim_begin(&self) -> bool {
        if self.finalized.load(Ordering::Acquire) {
            return false;
        }
        !self.begin_fired.swap(true, Ordering::AcqRel)
    }

    /// Marks a step as active. Its `post_invoke` pass is now owed.
    pub(crate) fn enter_step(&self, bindings: Arc<Bindings>, target: StepHandler) -> Arc<StepMarker> {
        let marker = Arc::new(StepMarker {
            bindings,
            target,
            settled: AtomicBool::new(false),
        });
        *self.active_step.lock() = Some(marker.clone());
        marker
    }

    /// Settles a step. True if the caller now owns its `post_invoke` pass.
    pub(crate) fn settle(&self, marker: &Arc<StepMarker>) -> bool {
        if marker.settled.swap(true, Ordering::AcqRel) {
            return false;
        }
        let mut active = self.active_step.lock();
        if active.as_ref().is_some_and(|m| Arc::ptr_eq(m, marker)) {
            *active = None;
        }
        true
    }

    /// Returns true once the `begin` pass was claimed.
    #[must_use]
    pub fn begin_fired(&self) -> bool {
        self.begin_fired.load(Ordering::Acquire)
    }

    /// Returns true once the response finished and the final passes ran.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized.load(Ordering::Acquire)
    }

    /// Returns true if a step still owes its `post_invoke` pass.
    #[must_use]
    pub fn has_active_step(&self) -> bool {
        self.active_step.lock().is_some()
    }

    /// Runs the final passes. Idempotent.
    async fn finalize(&self, exchange: Exchange) {
        if self.finalized.swap(true, Ordering::AcqRel) {
            return;
        }
        let invoker = ChainInvoker::new(&self.registry);

        let step = self.active_step.lock().take();
        if let Some(step) = step {
            if self.settle(&step) {
                let ctx = step.context(exchange.clone());
                if let Err(abort) = invoker.backward(Hook::PostInvoke, &ctx).await {
                    self.sink.report(&ctx, &abort);
                    return;
                }
            }
        }

        let bindings = self.bindings.lock().clone();
        let ctx = RequestContext::new(exchange, bindings);
        if let Err(abort) = invoker.backward(Hook::End, &ctx).await {
            self.sink.report(&ctx, &abort);
        }
    }
}

impl std::fmt::Debug for CompletionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionGuard")
            .field("begin_fired", &self.begin_fired())
            .field("finalized", &self.is_finalized())
            .field("active_step", &self.has_active_step())
            .finish_non_exhaustive()
    }
}
