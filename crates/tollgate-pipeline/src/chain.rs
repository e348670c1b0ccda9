//! Forward and backward passes over the interceptor registry.
//!
//! A pass walks the registry one interceptor at a time, awaiting each hook
//! before looking up the next entry. The registry is read afresh at every
//! step, so additions and removals made while a pass is suspended are seen
//! by the rest of that pass. Backward passes clamp their cursor to the
//! current end of the registry when entries disappear underneath them.
//!
//! | Signal | Effect on the pass |
//! |---|---|
//! | `Continue` | advance to the next interceptor |
//! | `Stop` | end the pass early, reported as success |
//! | `Fail` | end the pass, reported as a [`ChainAbort`] |
//!
//! A hook that panics is treated as if it had failed with code
//! [`HOOK_PANIC_CODE`].

use crate::context::RequestContext;
use crate::interceptor::{Direction, Hook, Interceptor, Signal};
use crate::registry::HandlerRegistry;
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tollgate_core::{ChainAbort, Rejection, HOOK_PANIC_CODE};
use tracing::{debug, error, trace};

/// Runs one hook across the registry.
#[derive(Debug, Clone, Copy)]
pub struct ChainInvoker<'r> {
    registry: &'r HandlerRegistry,
}

impl<'r> ChainInvoker<'r> {
    /// Creates an invoker over a registry.
    #[must_use]
    pub const fn new(registry: &'r HandlerRegistry) -> Self {
        Self { registry }
    }

    /// Runs a pass in the hook's natural direction.
    ///
    /// # Errors
    ///
    /// Returns the [`ChainAbort`] of the first interceptor that failed.
    pub async fn run(&self, hook: Hook, ctx: &RequestContext) -> Result<(), ChainAbort> {
        match hook.direction() {
            Direction::Forward => self.forward(hook, ctx).await,
            Direction::Backward => self.backward(hook, ctx).await,
        }
    }

    /// Runs `hook` from the first registered interceptor to the last.
    ///
    /// # Errors
    ///
    /// Returns the [`ChainAbort`] of the first interceptor that failed.
    pub async fn forward(&self, hook: Hook, ctx: &RequestContext) -> Result<(), ChainAbort> {
        let mut cursor = 0;
        while let Some(interceptor) = self.registry.get(cursor) {
            if !self.step(hook, interceptor.as_ref(), ctx).await? {
                return Ok(());
            }
            cursor += 1;
        }
        Ok(())
    }

    /// Runs `hook` from the last registered interceptor to the first.
    ///
    /// # Errors
    ///
    /// Returns the [`ChainAbort`] of the first interceptor that failed.
    pub async fn backward(&self, hook: Hook, ctx: &RequestContext) -> Result<(), ChainAbort> {
        // Number of entries below the cursor still to visit.
        let mut remaining = self.registry.len();
        while remaining > 0 {
            let len = self.registry.len();
            if len == 0 {
                break;
            }
            let cursor = (remaining - 1).min(len - 1);
            let Some(interceptor) = self.registry.get(cursor) else {
                break;
            };
            if !self.step(hook, interceptor.as_ref(), ctx).await? {
                return Ok(());
            }
            remaining = cursor;
        }
        Ok(())
    }

    /// Runs one hook. `Ok(true)` continues the pass, `Ok(false)` stops it.
    async fn step(
        &self,
        hook: Hook,
        interceptor: &dyn Interceptor,
        ctx: &RequestContext,
    ) -> Result<bool, ChainAbort> {
        trace!(
            request_id = %ctx.request_id(),
            interceptor = interceptor.name(),
            hook = hook.name(),
            "Invoking hook"
        );
        match invoke(hook, interceptor, ctx).await {
            Signal::Continue => Ok(true),
            Signal::Stop => {
                debug!(
                    request_id = %ctx.request_id(),
                    interceptor = interceptor.name(),
                    hook = hook.name(),
                    "Interceptor stopped the pass"
                );
                Ok(false)
            }
            Signal::Fail(rejection) => {
                Err(ChainAbort::new(interceptor.name(), hook.name(), rejection))
            }
        }
    }
}

async fn invoke(hook: Hook, interceptor: &dyn Interceptor, ctx: &RequestContext) -> Signal {
    let future = match std::panic::catch_unwind(AssertUnwindSafe(|| hook.call(interceptor, ctx))) {
        Ok(future) => future,
        Err(payload) => return panicked(hook, interceptor, &*payload),
    };
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(signal) => signal,
        Err(payload) => panicked(hook, interceptor, &*payload),
    }
}

fn panicked(hook: Hook, interceptor: &dyn Interceptor, payload: &(dyn Any + Send)) -> Signal {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    error!(
        interceptor = interceptor.name(),
        hook = hook.name(),
        panic = %message,
        "Interceptor hook panicked"
    );
    Signal::Fail(Rejection::new(
        HOOK_PANIC_CODE,
        format!("{} hook panicked: {message}", hook.name()),
    ))
}
