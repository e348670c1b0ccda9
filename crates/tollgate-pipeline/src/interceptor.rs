//! The interceptor capability contract.
//!
//! An [`Interceptor`] participates in a request's lifecycle through four
//! hooks. Each hook resolves to a [`Signal`] that tells the chain invoker
//! what to do next:
//!
//! | Hook | Pass direction | Fires |
//! |---|---|---|
//! | `begin` | forward | once per response, before the first dispatch step |
//! | `pre_invoke` | forward | before every proxied dispatch step |
//! | `post_invoke` | backward | once per proxied step, when it advances or the response finishes |
//! | `end` | backward | once per response, after it finishes |
//!
//! Every hook except [`Interceptor::name`] defaults to [`Signal::Continue`],
//! so an interceptor only implements the capabilities it needs.
//!
//! # Example
//!
//! ```
//! use tollgate_pipeline::{BoxFuture, Interceptor, RequestContext, Signal};
//!
//! struct RequireJson;
//!
//! impl Interceptor for RequireJson {
//!     fn name(&self) -> &str {
//!         "RequireJson"
//!     }
//!
//!     fn pre_invoke<'a>(&'a self, ctx: &'a RequestContext) -> BoxFuture<'a, Signal> {
//!         Box::pin(async move {
//!             match ctx.exchange().header("content-type") {
//!                 Some("application/json") => Signal::Continue,
//!                 _ => Signal::fail("E_CONTENT_TYPE", "expected application/json"),
//!             }
//!         })
//!     }
//! }
//! ```

use crate::context::RequestContext;
use tollgate_core::{BoxFuture, Rejection};

/// The outcome of one interceptor hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Proceed to the next interceptor in the pass.
    Continue,

    /// Skip the remaining interceptors of this pass. Indistinguishable from
    /// a completed pass to whoever awaits it.
    Stop,

    /// Abort the pass and the stage that would follow it.
    Fail(Rejection),
}

impl Signal {
    /// Creates a failure signal.
    #[must_use]
    pub fn fail(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fail(Rejection::new(code, reason))
    }

    /// Returns true for [`Signal::Continue`].
    #[must_use]
    pub const fn is_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }

    /// Returns true for [`Signal::Fail`].
    #[must_use]
    pub const fn is_fail(&self) -> bool {
        matches!(self, Self::Fail(_))
    }
}

impl From<Rejection> for Signal {
    fn from(rejection: Rejection) -> Self {
        Self::Fail(rejection)
    }
}

/// Returns an already-resolved hook future.
pub fn ready<'a>(signal: Signal) -> BoxFuture<'a, Signal> {
    Box::pin(std::future::ready(signal))
}

/// A policy component that observes or gates requests.
///
/// Implementations must be `Send + Sync`: one instance is shared by every
/// request that passes through the registry it is added to.
pub trait Interceptor: Send + Sync + 'static {
    /// Returns the interceptor's name.
    ///
    /// Names are used for removal from the registry and in logs. They need
    /// not be unique.
    fn name(&self) -> &str;

    /// Runs once per response, before its first dispatch step.
    fn begin<'a>(&'a self, _ctx: &'a RequestContext) -> BoxFuture<'a, Signal> {
        ready(Signal::Continue)
    }

    /// Runs once per response, after it finishes.
    fn end<'a>(&'a self, _ctx: &'a RequestContext) -> BoxFuture<'a, Signal> {
        ready(Signal::Continue)
    }

    /// Runs before every proxied dispatch step. The context carries the
    /// step's target handler.
    fn pre_invoke<'a>(&'a self, _ctx: &'a RequestContext) -> BoxFuture<'a, Signal> {
        ready(Signal::Continue)
    }

    /// Runs once after every proxied dispatch step.
    fn post_invoke<'a>(&'a self, _ctx: &'a RequestContext) -> BoxFuture<'a, Signal> {
        ready(Signal::Continue)
    }
}

/// Pass direction over the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// First registered to last.
    Forward,
    /// Last registered to first.
    Backward,
}

/// One of the four lifecycle hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// [`Interceptor::begin`]
    Begin,
    /// [`Interceptor::end`]
    End,
    /// [`Interceptor::pre_invoke`]
    PreInvoke,
    /// [`Interceptor::post_invoke`]
    PostInvoke,
}

impl Hook {
    /// Returns the hook name used in logs, metrics, and [`ChainAbort`]s.
    ///
    /// [`ChainAbort`]: tollgate_core::ChainAbort
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::End => "end",
            Self::PreInvoke => "pre_invoke",
            Self::PostInvoke => "post_invoke",
        }
    }

    /// Returns the direction this hook's pass walks the registry.
    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            Self::Begin | Self::PreInvoke => Direction::Forward,
            Self::End | Self::PostInvoke => Direction::Backward,
        }
    }

    /// Calls this hook on an interceptor.
    pub fn call<'a>(
        self,
        interceptor: &'a dyn Interceptor,
        ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Signal> {
        match self {
            Self::Begin => interceptor.begin(ctx),
            Self::End => interceptor.end(ctx),
            Self::PreInvoke => interceptor.pre_invoke(ctx),
            Self::PostInvoke => interceptor.post_invoke(ctx),
        }
    }
}

impl std::fmt::Display for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::sync::Arc;
    use tollgate_core::{Bindings, Exchange};

    struct NameOnly;

    impl Interceptor for NameOnly {
        fn name(&self) -> &str {
            "NameOnly"
        }
    }

    fn context() -> RequestContext {
        let request = http::Request::builder().uri("/").body(Bytes::new()).unwrap();
        RequestContext::new(Exchange::new(request), Arc::new(Bindings::new()))
    }

    #[tokio::test]
    async fn test_missing_capabilities_continue() {
        let ctx = context();
        for hook in [Hook::Begin, Hook::End, Hook::PreInvoke, Hook::PostInvoke] {
            assert_eq!(hook.call(&NameOnly, &ctx).await, Signal::Continue);
        }
    }

    #[test]
    fn test_hook_directions() {
        assert_eq!(Hook::Begin.direction(), Direction::Forward);
        assert_eq!(Hook::PreInvoke.direction(), Direction::Forward);
        assert_eq!(Hook::PostInvoke.direction(), Direction::Backward);
        assert_eq!(Hook::End.direction(), Direction::Backward);
    }

    #[test]
    fn test_signal_helpers() {
        let failed = Signal::fail("E_X", "nope");
        assert!(failed.is_fail());
        assert!(!failed.is_continue());
        assert!(Signal::Continue.is_continue());
        assert!(!Signal::Stop.is_fail());
        assert_eq!(Signal::from(Rejection::new("E_X", "nope")), failed);
    }
}
