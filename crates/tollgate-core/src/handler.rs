//! Dispatch-step handler types.
//!
//! A dispatch primitive runs a request through a sequence of steps. Each
//! step is a [`StepHandler`]: it receives the shared [`Exchange`] and a
//! [`Next`] continuation that advances to the following step. A step either
//! finishes the response itself, advances, or both.

use crate::exchange::Exchange;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased dispatch-step handler.
pub type StepHandler = Arc<dyn Fn(Exchange, Next) -> BoxFuture<'static, ()> + Send + Sync>;

/// Wraps an async function as a [`StepHandler`].
///
/// # Example
///
/// ```
/// use tollgate_core::{step_fn, Exchange, Next};
///
/// let handler = step_fn(|exchange: Exchange, _next: Next| async move {
///     let _ = exchange.end("hello").await;
/// });
/// # let _ = handler;
/// ```
pub fn step_fn<F, Fut>(f: F) -> StepHandler
where
    F: Fn(Exchange, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |exchange, next| Box::pin(f(exchange, next)))
}

/// Continuation that advances to the next dispatch step.
///
/// `Next` is consumed by [`Next::run`], so it can be advanced at most once.
/// Dropping it without running it ends dispatch for this request at the
/// current step.
pub struct Next {
    inner: Option<Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>>,
}

impl Next {
    /// Creates a continuation from an async closure.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            inner: Some(Box::new(move || Box::pin(f()))),
        }
    }

    /// Creates a continuation that does nothing.
    #[must_use]
    pub fn end() -> Self {
        Self { inner: None }
    }

    /// Advances to the next step.
    pub async fn run(self) {
        if let Some(f) = self.inner {
            f().await;
        }
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("terminal", &self.inner.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn exchange() -> Exchange {
        Exchange::new(http::Request::builder().uri("/").body(Bytes::new()).unwrap())
    }

    #[tokio::test]
    async fn test_next_runs_closure_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        let next = Next::new(move || async move {
            counted.fetch_add(1, Ordering::SeqCst);
        });

        next.run().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_terminal_next_is_noop() {
        Next::end().run().await;
    }

    #[tokio::test]
    async fn test_step_fn_receives_exchange_and_next() {
        let advanced = Arc::new(AtomicUsize::new(0));
        let handler = step_fn(|exchange: Exchange, next: Next| async move {
            exchange.end("ok").await.unwrap();
            next.run().await;
        });

        let ex = exchange();
        let counted = advanced.clone();
        handler(
            ex.clone(),
            Next::new(move || async move {
                counted.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .await;

        assert_eq!(advanced.load(Ordering::SeqCst), 1);
        assert_eq!(ex.response().unwrap().body(), &Bytes::from("ok"));
    }
}
