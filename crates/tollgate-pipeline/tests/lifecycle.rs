//! End-to-end lifecycle tests: proxied dispatch steps over a shared registry.

use bytes::Bytes;
use http::StatusCode;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tollgate_core::{
    step_fn, Bindings, BoxFuture, ChainAbort, Exchange, Next, StepHandler, TollgateError,
};
use tollgate_pipeline::{
    ready, CompletionGuard, FailureSink, HandlerRegistry, Hook, Interceptor, PipelineProxy,
    RequestContext, Signal,
};

// ============================================================================
// Fixtures
// ============================================================================

type Log = Arc<Mutex<Vec<String>>>;

struct Recorder {
    name: &'static str,
    log: Log,
    signals: HashMap<Hook, Signal>,
}

impl Recorder {
    fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            log: log.clone(),
            signals: HashMap::new(),
        }
    }

    fn on(mut self, hook: Hook, signal: Signal) -> Self {
        self.signals.insert(hook, signal);
        self
    }

    fn record(&self, hook: Hook) -> BoxFuture<'_, Signal> {
        self.log.lock().push(format!("{}.{}", self.name, hook));
        ready(self.signals.get(&hook).cloned().unwrap_or(Signal::Continue))
    }
}

impl Interceptor for Recorder {
    fn name(&self) -> &str {
        self.name
    }
    fn begin<'a>(&'a self, _ctx: &'a RequestContext) -> BoxFuture<'a, Signal> {
        self.record(Hook::Begin)
    }
    fn end<'a>(&'a self, _ctx: &'a RequestContext) -> BoxFuture<'a, Signal> {
        self.record(Hook::End)
    }
    fn pre_invoke<'a>(&'a self, _ctx: &'a RequestContext) -> BoxFuture<'a, Signal> {
        self.record(Hook::PreInvoke)
    }
    fn post_invoke<'a>(&'a self, _ctx: &'a RequestContext) -> BoxFuture<'a, Signal> {
        self.record(Hook::PostInvoke)
    }
}

/// Answers 403 from `pre_invoke` and fails the pass.
struct Deny;

impl Interceptor for Deny {
    fn name(&self) -> &str {
        "Deny"
    }
    fn pre_invoke<'a>(&'a self, ctx: &'a RequestContext) -> BoxFuture<'a, Signal> {
        Box::pin(async move {
            ctx.exchange().set_status(StatusCode::FORBIDDEN);
            let _ = ctx.exchange().end("denied").await;
            Signal::fail("E_DENY", "denied")
        })
    }
}

#[derive(Default)]
struct RecordingSink {
    aborts: Mutex<Vec<ChainAbort>>,
}

impl FailureSink for RecordingSink {
    fn report(&self, _ctx: &RequestContext, abort: &ChainAbort) {
        self.aborts.lock().push(abort.clone());
    }
}

struct Harness {
    registry: Arc<HandlerRegistry>,
    sink: Arc<RecordingSink>,
    log: Log,
}

impl Harness {
    fn new() -> Self {
        Self {
            registry: Arc::new(HandlerRegistry::new()),
            sink: Arc::new(RecordingSink::default()),
            log: Log::default(),
        }
    }

    fn proxy(&self, route: &str, target: StepHandler) -> StepHandler {
        PipelineProxy::new(target, Bindings::named(route), self.registry.clone())
            .with_failure_sink(self.sink.clone())
            .into_step_handler()
    }

    fn target_advancing(&self, label: &'static str) -> StepHandler {
        let log = self.log.clone();
        step_fn(move |_exchange: Exchange, next: Next| {
            let log = log.clone();
            async move {
                log.lock().push(format!("target:{label}"));
                next.run().await;
            }
        })
    }

    fn target_ending(&self, label: &'static str) -> StepHandler {
        let log = self.log.clone();
        step_fn(move |exchange: Exchange, _next: Next| {
            let log = log.clone();
            async move {
                log.lock().push(format!("target:{label}"));
                exchange.end(label).await.unwrap();
            }
        })
    }

    fn entries(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    fn aborts(&self) -> Vec<ChainAbort> {
        self.sink.aborts.lock().clone()
    }
}

fn exchange() -> Exchange {
    Exchange::new(
        http::Request::builder()
            .uri("/orders")
            .body(Bytes::new())
            .unwrap(),
    )
}

/// Runs `steps` in order the way a dispatch primitive would.
fn dispatch(steps: Arc<Vec<StepHandler>>, index: usize, exchange: Exchange) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        let Some(step) = steps.get(index).cloned() else {
            return;
        };
        let rest = steps.clone();
        let advanced = exchange.clone();
        let next = Next::new(move || dispatch(rest, index + 1, advanced));
        step(exchange, next).await;
    })
}

async fn run(steps: Vec<StepHandler>, exchange: &Exchange) {
    dispatch(Arc::new(steps), 0, exchange.clone()).await;
}

/// Answers from `pre_invoke` and stops the pass without failing it.
struct Cache {
    log: Log,
}

impl Cache {
    fn record(&self, hook: Hook) -> BoxFuture<'_, Signal> {
        self.log.lock().push(format!("cache.{hook}"));
        ready(Signal::Continue)
    }
}

impl Interceptor for Cache {
    fn name(&self) -> &str {
        "Cache"
    }
    fn begin<'a>(&'a self, _ctx: &'a RequestContext) -> BoxFuture<'a, Signal> {
        self.record(Hook::Begin)
    }
    fn end<'a>(&'a self, _ctx: &'a RequestContext) -> BoxFuture<'a, Signal> {
        self.record(Hook::End)
    }
    fn pre_invoke<'a>(&'a self, ctx: &'a RequestContext) -> BoxFuture<'a, Signal> {
        Box::pin(async move {
            self.log.lock().push("cache.pre_invoke".to_string());
            let _ = ctx.exchange().end("cached").await;
            Signal::Stop
        })
    }
    fn post_invoke<'a>(&'a self, _ctx: &'a RequestContext) -> BoxFuture<'a, Signal> {
        self.record(Hook::PostInvoke)
    }
}

// ============================================================================
// Ordering
// ============================================================================

#[tokio::test]
async fn test_single_step_lifecycle_order() {
    let h = Harness::new();
    h.registry.add(Recorder::new("a", &h.log));
    h.registry.add(Recorder::new("b", &h.log));

    let ex = exchange();
    run(vec![h.proxy("orders", h.target_ending("orders"))], &ex).await;

    assert_eq!(
        h.entries(),
        vec![
            "a.begin",
            "b.begin",
            "a.pre_invoke",
            "b.pre_invoke",
            "target:orders",
            "b.post_invoke",
            "a.post_invoke",
            "b.end",
            "a.end",
        ]
    );
    assert!(h.aborts().is_empty());
    assert_eq!(ex.response().unwrap().body(), &Bytes::from("orders"));
}

#[tokio::test]
async fn test_begin_and_end_fire_once_across_steps() {
    let h = Harness::new();
    h.registry.add(Recorder::new("a", &h.log));

    let ex = exchange();
    let finisher = {
        let log = h.log.clone();
        step_fn(move |exchange: Exchange, _next: Next| {
            let log = log.clone();
            async move {
                log.lock().push("target:three".to_string());
                exchange.end("done").await.unwrap();
                assert!(exchange.end("again").await.is_err());
            }
        })
    };
    run(
        vec![
            h.proxy("one", h.target_advancing("one")),
            h.proxy("two", h.target_advancing("two")),
            h.proxy("three", finisher),
        ],
        &ex,
    )
    .await;

    assert_eq!(
        h.entries(),
        vec![
            "a.begin",
            "a.pre_invoke",
            "target:one",
            "a.post_invoke",
            "a.pre_invoke",
            "target:two",
            "a.post_invoke",
            "a.pre_invoke",
            "target:three",
            "a.post_invoke",
            "a.end",
        ]
    );

    let guard = CompletionGuard::of(&ex).unwrap();
    assert!(guard.begin_fired());
    assert!(guard.is_finalized());
    assert!(!guard.has_active_step());
}

#[tokio::test]
async fn test_unproxied_step_does_not_run_hooks() {
    let h = Harness::new();
    h.registry.add(Recorder::new("a", &h.log));

    let ex = exchange();
    run(
        vec![
            h.target_advancing("plain"),
            h.proxy("orders", h.target_ending("orders")),
        ],
        &ex,
    )
    .await;

    assert_eq!(
        h.entries(),
        vec![
            "target:plain",
            "a.begin",
            "a.pre_invoke",
            "target:orders",
            "a.post_invoke",
            "a.end",
        ]
    );
}

#[tokio::test]
async fn test_deferred_completion_runs_post_and_end_later() {
    let h = Harness::new();
    h.registry.add(Recorder::new("a", &h.log));

    let ex = exchange();
    // Target neither advances nor finishes; the response is finished later.
    let idle = step_fn(|_exchange: Exchange, _next: Next| async {});
    run(vec![h.proxy("slow", idle)], &ex).await;

    assert_eq!(h.entries(), vec!["a.begin", "a.pre_invoke"]);
    assert!(CompletionGuard::of(&ex).unwrap().has_active_step());

    ex.end("late").await.unwrap();
    assert_eq!(
        h.entries(),
        vec!["a.begin", "a.pre_invoke", "a.post_invoke", "a.end"]
    );
}

// ============================================================================
// Signals
// ============================================================================

#[tokio::test]
async fn test_pre_invoke_failure_short_circuits() {
    let h = Harness::new();
    h.registry.add(Recorder::new("a", &h.log));
    h.registry.add(Deny);
    h.registry.add(Recorder::new("c", &h.log));

    let ex = exchange();
    run(
        vec![
            h.proxy("orders", h.target_advancing("orders")),
            h.target_advancing("after"),
        ],
        &ex,
    )
    .await;

    // Deny finished the response itself, so only the end pass follows.
    assert_eq!(
        h.entries(),
        vec!["a.begin", "c.begin", "a.pre_invoke", "c.end", "a.end"]
    );
    assert_eq!(ex.status(), StatusCode::FORBIDDEN);

    let aborts = h.aborts();
    assert_eq!(aborts.len(), 1);
    assert_eq!(aborts[0].interceptor, "Deny");
    assert_eq!(aborts[0].hook, "pre_invoke");
}

#[tokio::test]
async fn test_begin_failure_stops_request() {
    let h = Harness::new();
    h.registry
        .add(Recorder::new("a", &h.log).on(Hook::Begin, Signal::fail("E_BEGIN", "no")));
    h.registry.add(Recorder::new("b", &h.log));

    let ex = exchange();
    run(vec![h.proxy("orders", h.target_ending("orders"))], &ex).await;

    assert_eq!(h.entries(), vec!["a.begin"]);
    assert!(!ex.is_sent());
    assert_eq!(h.aborts()[0].hook, "begin");
}

#[tokio::test]
async fn test_stop_skips_rest_of_pass_only() {
    let h = Harness::new();
    h.registry
        .add(Recorder::new("a", &h.log).on(Hook::Begin, Signal::Stop));
    h.registry.add(Recorder::new("b", &h.log));

    let ex = exchange();
    run(vec![h.proxy("orders", h.target_ending("orders"))], &ex).await;

    assert_eq!(
        h.entries(),
        vec![
            "a.begin",
            "a.pre_invoke",
            "b.pre_invoke",
            "target:orders",
            "b.post_invoke",
            "a.post_invoke",
            "b.end",
            "a.end",
        ]
    );
    assert!(h.aborts().is_empty());
}

#[tokio::test]
async fn test_stop_in_pre_invoke_still_runs_target() {
    let h = Harness::new();
    h.registry
        .add(Recorder::new("h1", &h.log).on(Hook::PreInvoke, Signal::Stop));
    h.registry.add(Recorder::new("h2", &h.log));

    let ex = exchange();
    run(vec![h.proxy("orders", h.target_ending("orders"))], &ex).await;

    assert_eq!(
        h.entries(),
        vec![
            "h1.begin",
            "h2.begin",
            "h1.pre_invoke",
            "target:orders",
            "h2.post_invoke",
            "h1.post_invoke",
            "h2.end",
            "h1.end",
        ]
    );
    assert!(h.aborts().is_empty());
    assert_eq!(ex.response().unwrap().body(), &Bytes::from("orders"));
}

#[tokio::test]
async fn test_response_finished_in_pre_invoke_skips_post_invoke() {
    let h = Harness::new();
    h.registry.add(Cache { log: h.log.clone() });

    let ex = exchange();
    run(
        vec![
            h.proxy("orders", h.target_advancing("orders")),
            h.target_advancing("after"),
        ],
        &ex,
    )
    .await;

    // Nothing runs after the end pass except the targets themselves.
    assert_eq!(
        h.entries(),
        vec![
            "cache.begin",
            "cache.pre_invoke",
            "cache.end",
            "target:orders",
            "target:after",
        ]
    );
    assert!(h.aborts().is_empty());
    assert_eq!(ex.response().unwrap().body(), &Bytes::from("cached"));

    let guard = CompletionGuard::of(&ex).unwrap();
    assert!(guard.is_finalized());
    assert!(!guard.has_active_step());
}

#[tokio::test]
async fn test_post_invoke_failure_blocks_advance() {
    let h = Harness::new();
    h.registry
        .add(Recorder::new("a", &h.log).on(Hook::PostInvoke, Signal::fail("E_POST", "no")));

    let ex = exchange();
    run(
        vec![
            h.proxy("one", h.target_advancing("one")),
            h.target_advancing("two"),
        ],
        &ex,
    )
    .await;

    assert_eq!(
        h.entries(),
        vec!["a.begin", "a.pre_invoke", "target:one", "a.post_invoke"]
    );
    assert_eq!(h.aborts()[0].hook, "post_invoke");
}

#[tokio::test]
async fn test_final_post_invoke_failure_skips_end() {
    let h = Harness::new();
    h.registry
        .add(Recorder::new("a", &h.log).on(Hook::PostInvoke, Signal::fail("E_POST", "no")));

    let ex = exchange();
    run(vec![h.proxy("orders", h.target_ending("orders"))], &ex).await;

    assert_eq!(
        h.entries(),
        vec!["a.begin", "a.pre_invoke", "target:orders", "a.post_invoke"]
    );
    assert_eq!(h.aborts().len(), 1);
}

#[tokio::test]
async fn test_panicking_hook_is_reported() {
    struct Explodes;
    impl Interceptor for Explodes {
        fn name(&self) -> &str {
            "Explodes"
        }
        fn pre_invoke<'a>(&'a self, _ctx: &'a RequestContext) -> BoxFuture<'a, Signal> {
            Box::pin(async { panic!("kaboom") })
        }
    }

    let h = Harness::new();
    h.registry.add(Explodes);

    let ex = exchange();
    run(vec![h.proxy("orders", h.target_ending("orders"))], &ex).await;

    assert!(!ex.is_sent());
    let aborts = h.aborts();
    assert_eq!(aborts.len(), 1);
    assert!(aborts[0].is_panic());
}

// ============================================================================
// Edge cases
// ============================================================================

#[tokio::test]
async fn test_empty_registry_passes_through() {
    let h = Harness::new();
    let ex = exchange();
    run(
        vec![
            h.proxy("one", h.target_advancing("one")),
            h.proxy("two", h.target_ending("two")),
        ],
        &ex,
    )
    .await;

    assert_eq!(h.entries(), vec!["target:one", "target:two"]);
    assert_eq!(ex.response().unwrap().body(), &Bytes::from("two"));
}

#[tokio::test]
async fn test_empty_registry_second_end_is_rejected() {
    let h = Harness::new();
    let ex = exchange();
    let twice = step_fn(|exchange: Exchange, _next: Next| async move {
        exchange.end("first").await.unwrap();
        let err = exchange.end("second").await.unwrap_err();
        assert!(matches!(err, TollgateError::ResponseAlreadySent));
    });
    run(vec![h.proxy("orders", twice)], &ex).await;

    assert!(h.entries().is_empty());
    assert!(h.aborts().is_empty());
    assert_eq!(ex.response().unwrap().body(), &Bytes::from("first"));

    let guard = CompletionGuard::of(&ex).unwrap();
    assert!(guard.is_finalized());
    assert!(!guard.has_active_step());
}

#[tokio::test]
async fn test_already_finished_response_skips_lifecycle() {
    let h = Harness::new();
    h.registry.add(Recorder::new("a", &h.log));

    let ex = exchange();
    ex.end("early").await.unwrap();
    run(vec![h.proxy("orders", h.target_advancing("orders"))], &ex).await;

    assert_eq!(
        h.entries(),
        vec!["a.pre_invoke", "target:orders", "a.post_invoke"]
    );
    let guard = CompletionGuard::of(&ex).unwrap();
    assert!(!guard.begin_fired());
    assert!(guard.is_finalized());
}

#[tokio::test]
async fn test_registry_changes_apply_to_later_steps() {
    let h = Harness::new();
    h.registry.add(Recorder::new("a", &h.log));

    let registry = h.registry.clone();
    let log = h.log.clone();
    let mutate = step_fn(move |_exchange: Exchange, next: Next| {
        let registry = registry.clone();
        let log = log.clone();
        async move {
            registry.remove("a");
            registry.add(Recorder::new("b", &log));
            next.run().await;
        }
    });

    let ex = exchange();
    run(
        vec![
            h.proxy("one", mutate),
            h.proxy("two", h.target_ending("two")),
        ],
        &ex,
    )
    .await;

    assert_eq!(
        h.entries(),
        vec![
            "a.begin",
            "a.pre_invoke",
            "b.post_invoke",
            "b.pre_invoke",
            "target:two",
            "b.post_invoke",
            "b.end",
        ]
    );
}
