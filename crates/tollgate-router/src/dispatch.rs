//! The dispatch primitive seam and an in-memory implementation.
//!
//! A [`DispatchPrimitive`] is whatever actually matches requests to
//! handlers. The policy router only needs one thing from it: a way to
//! register a handler for a verb and path. [`LayerStack`] is a small
//! in-memory primitive with the usual layered semantics: matching layers
//! run in registration order, each deciding whether to finish the response
//! or advance to the next match.

use crate::pattern::PathPattern;
use bytes::Bytes;
use http::StatusCode;
use parking_lot::RwLock;
use std::sync::Arc;
use tollgate_core::{BoxFuture, Exchange, Next, Params, Request, StepHandler, Verb};
use tracing::{debug, warn};

/// Registers handlers with an underlying request dispatcher.
pub trait DispatchPrimitive: Send + Sync + 'static {
    /// Registers `handler` for `verb` requests on `path`.
    fn register(&self, verb: Verb, path: &str, handler: StepHandler);
}

#[derive(Clone)]
struct Layer {
    verb: Verb,
    pattern: PathPattern,
    handler: StepHandler,
}

impl Layer {
    fn matches(&self, exchange: &Exchange) -> Option<Params> {
        if !self.verb.matches(exchange.method()) {
            return None;
        }
        match self.verb {
            Verb::All => self.pattern.match_prefix(exchange.path()),
            _ => self.pattern.match_exact(exchange.path()),
        }
    }
}

/// In-memory layered dispatcher.
///
/// Registration publishes a new copy of the layer list, so requests already
/// being dispatched keep the list they started with.
///
/// # Example
///
/// ```
/// use tollgate_core::{step_fn, Exchange, Next, Verb};
/// use tollgate_router::{DispatchPrimitive, LayerStack};
/// use bytes::Bytes;
///
/// # tokio_test::block_on(async {
/// let stack = LayerStack::new();
/// stack.register(Verb::Get, "/ping", step_fn(|exchange: Exchange, _next: Next| async move {
///     let _ = exchange.end("pong").await;
/// }));
///
/// let request = http::Request::builder().uri("/ping").body(Bytes::new()).unwrap();
/// let exchange = stack.dispatch(request).await;
/// assert_eq!(exchange.response().unwrap().body(), &Bytes::from("pong"));
/// # });
/// ```
#[derive(Default)]
pub struct LayerStack {
    layers: RwLock<Arc<Vec<Layer>>>,
}

impl LayerStack {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.read().len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.read().is_empty()
    }

    /// Dispatches a request and returns its exchange.
    ///
    /// The returned exchange may not be finished yet if a handler deferred
    /// its response; await [`Exchange::finished`] to wait for it.
    pub async fn dispatch(&self, request: Request) -> Exchange {
        let exchange = Exchange::new(request);
        self.handle(exchange.clone()).await;
        exchange
    }

    /// Dispatches an existing exchange.
    pub async fn handle(&self, exchange: Exchange) {
        let layers = self.layers.read().clone();
        debug!(
            request_id = %exchange.id(),
            method = %exchange.method(),
            path = exchange.path(),
            "Dispatching request"
        );
        advance(layers, 0, exchange).await;
    }
}

impl DispatchPrimitive for LayerStack {
    fn register(&self, verb: Verb, path: &str, handler: StepHandler) {
        let layer = Layer {
            verb,
            pattern: PathPattern::parse(path),
            handler,
        };
        Arc::make_mut(&mut *self.layers.write()).push(layer);
    }
}

impl std::fmt::Debug for LayerStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let layers = self.layers.read();
        f.debug_list()
            .entries(
                layers
                    .iter()
                    .map(|layer| format!("{} {}", layer.verb, layer.pattern.as_str())),
            )
            .finish()
    }
}

fn advance(layers: Arc<Vec<Layer>>, from: usize, exchange: Exchange) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        let found = layers
            .iter()
            .enumerate()
            .skip(from)
            .find_map(|(index, layer)| layer.matches(&exchange).map(|params| (index, params)));

        let Some((index, params)) = found else {
            fall_through(&exchange).await;
            return;
        };

        exchange.insert_extension(params);
        let handler = layers[index].handler.clone();
        let next = {
            let exchange = exchange.clone();
            Next::new(move || advance(layers, index + 1, exchange))
        };
        handler(exchange, next).await;
    })
}

async fn fall_through(exchange: &Exchange) {
    if exchange.is_sent() {
        return;
    }
    exchange.set_status(StatusCode::NOT_FOUND);
    if let Err(e) = exchange.end(Bytes::from_static(b"Not Found")).await {
        warn!(request_id = %exchange.id(), error = %e, "Could not write 404 response");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use tollgate_core::step_fn;

    fn request(method: &str, path: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(path)
            .body(Bytes::new())
            .unwrap()
    }

    fn recording(log: &Arc<Mutex<Vec<&'static str>>>, label: &'static str, finish: bool) -> StepHandler {
        let log = log.clone();
        step_fn(move |exchange: Exchange, next: Next| {
            let log = log.clone();
            async move {
                log.lock().push(label);
                if finish {
                    exchange.end(label).await.unwrap();
                } else {
                    next.run().await;
                }
            }
        })
    }

    #[tokio::test]
    async fn test_layers_run_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let stack = LayerStack::new();
        stack.register(Verb::All, "/", recording(&log, "use", false));
        stack.register(Verb::Post, "/users", recording(&log, "post", true));
        stack.register(Verb::Get, "/users", recording(&log, "get", true));

        let exchange = stack.dispatch(request("GET", "/users")).await;

        assert_eq!(*log.lock(), vec!["use", "get"]);
        assert_eq!(exchange.response().unwrap().body(), &Bytes::from("get"));
    }

    #[tokio::test]
    async fn test_unmatched_request_falls_through_to_404() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let stack = LayerStack::new();
        stack.register(Verb::All, "/api", recording(&log, "api", false));

        let exchange = stack.dispatch(request("GET", "/api/missing")).await;

        assert_eq!(*log.lock(), vec!["api"]);
        assert_eq!(exchange.status(), StatusCode::NOT_FOUND);
        assert!(exchange.is_finished());
    }

    #[tokio::test]
    async fn test_params_are_stored_on_exchange() {
        let stack = LayerStack::new();
        stack.register(
            Verb::Get,
            "/users/{id}",
            step_fn(|exchange: Exchange, _next: Next| async move {
                let id = exchange
                    .extension::<Params>()
                    .and_then(|p| p.get("id").map(str::to_string))
                    .unwrap_or_default();
                exchange.end(id).await.unwrap();
            }),
        );

        let exchange = stack.dispatch(request("GET", "/users/42")).await;
        assert_eq!(exchange.response().unwrap().body(), &Bytes::from("42"));
    }

    #[tokio::test]
    async fn test_search_verb_dispatches() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let stack = LayerStack::new();
        stack.register(Verb::Search, "/index", recording(&log, "search", true));

        stack.dispatch(request("SEARCH", "/index")).await;
        assert_eq!(*log.lock(), vec!["search"]);
    }

    #[test]
    fn test_len_tracks_registrations() {
        let stack = LayerStack::new();
        assert!(stack.is_empty());
        stack.register(Verb::Get, "/a", step_fn(|_: Exchange, _: Next| async {}));
        assert_eq!(stack.len(), 1);
    }
}
