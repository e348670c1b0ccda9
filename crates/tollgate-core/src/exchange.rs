//! The per-request carrier shared by every dispatch step.
//!
//! An [`Exchange`] bundles the inbound request with the response being
//! built for it. It is a cheap, cloneable handle: the dispatch primitive,
//! every target handler, and every interceptor hook for one inbound request
//! see the same exchange.
//!
//! # Completion
//!
//! The response is finished by [`Exchange::end`] (or [`Exchange::json`]).
//! Finishing writes the body, then runs every hook registered through
//! [`Exchange::on_complete`] exactly once, in registration order. Finishing a
//! second time fails with [`TollgateError::ResponseAlreadySent`] and does not
//! run the hooks again.

use crate::error::{TollgateError, TollgateResult};
use crate::handler::BoxFuture;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method, StatusCode};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use uuid::Uuid;

/// The inbound request type.
pub type Request = http::Request<Bytes>;

/// The finished response type.
pub type Response = http::Response<Bytes>;

/// A callback run once when the response is finished.
pub type CompletionHook = Box<dyn FnOnce(Exchange) -> BoxFuture<'static, ()> + Send>;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log correlation sortable.
///
/// # Example
///
/// ```
/// use tollgate_core::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(id.to_string().len(), 36);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

#[derive(Debug)]
struct ResponseState {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Bytes>,
}

struct Inner {
    id: RequestId,
    request: Request,
    started_at: Instant,
    response: Mutex<ResponseState>,
    completion: Mutex<Vec<CompletionHook>>,
    completed: AtomicBool,
    drained: AtomicBool,
    done: Notify,
    extensions: Mutex<http::Extensions>,
}

/// Shared handle to one inbound request and its response.
///
/// # Example
///
/// ```
/// use tollgate_core::Exchange;
/// use bytes::Bytes;
/// use http::StatusCode;
///
/// # tokio_test::block_on(async {
/// let request = http::Request::builder().uri("/users").body(Bytes::new()).unwrap();
/// let exchange = Exchange::new(request);
///
/// exchange.set_status(StatusCode::CREATED);
/// exchange.end("done").await.unwrap();
///
/// let response = exchange.response().unwrap();
/// assert_eq!(response.status(), StatusCode::CREATED);
/// assert!(exchange.end("again").await.is_err());
/// # });
/// ```
#[derive(Clone)]
pub struct Exchange {
    inner: Arc<Inner>,
}

impl Exchange {
    /// Creates an exchange for a request with a fresh request ID.
    #[must_use]
    pub fn new(request: Request) -> Self {
        Self::with_request_id(RequestId::new(), request)
    }

    /// Creates an exchange with a specific request ID.
    #[must_use]
    pub fn with_request_id(id: RequestId, request: Request) -> Self {
        Self {
            inner: Arc::new(Inner {
                id,
                request,
                started_at: Instant::now(),
                response: Mutex::new(ResponseState {
                    status: StatusCode::OK,
                    headers: HeaderMap::new(),
                    body: None,
                }),
                completion: Mutex::new(Vec::new()),
                completed: AtomicBool::new(false),
                drained: AtomicBool::new(false),
                done: Notify::new(),
                extensions: Mutex::new(http::Extensions::new()),
            }),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn id(&self) -> RequestId {
        self.inner.id
    }

    /// Returns the inbound request.
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.inner.request
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        self.inner.request.method()
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.inner.request.uri().path()
    }

    /// Returns a request header as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner
            .request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
    }

    /// Returns when the exchange was created.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.inner.started_at
    }

    /// Returns the time elapsed since the exchange was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.inner.started_at.elapsed()
    }

    /// Returns true if both handles refer to the same exchange.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ------------------------------------------------------------------
    // Response
    // ------------------------------------------------------------------

    /// Returns the current response status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.inner.response.lock().status
    }

    /// Sets the response status.
    pub fn set_status(&self, status: StatusCode) {
        self.inner.response.lock().status = status;
    }

    /// Sets a response header, replacing any previous value.
    pub fn insert_header(&self, name: HeaderName, value: HeaderValue) {
        self.inner.response.lock().headers.insert(name, value);
    }

    /// Returns true once a body has been written.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.inner.response.lock().body.is_some()
    }

    /// Returns a copy of the finished response, if a body has been written.
    #[must_use]
    pub fn response(&self) -> Option<Response> {
        let state = self.inner.response.lock();
        let body = state.body.clone()?;
        let mut response = http::Response::new(body);
        *response.status_mut() = state.status;
        *response.headers_mut() = state.headers.clone();
        Some(response)
    }

    /// Finishes the response with the given body.
    ///
    /// The body is written first. Completion hooks then run once, even if
    /// writing failed; the write failure is returned afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`TollgateError::ResponseAlreadySent`] if the response was
    /// already finished.
    pub async fn end(&self, body: impl Into<Bytes>) -> TollgateResult<()> {
        let written = self.write_body(body.into());
        self.complete().await;
        written
    }

    /// Finishes the response with a JSON body and status.
    ///
    /// # Errors
    ///
    /// Returns [`TollgateError::ResponseAlreadySent`] if the response was
    /// already finished, or [`TollgateError::InvalidArgument`] if the value
    /// cannot be serialized.
    pub async fn json<T: Serialize + ?Sized>(
        &self,
        status: StatusCode,
        value: &T,
    ) -> TollgateResult<()> {
        let body = serde_json::to_vec(value)
            .map_err(|e| TollgateError::invalid_argument("body", e.to_string()))?;
        {
            let mut state = self.inner.response.lock();
            if state.body.is_none() {
                state.status = status;
                state
                    .headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
        }
        self.end(body).await
    }

    fn write_body(&self, body: Bytes) -> TollgateResult<()> {
        let mut state = self.inner.response.lock();
        if state.body.is_some() {
            return Err(TollgateError::ResponseAlreadySent);
        }
        state.body = Some(body);
        Ok(())
    }

    async fn complete(&self) {
        if self.inner.completed.swap(true, Ordering::AcqRel) {
            return;
        }
        let hooks = std::mem::take(&mut *self.inner.completion.lock());
        for hook in hooks {
            hook(self.clone()).await;
        }
        self.inner.drained.store(true, Ordering::Release);
        self.inner.done.notify_waiters();
    }

    /// Registers a hook to run once when the response is finished.
    ///
    /// Returns `false` (and drops the hook) if the response was already
    /// finished.
    pub fn on_complete(&self, hook: CompletionHook) -> bool {
        let mut hooks = self.inner.completion.lock();
        if self.inner.completed.load(Ordering::Acquire) {
            return false;
        }
        hooks.push(hook);
        true
    }

    /// Returns true once the response has been finished and its completion
    /// hooks have started.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.inner.completed.load(Ordering::Acquire)
    }

    /// Waits until the response is finished and every completion hook ran.
    pub async fn finished(&self) {
        loop {
            let notified = self.inner.done.notified();
            if self.inner.drained.load(Ordering::Acquire) {
                return;
            }
            notified.await;
        }
    }

    // ------------------------------------------------------------------
    // Extensions
    // ------------------------------------------------------------------

    /// Stores a typed per-request value, returning any previous value.
    pub fn insert_extension<T: Clone + Send + Sync + 'static>(&self, value: T) -> Option<T> {
        self.inner.extensions.lock().insert(value)
    }

    /// Returns a clone of a typed per-request value.
    #[must_use]
    pub fn extension<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.inner.extensions.lock().get::<T>().cloned()
    }

    /// Removes and returns a typed per-request value.
    pub fn remove_extension<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.inner.extensions.lock().remove::<T>()
    }

    /// Mutates a typed per-request value in place.
    pub fn with_extension_mut<T, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.inner.extensions.lock().get_mut::<T>().map(f)
    }

    /// Returns the stored value of type `T`, inserting one built by `init`
    /// if absent. The flag is true if the value was inserted by this call.
    pub fn extension_or_insert_with<T, F>(&self, init: F) -> (T, bool)
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        let mut extensions = self.inner.extensions.lock();
        if let Some(existing) = extensions.get::<T>() {
            return (existing.clone(), false);
        }
        let value = init();
        extensions.insert(value.clone());
        (value, true)
    }
}

impl std::fmt::Debug for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exchange")
            .field("id", &self.inner.id)
            .field("method", self.method())
            .field("path", &self.path())
            .field("finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}
