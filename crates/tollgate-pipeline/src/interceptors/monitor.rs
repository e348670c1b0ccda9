//! Per-request trace events for API monitoring.
//!
//! `begin` opens a [`TraceEvent`] on the exchange, every proxied step
//! appends `pre_invoke`/`post_invoke` records to its call stack, and `end`
//! closes it and hands it to a [`MonitorSink`]. Publishing runs on a
//! spawned task so a slow sink never holds up the response.

use crate::context::RequestContext;
use crate::interceptor::{ready, Hook, Interceptor, Signal};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tollgate_core::{BoxFuture, Exchange, Params, RequestId};
use tollgate_telemetry::metrics::record_request;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Event type of HTTP trace events.
pub const HTTP_EVENT: &str = "HttpEvent";

/// One hook invocation recorded on a trace event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallRecord {
    /// `preInvoke` or `postInvoke`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Route name of the step.
    pub middleware: Option<String>,
    /// When the hook ran.
    pub time: DateTime<Utc>,
}

/// Request and response details of a trace event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpEventData {
    /// `x-session-id` header.
    pub session_id: Option<String>,
    /// Request method.
    pub method: String,
    /// Request path without the query.
    pub pathname: String,
    /// Path and query.
    pub url: String,
    /// `x-forwarded-protocol` header, else the URI scheme, else `http`.
    pub protocol: String,
    /// `x-forwarded-for` header.
    pub hostname: Option<String>,
    /// Request headers with valid UTF-8 values.
    pub headers: BTreeMap<String, String>,
    /// HTTP version, e.g. `HTTP/1.1`.
    pub http_version: String,
    /// Path parameters of the route matched when the event opened.
    pub params: BTreeMap<String, String>,
    /// Raw query string.
    pub query: Option<String>,
    /// Response status, set when the event closes.
    pub status_code: Option<u16>,
    /// Canonical reason phrase of the status.
    pub status_message: Option<String>,
}

/// A monitored request, from `begin` to `end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEvent {
    /// Platform that produced the event.
    pub system: String,
    /// Unique event ID.
    pub event_id: Uuid,
    /// Always [`HTTP_EVENT`].
    pub event_type: String,
    /// Request ID of the exchange.
    pub request_id: RequestId,
    /// When `begin` ran.
    pub enter_time: DateTime<Utc>,
    /// When `end` ran.
    pub exit_time: Option<DateTime<Utc>>,
    /// Milliseconds between enter and exit.
    pub duration: Option<i64>,
    /// Request and response details.
    pub data: HttpEventData,
    /// Hook invocations in order.
    pub call_stack: Vec<CallRecord>,
}

impl TraceEvent {
    fn open(platform: &str, exchange: &Exchange) -> Self {
        let request = exchange.request();
        let uri = request.uri();
        let headers = request
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        Self {
            system: platform.to_string(),
            event_id: Uuid::now_v7(),
            event_type: HTTP_EVENT.to_string(),
            request_id: exchange.id(),
            enter_time: Utc::now(),
            exit_time: None,
            duration: None,
            data: HttpEventData {
                session_id: exchange.header("x-session-id").map(str::to_string),
                method: request.method().to_string(),
                pathname: uri.path().to_string(),
                url: uri
                    .path_and_query()
                    .map_or_else(|| uri.path().to_string(), ToString::to_string),
                protocol: exchange
                    .header("x-forwarded-protocol")
                    .or_else(|| uri.scheme_str())
                    .unwrap_or("http")
                    .to_string(),
                hostname: exchange.header("x-forwarded-for").map(str::to_string),
                headers,
                http_version: format!("{:?}", request.version()),
                params: exchange
                    .extension::<Params>()
                    .map(|params| {
                        params
                            .iter()
                            .map(|(name, value)| (name.to_string(), value.to_string()))
                            .collect()
                    })
                    .unwrap_or_default(),
                query: uri.query().map(str::to_string),
                status_code: None,
                status_message: None,
            },
            call_stack: Vec::new(),
        }
    }

    fn close(&mut self, exchange: &Exchange) {
        let exit = Utc::now();
        let status = exchange.status();
        self.exit_time = Some(exit);
        self.duration = Some((exit - self.enter_time).num_milliseconds());
        self.data.status_code = Some(status.as_u16());
        self.data.status_message = status.canonical_reason().map(str::to_string);
    }
}

/// Failure to publish a trace event.
#[derive(Debug, Clone, Error)]
#[error("failed to publish monitor event: {0}")]
pub struct MonitorError(pub String);

/// Destination for closed trace events.
pub trait MonitorSink: Send + Sync + 'static {
    /// Publishes one event.
    fn publish(&self, event: TraceEvent) -> BoxFuture<'static, Result<(), MonitorError>>;
}

/// Writes events as JSON under the `tollgate::monitor` log target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMonitorSink;

impl MonitorSink for LogMonitorSink {
    fn publish(&self, event: TraceEvent) -> BoxFuture<'static, Result<(), MonitorError>> {
        Box::pin(async move {
            let json = serde_json::to_string(&event).map_err(|e| MonitorError(e.to_string()))?;
            info!(target: "tollgate::monitor", event = %json, "Trace event");
            Ok(())
        })
    }
}

/// Forwards events to a bounded channel.
#[derive(Debug, Clone)]
pub struct ChannelMonitorSink {
    sender: mpsc::Sender<TraceEvent>,
}

impl ChannelMonitorSink {
    /// Creates a sink and the receiver its events arrive on.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> (Self, mpsc::Receiver<TraceEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.get());
        (Self { sender }, receiver)
    }
}

impl MonitorSink for ChannelMonitorSink {
    fn publish(&self, event: TraceEvent) -> BoxFuture<'static, Result<(), MonitorError>> {
        let sender = self.sender.clone();
        Box::pin(async move {
            sender
                .send(event)
                .await
                .map_err(|_| MonitorError("monitor channel closed".to_string()))
        })
    }
}

/// Traces every monitored request into a [`MonitorSink`] and records
/// request metrics.
#[derive(Clone)]
pub struct ApiMonitorInterceptor {
    platform: String,
    sink: Arc<dyn MonitorSink>,
}

impl ApiMonitorInterceptor {
    /// Creates the interceptor for a platform.
    #[must_use]
    pub fn new(platform: impl Into<String>, sink: Arc<dyn MonitorSink>) -> Self {
        Self {
            platform: platform.into(),
            sink,
        }
    }

    /// Returns the platform name stamped on events.
    #[must_use]
    pub fn platform(&self) -> &str {
        &self.platform
    }

    fn record_call(ctx: &RequestContext, hook: Hook) {
        let kind = match hook {
            Hook::PostInvoke => "postInvoke",
            _ => "preInvoke",
        };
        ctx.exchange().with_extension_mut::<TraceEvent, _>(|event| {
            event.call_stack.push(CallRecord {
                kind: kind.to_string(),
                middleware: ctx.bindings().name().map(str::to_string),
                time: Utc::now(),
            });
        });
    }

    fn publish(&self, event: TraceEvent) {
        let publish = self.sink.publish(event);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = publish.await {
                        warn!(error = %e, "Monitor event was not published");
                    }
                });
            }
            Err(_) => warn!("No runtime to publish monitor event on"),
        }
    }
}

impl std::fmt::Debug for ApiMonitorInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMonitorInterceptor")
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

impl Interceptor for ApiMonitorInterceptor {
    fn name(&self) -> &str {
        "ApiMonitor"
    }

    fn begin<'a>(&'a self, ctx: &'a RequestContext) -> BoxFuture<'a, Signal> {
        let event = TraceEvent::open(&self.platform, ctx.exchange());
        ctx.exchange().insert_extension(event);
        ready(Signal::Continue)
    }

    fn end<'a>(&'a self, ctx: &'a RequestContext) -> BoxFuture<'a, Signal> {
        let exchange = ctx.exchange();
        let Some(mut event) = exchange.remove_extension::<TraceEvent>() else {
            debug!(request_id = %ctx.request_id(), "No trace event to close");
            return ready(Signal::Continue);
        };
        event.close(exchange);

        record_request(
            ctx.route_name(),
            exchange.method().as_str(),
            exchange.status().as_u16(),
            exchange.elapsed(),
        );
        self.publish(event);
        ready(Signal::Continue)
    }

    fn pre_invoke<'a>(&'a self, ctx: &'a RequestContext) -> BoxFuture<'a, Signal> {
        Self::record_call(ctx, Hook::PreInvoke);
        ready(Signal::Continue)
    }

    fn post_invoke<'a>(&'a self, ctx: &'a RequestContext) -> BoxFuture<'a, Signal> {
        Self::record_call(ctx, Hook::PostInvoke);
        ready(Signal::Continue)
    }
}
