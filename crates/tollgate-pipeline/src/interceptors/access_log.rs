//! Entry/exit access logging.

use crate::context::RequestContext;
use crate::interceptor::{ready, Interceptor, Signal};
use chrono::Utc;
use tollgate_core::{BoxFuture, Exchange};
use tracing::info;

/// Logs `[Entry]` before and `[Exit]` after every proxied step.
///
/// Events are emitted under the `tollgate::access` target so they can be
/// routed separately with an `EnvFilter` directive.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessLogInterceptor;

impl AccessLogInterceptor {
    /// Creates the interceptor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn protocol(exchange: &Exchange) -> String {
        exchange
            .header("x-forwarded-protocol")
            .or_else(|| exchange.request().uri().scheme_str())
            .unwrap_or("http")
            .to_string()
    }

    fn session_id(exchange: &Exchange) -> &str {
        exchange.header("x-session-id").unwrap_or("-")
    }

    fn resource_path(exchange: &Exchange) -> &str {
        exchange
            .request()
            .uri()
            .path_and_query()
            .map_or("/", |p| p.as_str())
    }
}

impl Interceptor for AccessLogInterceptor {
    fn name(&self) -> &str {
        "SimpleLogger"
    }

    fn pre_invoke<'a>(&'a self, ctx: &'a RequestContext) -> BoxFuture<'a, Signal> {
        let exchange = ctx.exchange();
        info!(
            target: "tollgate::access",
            request_id = %ctx.request_id(),
            resource_path = Self::resource_path(exchange),
            protocol = %Self::protocol(exchange),
            method = %exchange.method(),
            session_id = Self::session_id(exchange),
            route = ctx.route_name(),
            at = %Utc::now().to_rfc3339(),
            "[Entry]"
        );
        ready(Signal::Continue)
    }

    fn post_invoke<'a>(&'a self, ctx: &'a RequestContext) -> BoxFuture<'a, Signal> {
        let exchange = ctx.exchange();
        info!(
            target: "tollgate::access",
            request_id = %ctx.request_id(),
            resource_path = Self::resource_path(exchange),
            protocol = %Self::protocol(exchange),
            method = %exchange.method(),
            session_id = Self::session_id(exchange),
            status_code = exchange.status().as_u16(),
            route = ctx.route_name(),
            at = %Utc::now().to_rfc3339(),
            "[Exit]"
        );
        ready(Signal::Continue)
    }
}
