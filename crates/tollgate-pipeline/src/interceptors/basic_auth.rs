//! HTTP Basic authentication for routes that ask for it.

use crate::context::RequestContext;
use crate::interceptor::{Interceptor, Signal};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::header::AUTHORIZATION;
use http::StatusCode;
use tollgate_core::{BoxFuture, Exchange, Rejection};
use tracing::{debug, warn};

/// Auth scheme a route's `security.auth` binding must name to be enforced.
pub const BASIC_AUTH_SCHEME: &str = "BasicAuth";

/// Error code of the 401 response.
pub const UNAUTHENTICATED_CODE: &str = "E_SECAUTH_0001";

/// Checks `Authorization: Basic` credentials against a single user.
///
/// Routes whose bindings do not require [`BASIC_AUTH_SCHEME`] pass through
/// untouched. On a missing or wrong credential the interceptor answers 401
/// with a JSON [`Rejection`] body and fails the `pre_invoke` pass, so the
/// target never runs.
#[derive(Clone)]
pub struct BasicAuthInterceptor {
    username: String,
    password: String,
}

impl BasicAuthInterceptor {
    /// Creates the interceptor for one user.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    fn credentials(exchange: &Exchange) -> Option<(String, String)> {
        let header = exchange.header(AUTHORIZATION.as_str())?;
        let (scheme, encoded) = header.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }
        let decoded = String::from_utf8(STANDARD.decode(encoded.trim()).ok()?).ok()?;
        let (user, pass) = decoded.split_once(':')?;
        Some((user.to_string(), pass.to_string()))
    }

    fn authenticates(&self, exchange: &Exchange) -> bool {
        Self::credentials(exchange)
            .is_some_and(|(user, pass)| user == self.username && pass == self.password)
    }
}

impl std::fmt::Debug for BasicAuthInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthInterceptor")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Interceptor for BasicAuthInterceptor {
    fn name(&self) -> &str {
        "BasicAuth"
    }

    fn pre_invoke<'a>(&'a self, ctx: &'a RequestContext) -> BoxFuture<'a, Signal> {
        Box::pin(async move {
            if ctx.bindings().auth_scheme() != Some(BASIC_AUTH_SCHEME) {
                return Signal::Continue;
            }
            if self.authenticates(ctx.exchange()) {
                debug!(request_id = %ctx.request_id(), route = ctx.route_name(), "Authenticated");
                return Signal::Continue;
            }

            let rejection = Rejection::new(UNAUTHENTICATED_CODE, "Unauthenticated user")
                .with_status(StatusCode::UNAUTHORIZED);
            if let Err(e) = ctx
                .exchange()
                .json(StatusCode::UNAUTHORIZED, &rejection)
                .await
            {
                warn!(request_id = %ctx.request_id(), error = %e, "Could not write 401 response");
            }
            Signal::Fail(rejection)
        })
    }
}
