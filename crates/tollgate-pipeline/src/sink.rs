//! Where aborted passes are reported.
//!
//! A failing interceptor normally writes its own terminal response before
//! signalling failure. The pipeline therefore never answers the request on
//! its behalf: it hands the [`ChainAbort`] to a [`FailureSink`] and stops.

use crate::context::RequestContext;
use tollgate_core::ChainAbort;
use tollgate_telemetry::metrics::record_chain_abort;
use tracing::warn;

/// Receives every aborted pass.
pub trait FailureSink: Send + Sync + 'static {
    /// Reports an aborted pass for the request in `ctx`.
    fn report(&self, ctx: &RequestContext, abort: &ChainAbort);
}

/// Logs aborted passes at `warn` and counts them in
/// `tollgate_chain_aborts_total`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFailureSink;

impl FailureSink for LogFailureSink {
    fn report(&self, ctx: &RequestContext, abort: &ChainAbort) {
        record_chain_abort(abort.hook, &abort.interceptor);
        warn!(
            request_id = %ctx.request_id(),
            route = ctx.route_name(),
            interceptor = %abort.interceptor,
            hook = abort.hook,
            error_code = %abort.rejection.error_code,
            status = ?abort.rejection.http_status,
            "Error occurred while going through the interceptor chain: {}",
            abort.rejection.reason
        );
    }
}
