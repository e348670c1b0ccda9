//! Built-in interceptors.
//!
//! | Interceptor | Name | Hooks |
//! |---|---|---|
//! | [`BasicAuthInterceptor`] | `BasicAuth` | `pre_invoke` |
//! | [`AccessLogInterceptor`] | `SimpleLogger` | `pre_invoke`, `post_invoke` |
//! | [`ApiMonitorInterceptor`] | `ApiMonitor` | all four |

mod access_log;
mod basic_auth;
mod monitor;

pub use access_log::AccessLogInterceptor;
pub use basic_auth::{BasicAuthInterceptor, BASIC_AUTH_SCHEME, UNAUTHENTICATED_CODE};
pub use monitor::{
    ApiMonitorInterceptor, CallRecord, ChannelMonitorSink, HttpEventData, LogMonitorSink,
    MonitorError, MonitorSink, TraceEvent, HTTP_EVENT,
};
