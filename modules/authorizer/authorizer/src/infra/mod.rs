//! Infrastructure adapters.

pub mod jwks_http;
pub mod tracing_sinks;

pub use jwks_http::HttpKeySetFetcher;
pub use tracing_sinks::{TracingAuditSink, TracingMetricsSink};
