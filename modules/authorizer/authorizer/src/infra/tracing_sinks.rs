//! Audit and metrics sinks backed by `tracing`.

use std::collections::BTreeMap;

use authorizer_sdk::sinks::{AuditFields, AuditLevel, MetricOutcome};
use authorizer_sdk::{AuditSink, MetricsSink};

const AUDIT_TARGET: &str = "authorizer::audit";
const METRICS_TARGET: &str = "authorizer::metrics";

/// Emits audit events as `tracing` events with the fields rendered as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn log(&self, level: AuditLevel, message: &str, fields: &AuditFields) {
        let fields = render(fields);
        match level {
            AuditLevel::Debug => tracing::debug!(target: AUDIT_TARGET, %fields, "{message}"),
            AuditLevel::Info => tracing::info!(target: AUDIT_TARGET, %fields, "{message}"),
            AuditLevel::Warn => tracing::warn!(target: AUDIT_TARGET, %fields, "{message}"),
            AuditLevel::Error => tracing::error!(target: AUDIT_TARGET, %fields, "{message}"),
        }
    }
}

/// Emits counters as `tracing` events named `<prefix>.<operation>.<outcome>`.
#[derive(Debug, Clone)]
pub struct TracingMetricsSink {
    prefix: String,
}

impl TracingMetricsSink {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    #[must_use]
    pub fn metric_name(&self, outcome: MetricOutcome, operation: &str) -> String {
        format!("{}.{operation}.{outcome}", self.prefix)
    }
}

impl MetricsSink for TracingMetricsSink {
    fn record(&self, outcome: MetricOutcome, operation: &str, tags: &BTreeMap<String, String>) {
        let metric = self.metric_name(outcome, operation);
        let tags = render(tags);
        tracing::info!(target: METRICS_TARGET, %metric, %tags, value = 1_u64, "counter");
    }
}

fn render(fields: &BTreeMap<String, String>) -> String {
    serde_json::to_string(fields).unwrap_or_default()
}
