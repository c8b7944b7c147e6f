//! Audit and metrics sinks.
//!
//! The authorizer reports every terminal outcome to both sinks. Field maps
//! passed here never contain secret material.

use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AuditLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Structured fields attached to one audit event.
pub type AuditFields = BTreeMap<String, String>;

/// Outcome reported for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricOutcome {
    Success,
    Error,
}

impl MetricOutcome {
    /// Metric name suffix.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "errors",
        }
    }
}

impl fmt::Display for MetricOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Receives structured audit events.
pub trait AuditSink: Send + Sync {
    fn log(&self, level: AuditLevel, message: &str, fields: &AuditFields);
}

/// Receives outcome counters.
pub trait MetricsSink: Send + Sync {
    fn record(&self, outcome: MetricOutcome, operation: &str, tags: &BTreeMap<String, String>);
}
