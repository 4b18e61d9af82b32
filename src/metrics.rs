//! Observability sink.
//!
//! Every classification attempt, dispatch, and delivery emits a structured
//! `MetricRecord` to a caller-supplied sink. The default sink forwards to
//! `tracing`; tests use `CaptureSink` to assert on emitted records.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// What kind of operation a metric describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Classification,
    CacheHit,
    Escalation,
    Dispatch,
    Delivery,
}

/// A single structured metric record.
#[derive(Debug, Clone, Serialize)]
pub struct MetricRecord {
    pub timestamp: DateTime<Utc>,
    pub kind: MetricKind,
    pub latency_ms: u64,
    pub success: bool,
    pub metadata: serde_json::Value,
}

impl MetricRecord {
    pub fn new(
        kind: MetricKind,
        latency_ms: u64,
        success: bool,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            latency_ms,
            success,
            metadata,
        }
    }
}

/// Sink for metric records. Implementations must be cheap — callers emit
/// on hot paths and never await the sink.
pub trait MetricsSink: Send + Sync {
    fn record(&self, metric: MetricRecord);
}

/// Default sink — forwards records to `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn record(&self, metric: MetricRecord) {
        tracing::info!(
            kind = ?metric.kind,
            latency_ms = metric.latency_ms,
            success = metric.success,
            metadata = %metric.metadata,
            "metric"
        );
    }
}

/// Test sink that accumulates records for assertions.
#[derive(Debug, Default)]
pub struct CaptureSink {
    records: Mutex<Vec<MetricRecord>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<MetricRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Records of a given kind, in emission order.
    pub fn of_kind(&self, kind: MetricKind) -> Vec<MetricRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.kind == kind)
            .collect()
    }
}

impl MetricsSink for CaptureSink {
    fn record(&self, metric: MetricRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(metric);
        }
    }
}
