//! Collaborator contracts consumed and produced by the engine.
//!
//! These are in-process boundaries: storage, inference, alert transport,
//! and metrics exposition are all injected. Every trait is object safe so
//! binaries can assemble the engine from trait objects.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{ModelAssessment, PredictionBatch};
use crate::models::{Alert, AssessmentResult, BaselineStats, Sample};

/// Fetches tabular snapshots for assessment.
#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Fetches up to `limit` rows for one (source, table) unit.
    async fn fetch(&self, source_id: &str, table_id: &str, limit: usize) -> Result<Sample>;
}

/// Provides historical baseline statistics for drift scoring.
#[async_trait]
pub trait BaselineStore: Send + Sync {
    /// Returns per-metric baselines for a model; empty when none recorded.
    async fn baseline(&self, model_id: &str) -> Result<HashMap<String, BaselineStats>>;
}

/// Persists assessment outcomes. Failures are best-effort: they are logged
/// by the orchestrator and never fail the assessment.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persists one table assessment as a single all-or-nothing write.
    async fn persist(&self, result: &AssessmentResult) -> Result<()>;

    /// Persists one model assessment.
    async fn persist_model(&self, assessment: &ModelAssessment) -> Result<()>;
}

/// Delivers derived alerts to an external channel.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Delivers one alert. The orchestrator retries once on failure, then
    /// logs and drops.
    async fn deliver(&self, alert: &Alert) -> Result<()>;
}

/// Runs model inference over sampled feature rows.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Predicts labels and confidences for each row, in row order.
    async fn predict(&self, model_id: &str, rows: &[serde_json::Value])
    -> Result<PredictionBatch>;
}

/// Fire-and-forget metrics exposition.
///
/// Synchronous and infallible: emission must never block or fail an
/// assessment, so implementations swallow their own errors.
pub trait MetricsSink: Send + Sync {
    /// Records a gauge observation.
    fn gauge(&self, name: &str, labels: &[(&str, &str)], value: f64);

    /// Adds to a counter.
    fn counter(&self, name: &str, labels: &[(&str, &str)], value: u64);
}

/// A metrics sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMetricsSink;

impl MetricsSink for NullMetricsSink {
    fn gauge(&self, _name: &str, _labels: &[(&str, &str)], _value: f64) {}
    fn counter(&self, _name: &str, _labels: &[(&str, &str)], _value: u64) {}
}
