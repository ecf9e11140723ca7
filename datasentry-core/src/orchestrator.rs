//! Assessment orchestration: composing the pure engine with collaborators.
//!
//! The orchestrator owns no scoring logic. It fetches samples, runs the
//! pure assessment, derives alerts, and hands the outcomes to the injected
//! stores and sinks. One unit's failure degrades to that unit: the cycle
//! always continues for sibling units.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use uuid::Uuid;

use crate::aggregate::aggregate;
use crate::alert::{evaluate_alerts, evaluate_model_alerts};
use crate::anomaly::detect_anomalies;
use crate::drift::drift_score;
use crate::error::{DataSentryError, Result};
use crate::model::{ModelAssessment, classification_metrics, confidence_stats};
use crate::models::{Alert, AssessmentResult, Dimension, DimensionSet, Issue, Sample};
use crate::ports::{
    AlertSink, BaselineStore, InferenceProvider, MetricsSink, ResultStore, SampleSource,
};
use crate::quality::{
    ValidatorRegistry, evaluate_accuracy, evaluate_completeness, evaluate_consistency,
    evaluate_timeliness, evaluate_uniqueness, evaluate_validity,
};
use crate::rules::{AlertThresholds, RuleSet};

/// One (source, table) unit of work for a cycle.
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub source_id: String,
    pub table_id: String,
    pub sample_limit: usize,
    pub rules: RuleSet,
    pub thresholds: AlertThresholds,
}

/// One model evaluation unit for a cycle.
///
/// The labeled evaluation batch is fetched like any table sample; the truth
/// labels live in `label_column` and the remaining columns are the feature
/// rows handed to the inference provider.
#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub model_id: String,
    pub source_id: String,
    pub table_id: String,
    pub label_column: String,
    pub sample_limit: usize,
    pub thresholds: AlertThresholds,
}

/// Orchestrator tuning knobs.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Per-fetch and per-inference I/O timeout
    pub io_timeout: Duration,
    /// Maximum units assessed concurrently in one cycle
    pub max_concurrency: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            io_timeout: Duration::from_secs(30),
            max_concurrency: 4,
        }
    }
}

/// Aggregate outcome of one assessment cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleSummary {
    pub tables_assessed: usize,
    pub models_assessed: usize,
    pub units_failed: usize,
    pub alerts_raised: usize,
}

/// Runs the six evaluators, anomaly detection, and aggregation over one
/// sample. Pure: same sample, rules, thresholds, and instant always yield
/// the same scores, issues, and alert decisions.
pub fn assess_sample(
    sample: &Sample,
    rules: &RuleSet,
    thresholds: &AlertThresholds,
    validators: &ValidatorRegistry,
    now: DateTime<Utc>,
) -> AssessmentResult {
    let dimensions = DimensionSet {
        completeness: evaluate_completeness(
            sample,
            rules,
            thresholds.dimension_minimum(Dimension::Completeness),
        ),
        accuracy: evaluate_accuracy(sample, rules),
        consistency: evaluate_consistency(sample, rules),
        timeliness: evaluate_timeliness(sample, rules, now),
        validity: evaluate_validity(sample, rules, validators),
        uniqueness: evaluate_uniqueness(sample, rules),
    };
    let anomalies = detect_anomalies(sample, rules);
    aggregate(
        sample.source_id.clone(),
        sample.table_id.clone(),
        now,
        dimensions,
        anomalies,
        None,
        thresholds,
    )
}

/// Drives assessment cycles over injected collaborators.
pub struct Orchestrator {
    samples: Arc<dyn SampleSource>,
    baselines: Arc<dyn BaselineStore>,
    results: Arc<dyn ResultStore>,
    alerts: Arc<dyn AlertSink>,
    metrics: Arc<dyn MetricsSink>,
    inference: Option<Arc<dyn InferenceProvider>>,
    validators: ValidatorRegistry,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    /// Creates an orchestrator for table assessment only.
    pub fn new(
        samples: Arc<dyn SampleSource>,
        baselines: Arc<dyn BaselineStore>,
        results: Arc<dyn ResultStore>,
        alerts: Arc<dyn AlertSink>,
        metrics: Arc<dyn MetricsSink>,
        validators: ValidatorRegistry,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            samples,
            baselines,
            results,
            alerts,
            metrics,
            inference: None,
            validators,
            settings,
        }
    }

    /// Attaches an inference provider, enabling model assessment.
    #[must_use]
    pub fn with_inference(mut self, inference: Arc<dyn InferenceProvider>) -> Self {
        self.inference = Some(inference);
        self
    }

    /// Assesses one table unit end to end.
    ///
    /// Persistence and alert delivery are best-effort; only fetch failures
    /// (including timeouts) abort the unit. An aborted unit still records a
    /// degraded result carrying one error-kind issue and one failed check.
    pub async fn assess_table(&self, spec: &TableSpec) -> Result<(AssessmentResult, Vec<Alert>)> {
        let unit = format!("{}.{}", spec.source_id, spec.table_id);
        let sample = match self
            .fetch_sample(&spec.source_id, &spec.table_id, spec.sample_limit)
            .await
        {
            Ok(sample) => sample,
            Err(e) => {
                tracing::warn!(unit = %unit, error = %e, "sample fetch failed");
                self.record_fetch_failure(spec, &e).await;
                return Err(e);
            }
        };
        tracing::debug!(unit = %unit, rows = sample.row_count(), "sample fetched");

        let result = assess_sample(
            &sample,
            &spec.rules,
            &spec.thresholds,
            &self.validators,
            Utc::now(),
        );
        let alerts = evaluate_alerts(&result, &spec.thresholds);
        tracing::info!(
            unit = %unit,
            overall = result.overall_score,
            checks_failed = result.checks_failed,
            alerts = alerts.len(),
            "table assessed"
        );

        self.emit_table_metrics(&result);
        if let Err(e) = self.results.persist(&result).await {
            tracing::warn!(unit = %unit, error = %e, "assessment not persisted");
        }
        self.deliver_alerts(&alerts).await;

        Ok((result, alerts))
    }

    /// Records the degraded outcome of a unit whose sample fetch failed.
    ///
    /// No dimension is scored, but the failure itself is a first-class
    /// result: one error-kind issue, one failed check, and the usual
    /// metrics, persistence, and alert flow.
    async fn record_fetch_failure(&self, spec: &TableSpec, error: &DataSentryError) {
        let unit = format!("{}.{}", spec.source_id, spec.table_id);
        let result = AssessmentResult {
            id: Uuid::new_v4(),
            source_id: spec.source_id.clone(),
            table_id: spec.table_id.clone(),
            timestamp: Utc::now(),
            dimensions: DimensionSet::default(),
            drift_score: None,
            overall_score: 0.0,
            anomalies: Vec::new(),
            checks_passed: 0,
            checks_failed: 1,
            issues: vec![Issue::error(
                Dimension::Completeness,
                &unit,
                format!("sample fetch failed: {}", error),
            )],
        };
        let alerts = evaluate_alerts(&result, &spec.thresholds);
        self.emit_table_metrics(&result);
        if let Err(e) = self.results.persist(&result).await {
            tracing::warn!(unit = %unit, error = %e, "degraded assessment not persisted");
        }
        self.deliver_alerts(&alerts).await;
    }

    /// Assesses one model unit end to end.
    pub async fn assess_model(&self, spec: &ModelSpec) -> Result<(ModelAssessment, Vec<Alert>)> {
        let Some(inference) = &self.inference else {
            return Err(DataSentryError::config(
                "model assessment requested without an inference provider",
            ));
        };

        let sample = self
            .fetch_sample(&spec.source_id, &spec.table_id, spec.sample_limit)
            .await?;
        let truth = truth_labels(&sample, &spec.label_column)?;
        let features = feature_rows(&sample, &spec.label_column);

        let batch = tokio::time::timeout(
            self.settings.io_timeout,
            inference.predict(&spec.model_id, &features),
        )
        .await
        .map_err(|_| DataSentryError::data_access(&spec.model_id, "inference timed out"))??;

        let metrics = classification_metrics(&truth, &batch.predictions)?;
        let (confidence_mean, confidence_std) = confidence_stats(&batch.confidences);

        let baseline = match self.baselines.baseline(&spec.model_id).await {
            Ok(baseline) => baseline,
            Err(e) => {
                tracing::warn!(model = %spec.model_id, error = %e, "baseline unavailable, drift skipped");
                Default::default()
            }
        };
        let drift = drift_score(&metrics.as_map(), &baseline);

        let assessment = ModelAssessment {
            id: Uuid::new_v4(),
            model_id: spec.model_id.clone(),
            timestamp: Utc::now(),
            metrics,
            predictions_count: batch.predictions.len() as u64,
            confidence_mean,
            confidence_std,
            drift_score: drift,
        };
        let alerts = evaluate_model_alerts(&assessment, &spec.thresholds);
        tracing::info!(
            model = %spec.model_id,
            accuracy = metrics.accuracy,
            drift = drift,
            alerts = alerts.len(),
            "model assessed"
        );

        self.emit_model_metrics(&assessment);
        if let Err(e) = self.results.persist_model(&assessment).await {
            tracing::warn!(model = %spec.model_id, error = %e, "model assessment not persisted");
        }
        self.deliver_alerts(&alerts).await;

        Ok((assessment, alerts))
    }

    /// Runs one full cycle over every configured unit with bounded
    /// concurrency. Ordering across units is not guaranteed; a failed unit
    /// is logged and counted, never fatal.
    pub async fn run_cycle(&self, tables: &[TableSpec], models: &[ModelSpec]) -> CycleSummary {
        let mut summary = CycleSummary::default();

        let mut table_outcomes = futures::stream::iter(
            tables
                .iter()
                .map(|spec| async move { (spec, self.assess_table(spec).await) }),
        )
        .buffer_unordered(self.settings.max_concurrency);
        while let Some((spec, outcome)) = table_outcomes.next().await {
            match outcome {
                Ok((_, alerts)) => {
                    summary.tables_assessed += 1;
                    summary.alerts_raised += alerts.len();
                }
                Err(e) => {
                    summary.units_failed += 1;
                    tracing::warn!(
                        source = %spec.source_id,
                        table = %spec.table_id,
                        error = %e,
                        "table assessment failed"
                    );
                }
            }
        }
        drop(table_outcomes);

        let mut model_outcomes = futures::stream::iter(
            models
                .iter()
                .map(|spec| async move { (spec, self.assess_model(spec).await) }),
        )
        .buffer_unordered(self.settings.max_concurrency);
        while let Some((spec, outcome)) = model_outcomes.next().await {
            match outcome {
                Ok((_, alerts)) => {
                    summary.models_assessed += 1;
                    summary.alerts_raised += alerts.len();
                }
                Err(e) => {
                    summary.units_failed += 1;
                    tracing::warn!(model = %spec.model_id, error = %e, "model assessment failed");
                }
            }
        }

        summary
    }

    async fn fetch_sample(&self, source_id: &str, table_id: &str, limit: usize) -> Result<Sample> {
        let unit = format!("{}.{}", source_id, table_id);
        tokio::time::timeout(
            self.settings.io_timeout,
            self.samples.fetch(source_id, table_id, limit),
        )
        .await
        .map_err(|_| DataSentryError::data_access(&unit, "sample fetch timed out"))?
    }

    async fn deliver_alerts(&self, alerts: &[Alert]) {
        for alert in alerts {
            if let Err(first) = self.alerts.deliver(alert).await {
                tracing::warn!(kind = alert.kind.name(), error = %first, "alert delivery failed, retrying");
                if let Err(second) = self.alerts.deliver(alert).await {
                    tracing::warn!(kind = alert.kind.name(), error = %second, "alert dropped after retry");
                }
            }
        }
    }

    fn emit_table_metrics(&self, result: &AssessmentResult) {
        let labels = [
            ("source", result.source_id.as_str()),
            ("table", result.table_id.as_str()),
        ];
        for (dimension, dim_result) in result.dimensions.iter() {
            if let Some(score) = dim_result.score {
                let labels = [labels[0], labels[1], ("dimension", dimension.name())];
                self.metrics.gauge("quality_dimension_score", &labels, score);
            }
        }
        self.metrics
            .gauge("quality_overall_score", &labels, result.overall_score);
        self.metrics
            .counter("quality_anomalies_total", &labels, result.anomalies_detected());
        self.metrics
            .counter("quality_checks_passed_total", &labels, result.checks_passed);
        self.metrics
            .counter("quality_checks_failed_total", &labels, result.checks_failed);
    }

    fn emit_model_metrics(&self, assessment: &ModelAssessment) {
        let labels = [("model", assessment.model_id.as_str())];
        self.metrics
            .gauge("model_accuracy", &labels, assessment.metrics.accuracy);
        self.metrics
            .gauge("model_f1", &labels, assessment.metrics.f1);
        self.metrics
            .gauge("model_drift_score", &labels, assessment.drift_score);
        self.metrics
            .gauge("model_confidence_mean", &labels, assessment.confidence_mean);
    }
}

/// Extracts truth labels from the labeled evaluation batch.
///
/// Every row must carry a non-null label; string labels are used verbatim
/// and other scalars via their JSON form.
fn truth_labels(sample: &Sample, label_column: &str) -> Result<Vec<String>> {
    sample
        .rows
        .iter()
        .map(|row| {
            row.as_object()
                .and_then(|obj| obj.get(label_column))
                .filter(|v| !v.is_null())
                .map(|v| match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .ok_or_else(|| {
                    DataSentryError::evaluation(
                        "model",
                        format!("row missing label column '{}'", label_column),
                    )
                })
        })
        .collect()
}

/// Feature rows for inference: the sampled rows with the truth-label
/// column removed, so the provider never sees the answer.
fn feature_rows(sample: &Sample, label_column: &str) -> Vec<serde_json::Value> {
    sample
        .rows
        .iter()
        .map(|row| {
            let mut row = row.clone();
            if let Some(obj) = row.as_object_mut() {
                obj.remove(label_column);
            }
            row
        })
        .collect()
}
