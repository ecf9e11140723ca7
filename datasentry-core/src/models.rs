//! Core data model for quality assessments.
//!
//! Samples and rule sets are inputs owned by collaborators and read-only to
//! the engine. Everything else in this module is created fresh per
//! evaluation and carries only counts, ratios, and scores - never raw data
//! values beyond the offending column or rule name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An in-memory tabular snapshot fetched for one evaluation.
///
/// Rows are JSON objects mapping column name to value (number, string,
/// boolean, or null). Samples are immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub source_id: String,
    pub table_id: String,
    pub rows: Vec<serde_json::Value>,
    pub fetched_at: DateTime<Utc>,
}

impl Sample {
    /// Creates a new sample stamped with the current time.
    pub fn new(
        source_id: impl Into<String>,
        table_id: impl Into<String>,
        rows: Vec<serde_json::Value>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            table_id: table_id.into(),
            rows,
            fetched_at: Utc::now(),
        }
    }

    /// Number of rows in the sample.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True if any row carries the named column.
    pub fn has_column(&self, column: &str) -> bool {
        self.rows
            .iter()
            .any(|row| row.as_object().is_some_and(|obj| obj.contains_key(column)))
    }

    /// Iterates the values present for a column, one per row that carries it.
    /// Missing keys are skipped; explicit nulls are yielded.
    pub fn column_values<'a>(
        &'a self,
        column: &'a str,
    ) -> impl Iterator<Item = &'a serde_json::Value> + 'a {
        self.rows
            .iter()
            .filter_map(move |row| row.as_object().and_then(|obj| obj.get(column)))
    }

    /// Extracts the finite numeric values of a column.
    ///
    /// Numbers stored as strings are accepted; non-finite values ("NaN",
    /// "inf") are rejected so they cannot poison statistical calculations.
    pub fn numeric_values(&self, column: &str) -> Vec<f64> {
        self.column_values(column)
            .filter_map(extract_numeric)
            .collect()
    }
}

/// Extracts a finite numeric value from a JSON value.
pub(crate) fn extract_numeric(value: &serde_json::Value) -> Option<f64> {
    let numeric = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    };
    match numeric {
        Some(v) if v.is_finite() => Some(v),
        _ => None,
    }
}

/// One of the six quality dimensions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Completeness,
    Accuracy,
    Consistency,
    Timeliness,
    Validity,
    Uniqueness,
}

impl Dimension {
    /// All dimensions in canonical order.
    pub const ALL: [Dimension; 6] = [
        Dimension::Completeness,
        Dimension::Accuracy,
        Dimension::Consistency,
        Dimension::Timeliness,
        Dimension::Validity,
        Dimension::Uniqueness,
    ];

    /// Stable lowercase name, used for metric labels and issue output.
    pub fn name(&self) -> &'static str {
        match self {
            Dimension::Completeness => "completeness",
            Dimension::Accuracy => "accuracy",
            Dimension::Consistency => "consistency",
            Dimension::Timeliness => "timeliness",
            Dimension::Validity => "validity",
            Dimension::Uniqueness => "uniqueness",
        }
    }
}

/// Severity of a single quality finding.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Medium,
    High,
    Critical,
}

/// Distinguishes real check outcomes from evaluator-internal failures.
///
/// `Error` issues keep their diagnostic value but are excluded from the
/// pass/fail counting in the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    #[default]
    Check,
    Error,
}

/// A single explainable quality finding tied to a dimension, column, or rule.
///
/// Purely descriptive; producing an issue never raises.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub dimension: Dimension,
    pub severity: Severity,
    #[serde(default)]
    pub kind: IssueKind,
    /// Column name, column set, or rule name the finding refers to
    pub subject: String,
    /// Sub-check score in [0, 100]
    pub score: f64,
    pub description: String,
}

impl Issue {
    /// Creates a check-kind issue.
    pub fn check(
        dimension: Dimension,
        severity: Severity,
        subject: impl Into<String>,
        score: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            dimension,
            severity,
            kind: IssueKind::Check,
            subject: subject.into(),
            score,
            description: description.into(),
        }
    }

    /// Creates an error-kind issue for an evaluator-internal failure.
    pub fn error(
        dimension: Dimension,
        subject: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            dimension,
            severity: Severity::Critical,
            kind: IssueKind::Error,
            subject: subject.into(),
            score: 0.0,
            description: description.into(),
        }
    }
}

/// Result of evaluating one dimension against one sample.
///
/// `score` is `None` when the rule set configured no applicable rule for the
/// dimension (or every configured rule was skipped); such dimensions are
/// excluded from the overall mean rather than defaulted.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DimensionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub issues: Vec<Issue>,
}

impl DimensionResult {
    /// A dimension with no applicable rules.
    pub fn not_applicable() -> Self {
        Self::default()
    }

    /// Builds a result from collected sub-scores and issues.
    ///
    /// The dimension score is the arithmetic mean of the sub-scores, clamped
    /// to [0, 100]; no sub-scores means no score.
    pub fn from_scores(scores: &[f64], issues: Vec<Issue>) -> Self {
        let score = if scores.is_empty() {
            None
        } else {
            Some((scores.iter().sum::<f64>() / scores.len() as f64).clamp(0.0, 100.0))
        };
        Self { score, issues }
    }
}

/// Statistical method used for anomaly detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyMethod {
    #[default]
    Zscore,
    Iqr,
}

impl AnomalyMethod {
    pub fn name(&self) -> &'static str {
        match self {
            AnomalyMethod::Zscore => "zscore",
            AnomalyMethod::Iqr => "iqr",
        }
    }
}

/// Statistical outliers detected in one column by one method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub column: String,
    pub method: AnomalyMethod,
    pub count: u64,
    pub percentage_of_rows: f64,
}

/// Historical mean/std-dev of one metric, used as a drift reference.
///
/// A missing entry or `std_dev == 0` makes drift undefined for that metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineStats {
    pub mean: f64,
    pub std_dev: f64,
    pub sample_count: u64,
}

/// Per-dimension results for one assessment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DimensionSet {
    pub completeness: DimensionResult,
    pub accuracy: DimensionResult,
    pub consistency: DimensionResult,
    pub timeliness: DimensionResult,
    pub validity: DimensionResult,
    pub uniqueness: DimensionResult,
}

impl DimensionSet {
    /// Iterates the six results in canonical dimension order.
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, &DimensionResult)> {
        [
            (Dimension::Completeness, &self.completeness),
            (Dimension::Accuracy, &self.accuracy),
            (Dimension::Consistency, &self.consistency),
            (Dimension::Timeliness, &self.timeliness),
            (Dimension::Validity, &self.validity),
            (Dimension::Uniqueness, &self.uniqueness),
        ]
        .into_iter()
    }

    /// Returns the result for one dimension.
    pub fn get(&self, dimension: Dimension) -> &DimensionResult {
        match dimension {
            Dimension::Completeness => &self.completeness,
            Dimension::Accuracy => &self.accuracy,
            Dimension::Consistency => &self.consistency,
            Dimension::Timeliness => &self.timeliness,
            Dimension::Validity => &self.validity,
            Dimension::Uniqueness => &self.uniqueness,
        }
    }
}

/// Complete quality assessment for one (source, table) unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub id: Uuid,
    pub source_id: String,
    pub table_id: String,
    pub timestamp: DateTime<Utc>,
    pub dimensions: DimensionSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift_score: Option<f64>,
    /// Mean of the dimension scores that had at least one applicable rule
    pub overall_score: f64,
    pub anomalies: Vec<Anomaly>,
    pub checks_passed: u64,
    pub checks_failed: u64,
    /// Union of all dimension issues
    pub issues: Vec<Issue>,
}

impl AssessmentResult {
    /// Number of anomaly findings in this assessment.
    pub fn anomalies_detected(&self) -> u64 {
        self.anomalies.len() as u64
    }
}

/// Kind of a derived alert, matching the wire names consumers key on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    OverallQualityDegradation,
    AnomalySpike,
    HighFailureRate,
    AccuracyDegradation,
    ModelDrift,
    LowConfidence,
}

impl AlertKind {
    pub fn name(&self) -> &'static str {
        match self {
            AlertKind::OverallQualityDegradation => "overall_quality_degradation",
            AlertKind::AnomalySpike => "anomaly_spike",
            AlertKind::HighFailureRate => "high_failure_rate",
            AlertKind::AccuracyDegradation => "accuracy_degradation",
            AlertKind::ModelDrift => "model_drift",
            AlertKind::LowConfidence => "low_confidence",
        }
    }
}

/// Alert severity, ordered least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

/// A derived notification for one threshold crossing.
///
/// Alerts are not stored state: re-evaluating the same assessment with the
/// same thresholds yields an identical alert list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub subject_id: String,
    pub message: String,
    pub observed_value: f64,
    pub threshold: f64,
    pub timestamp: DateTime<Utc>,
}
