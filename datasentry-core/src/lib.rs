//! DataSentry core: rule-driven data quality scoring, anomaly and drift
//! detection, and deterministic alert decisions for tabular samples.
//!
//! The crate is a pure computation engine. It consumes immutable row
//! samples and declarative rule sets, scores six quality dimensions,
//! detects statistical anomalies and model drift, and derives alerts from
//! fixed thresholds. Storage, scheduling, inference, metrics exposition,
//! and alert transport are injected through the traits in [`ports`].
//!
//! # Example
//!
//! ```
//! use datasentry_core::{
//!     AlertThresholds, RuleSet, Sample, ValidatorRegistry, assess_sample,
//! };
//! use serde_json::json;
//!
//! let sample = Sample::new(
//!     "timing",
//!     "results",
//!     vec![
//!         json!({"rider_id": 1, "speed_kmh": 42.0}),
//!         json!({"rider_id": 2, "speed_kmh": 38.5}),
//!     ],
//! );
//! let rules: RuleSet = serde_json::from_value(json!({
//!     "required_columns": ["rider_id"],
//!     "validation_rules": {"speed_kmh": {"min_value": 0, "max_value": 120}}
//! }))
//! .unwrap();
//!
//! let result = assess_sample(
//!     &sample,
//!     &rules,
//!     &AlertThresholds::default(),
//!     &ValidatorRegistry::new(),
//!     chrono::Utc::now(),
//! );
//! assert_eq!(result.overall_score, 100.0);
//! ```

pub mod aggregate;
pub mod alert;
pub mod anomaly;
pub mod drift;
pub mod error;
pub mod logging;
pub mod model;
pub mod models;
pub mod orchestrator;
pub mod ports;
pub mod quality;
pub mod rules;

pub use aggregate::aggregate;
pub use alert::{evaluate_alerts, evaluate_model_alerts};
pub use anomaly::detect_anomalies;
pub use drift::{baseline_from_history, drift_score};
pub use error::{DataSentryError, Result};
pub use logging::init_logging;
pub use model::{
    ClassificationMetrics, ModelAssessment, PredictionBatch, classification_metrics,
    confidence_stats,
};
pub use models::{
    Alert, AlertKind, AlertSeverity, Anomaly, AnomalyMethod, AssessmentResult, BaselineStats,
    Dimension, DimensionResult, DimensionSet, Issue, IssueKind, Sample, Severity,
};
pub use orchestrator::{
    CycleSummary, ModelSpec, Orchestrator, OrchestratorSettings, TableSpec, assess_sample,
};
pub use ports::{
    AlertSink, BaselineStore, InferenceProvider, MetricsSink, NullMetricsSink, ResultStore,
    SampleSource,
};
pub use quality::{Validator, ValidatorRegistry};
pub use rules::{AlertThresholds, RuleSet};
