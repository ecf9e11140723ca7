//! File-backed collaborators for the CLI.
//!
//! The engine core never touches the filesystem; these adapters implement
//! its ports over local JSON files and the log stream.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use datasentry_core::{
    Alert, AlertSink, AssessmentResult, BaselineStats, BaselineStore, DataSentryError, MetricsSink,
    ModelAssessment, Result, ResultStore, Sample, SampleSource,
};

/// Reads samples from JSON files registered per (source, table) unit.
pub struct FileSampleSource {
    paths: HashMap<String, PathBuf>,
}

impl FileSampleSource {
    pub fn new(paths: HashMap<String, PathBuf>) -> Self {
        Self { paths }
    }
}

#[async_trait]
impl SampleSource for FileSampleSource {
    async fn fetch(&self, source_id: &str, table_id: &str, limit: usize) -> Result<Sample> {
        let unit = format!("{}.{}", source_id, table_id);
        let path = self
            .paths
            .get(&unit)
            .ok_or_else(|| DataSentryError::data_access(&unit, "no data file configured"))?;
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DataSentryError::data_access(&unit, e.to_string()))?;
        let rows: Vec<serde_json::Value> = serde_json::from_str(&raw)
            .map_err(|e| DataSentryError::serialization(format!("parsing {}", path.display()), e))?;
        Ok(Sample::new(
            source_id,
            table_id,
            rows.into_iter().take(limit).collect(),
        ))
    }
}

/// Writes each assessment to its own JSON file under an output directory.
pub struct JsonResultStore {
    output_dir: PathBuf,
}

impl JsonResultStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    async fn write_json(&self, file_name: &str, payload: String) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| DataSentryError::persistence(e.to_string()))?;
        let path = self.output_dir.join(file_name);
        // Write to a sibling temp file and rename so readers never observe
        // a partial result.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, payload)
            .await
            .map_err(|e| DataSentryError::persistence(e.to_string()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| DataSentryError::persistence(e.to_string()))?;
        debug!(path = %path.display(), "assessment written");
        Ok(())
    }
}

#[async_trait]
impl ResultStore for JsonResultStore {
    async fn persist(&self, result: &AssessmentResult) -> Result<()> {
        let payload = serde_json::to_string_pretty(result)
            .map_err(|e| DataSentryError::serialization("encoding assessment", e))?;
        let file_name = format!(
            "{}_{}_{}.json",
            result.source_id,
            result.table_id,
            result.timestamp.format("%Y%m%dT%H%M%S")
        );
        self.write_json(&file_name, payload).await
    }

    async fn persist_model(&self, assessment: &ModelAssessment) -> Result<()> {
        let payload = serde_json::to_string_pretty(assessment)
            .map_err(|e| DataSentryError::serialization("encoding model assessment", e))?;
        let file_name = format!(
            "{}_{}.json",
            assessment.model_id,
            assessment.timestamp.format("%Y%m%dT%H%M%S")
        );
        self.write_json(&file_name, payload).await
    }
}

/// Delivers alerts to the log stream.
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn deliver(&self, alert: &Alert) -> Result<()> {
        warn!(
            kind = alert.kind.name(),
            severity = ?alert.severity,
            subject = %alert.subject_id,
            observed = alert.observed_value,
            threshold = alert.threshold,
            "{}",
            alert.message
        );
        Ok(())
    }
}

/// Emits metrics as debug log lines.
pub struct LogMetricsSink;

impl MetricsSink for LogMetricsSink {
    fn gauge(&self, name: &str, labels: &[(&str, &str)], value: f64) {
        debug!(metric = name, labels = ?labels, value, "gauge");
    }

    fn counter(&self, name: &str, labels: &[(&str, &str)], value: u64) {
        debug!(metric = name, labels = ?labels, value, "counter");
    }
}

/// A baseline store with no history, for table-only deployments.
pub struct EmptyBaselineStore;

#[async_trait]
impl BaselineStore for EmptyBaselineStore {
    async fn baseline(&self, _model_id: &str) -> Result<HashMap<String, BaselineStats>> {
        Ok(HashMap::new())
    }
}

/// Loads a sample file eagerly, used by `validate` to check data paths.
pub async fn probe_data_file(path: &Path) -> Result<usize> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DataSentryError::io(format!("reading {}", path.display()), e))?;
    let rows: Vec<serde_json::Value> = serde_json::from_str(&raw)
        .map_err(|e| DataSentryError::serialization(format!("parsing {}", path.display()), e))?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[tokio::test]
    async fn test_file_sample_source_reads_and_limits() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let rows = serde_json::to_string(&vec![
            json!({"id": 1}),
            json!({"id": 2}),
            json!({"id": 3}),
        ])
        .unwrap();
        file.write_all(rows.as_bytes()).unwrap();

        let source = FileSampleSource::new(HashMap::from([(
            "timing.results".to_string(),
            file.path().to_path_buf(),
        )]));
        let sample = source.fetch("timing", "results", 2).await.unwrap();
        assert_eq!(sample.row_count(), 2);

        let missing = source.fetch("timing", "unknown", 10).await;
        assert!(matches!(missing, Err(DataSentryError::DataAccess { .. })));
    }

    #[tokio::test]
    async fn test_json_result_store_round_trip() {
        use chrono::Utc;
        use datasentry_core::{RuleSet, ValidatorRegistry, assess_sample};

        let dir = tempfile::tempdir().unwrap();
        let store = JsonResultStore::new(dir.path());
        let sample = Sample::new("timing", "results", vec![json!({"id": 1})]);
        let result = assess_sample(
            &sample,
            &RuleSet::default(),
            &datasentry_core::AlertThresholds::default(),
            &ValidatorRegistry::new(),
            Utc::now(),
        );
        store.persist(&result).await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let raw = std::fs::read_to_string(entries[0].as_ref().unwrap().path()).unwrap();
        let decoded: AssessmentResult = serde_json::from_str(&raw).unwrap();
        assert_eq!(decoded.source_id, "timing");
        assert_eq!(decoded.overall_score, 100.0);
    }
}
