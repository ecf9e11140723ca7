//! Monitor configuration for the CLI.
//!
//! A monitor file describes the sources and tables to assess, the rule set
//! and alert thresholds for each, and where the row data lives on disk.
//! Loading validates every rule set up front: a broken configuration is
//! fatal at startup, never mid-cycle.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use datasentry_core::orchestrator::TableSpec;
use datasentry_core::{AlertThresholds, DataSentryError, Result, RuleSet};

fn default_sample_limit() -> usize {
    1000
}

/// One table to assess within a source.
#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    pub id: String,
    /// Path to a JSON array of row objects
    pub data: PathBuf,
    #[serde(default = "default_sample_limit")]
    pub sample_limit: usize,
    pub rules: RuleSet,
    #[serde(default)]
    pub thresholds: AlertThresholds,
}

/// One data source and its monitored tables.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub id: String,
    pub tables: Vec<TableConfig>,
}

/// Top-level monitor configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    pub sources: Vec<SourceConfig>,
}

impl MonitorConfig {
    /// Loads and validates a monitor file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DataSentryError::io(format!("reading {}", path.display()), e))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| DataSentryError::serialization(format!("parsing {}", path.display()), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Every rule set must pass load-time validation and at least one table
    /// must be configured; otherwise there is nothing to assess and startup
    /// aborts.
    pub fn validate(&self) -> Result<()> {
        let mut tables = 0;
        for source in &self.sources {
            if source.id.trim().is_empty() {
                return Err(DataSentryError::config("source with an empty id"));
            }
            for table in &source.tables {
                if table.id.trim().is_empty() {
                    return Err(DataSentryError::config(format!(
                        "source '{}' has a table with an empty id",
                        source.id
                    )));
                }
                table.rules.validate().map_err(|e| {
                    DataSentryError::config(format!(
                        "rules for {}.{}: {}",
                        source.id, table.id, e
                    ))
                })?;
                tables += 1;
            }
        }
        if tables == 0 {
            return Err(DataSentryError::config(
                "no tables configured, nothing to assess",
            ));
        }
        Ok(())
    }

    /// Builds the per-unit work specs for one cycle.
    pub fn table_specs(&self) -> Vec<TableSpec> {
        self.sources
            .iter()
            .flat_map(|source| {
                source.tables.iter().map(|table| TableSpec {
                    source_id: source.id.clone(),
                    table_id: table.id.clone(),
                    sample_limit: table.sample_limit,
                    rules: table.rules.clone(),
                    thresholds: table.thresholds.clone(),
                })
            })
            .collect()
    }

    /// Maps each `source.table` unit to its row data file.
    pub fn data_paths(&self) -> HashMap<String, PathBuf> {
        self.sources
            .iter()
            .flat_map(|source| {
                source.tables.iter().map(|table| {
                    (
                        format!("{}.{}", source.id, table.id),
                        table.data.clone(),
                    )
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(
            r#"{
                "sources": [{
                    "id": "timing",
                    "tables": [{
                        "id": "results",
                        "data": "data/results.json",
                        "rules": {"required_columns": ["rider_id"]}
                    }]
                }]
            }"#,
        );
        let config = MonitorConfig::load(file.path()).unwrap();
        let specs = config.table_specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].source_id, "timing");
        assert_eq!(specs[0].sample_limit, 1000);
        assert_eq!(
            config.data_paths()["timing.results"],
            PathBuf::from("data/results.json")
        );
    }

    #[test]
    fn test_no_tables_is_fatal() {
        let file = write_config(r#"{"sources": [{"id": "timing", "tables": []}]}"#);
        assert!(matches!(
            MonitorConfig::load(file.path()),
            Err(DataSentryError::Config { .. })
        ));
    }

    #[test]
    fn test_invalid_rules_are_fatal() {
        let file = write_config(
            r#"{
                "sources": [{
                    "id": "timing",
                    "tables": [{
                        "id": "results",
                        "data": "data/results.json",
                        "rules": {"validation_rules": {"email": {"pattern": "([bad"}}}
                    }]
                }]
            }"#,
        );
        assert!(MonitorConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            MonitorConfig::load(Path::new("/nonexistent/monitor.json")),
            Err(DataSentryError::Io { .. })
        ));
    }
}
