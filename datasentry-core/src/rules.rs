//! Declarative rule model describing what "quality" means for a source.
//!
//! Rule sets are deserialized once at load time, validated, and treated as
//! immutable thereafter; a configuration reload replaces the whole object
//! atomically so concurrent evaluations never observe partial mutation.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DataSentryError, Result};
use crate::models::{AnomalyMethod, Dimension, extract_numeric};

/// Validation checks for a single column. Range, pattern, and enum checks
/// compose independently; each configured check scores on its own.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ColumnValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<serde_json::Value>>,
}

impl ColumnValidation {
    /// True if no check is configured at all.
    pub fn is_empty(&self) -> bool {
        self.min_value.is_none()
            && self.max_value.is_none()
            && self.pattern.is_none()
            && self.allowed_values.is_none()
    }
}

/// Row-wise comparison operator for cross-column consistency rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    GreaterThan,
    LessThan,
    Equal,
}

impl CompareOp {
    /// Evaluates the comparison between two row values.
    ///
    /// Ordering comparisons require both sides to be numeric; equality falls
    /// back to structural JSON equality for non-numeric values.
    pub fn evaluate(&self, left: &serde_json::Value, right: &serde_json::Value) -> bool {
        match (extract_numeric(left), extract_numeric(right)) {
            (Some(a), Some(b)) => match self {
                CompareOp::GreaterThan => a > b,
                CompareOp::LessThan => a < b,
                CompareOp::Equal => a == b,
            },
            _ => match self {
                CompareOp::Equal => left == right,
                _ => false,
            },
        }
    }
}

/// A named cross-column consistency rule: `column1 op column2`, row-wise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossColumnRule {
    pub name: String,
    pub column1: String,
    pub op: CompareOp,
    pub column2: String,
}

/// Expected value format for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnFormat {
    Date,
}

/// Freshness and interval expectations for a timestamped table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelinessRules {
    pub timestamp_column: String,
    #[serde(default = "default_freshness_hours")]
    pub expected_freshness_hours: f64,
    #[serde(default = "default_interval_hours")]
    pub expected_interval_hours: f64,
}

fn default_freshness_hours() -> f64 {
    24.0
}

fn default_interval_hours() -> f64 {
    1.0
}

/// Uniqueness expectations: composite primary keys and unique columns.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UniquenessRules {
    #[serde(default)]
    pub primary_keys: Vec<Vec<String>>,
    #[serde(default)]
    pub unique_columns: Vec<String>,
}

impl UniquenessRules {
    pub fn is_empty(&self) -> bool {
        self.primary_keys.is_empty() && self.unique_columns.is_empty()
    }
}

/// Comparison operator for declarative validity expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExprOp {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl ExprOp {
    /// Evaluates `value op target` for one row value.
    pub fn evaluate(&self, value: &serde_json::Value, target: &serde_json::Value) -> bool {
        match (extract_numeric(value), extract_numeric(target)) {
            (Some(a), Some(b)) => match self {
                ExprOp::Gt => a > b,
                ExprOp::Lt => a < b,
                ExprOp::Ge => a >= b,
                ExprOp::Le => a <= b,
                ExprOp::Eq => a == b,
                ExprOp::Ne => a != b,
            },
            _ => match self {
                ExprOp::Eq => value == target,
                ExprOp::Ne => value != target,
                _ => false,
            },
        }
    }
}

/// The check performed by one business validity rule: either a declarative
/// expression or a named validator capability resolved through the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidityCheck {
    Expression {
        column: String,
        op: ExprOp,
        value: serde_json::Value,
    },
    Validator {
        validator: String,
        #[serde(default)]
        params: serde_json::Value,
    },
}

/// A named business validity rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidityRule {
    pub name: String,
    #[serde(flatten)]
    pub check: ValidityCheck,
}

/// Anomaly detection configuration for one column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyRule {
    #[serde(default)]
    pub method: AnomalyMethod,
    #[serde(default = "default_anomaly_threshold")]
    pub threshold: f64,
}

fn default_anomaly_threshold() -> f64 {
    3.0
}

impl Default for AnomalyRule {
    fn default() -> Self {
        Self {
            method: AnomalyMethod::default(),
            threshold: default_anomaly_threshold(),
        }
    }
}

/// Immutable quality rule set for one data source or model input table.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RuleSet {
    #[serde(default)]
    pub required_columns: Vec<String>,
    #[serde(default)]
    pub critical_columns: Vec<String>,
    #[serde(default)]
    pub validation_rules: BTreeMap<String, ColumnValidation>,
    #[serde(default)]
    pub consistency_rules: Vec<CrossColumnRule>,
    #[serde(default)]
    pub format_rules: BTreeMap<String, ColumnFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeliness: Option<TimelinessRules>,
    #[serde(default)]
    pub uniqueness: UniquenessRules,
    #[serde(default)]
    pub validity_rules: Vec<ValidityRule>,
    #[serde(default)]
    pub anomaly_rules: BTreeMap<String, AnomalyRule>,
}

impl RuleSet {
    /// True if the rule set configures nothing at all.
    pub fn is_empty(&self) -> bool {
        self.required_columns.is_empty()
            && self.critical_columns.is_empty()
            && self.validation_rules.is_empty()
            && self.consistency_rules.is_empty()
            && self.format_rules.is_empty()
            && self.timeliness.is_none()
            && self.uniqueness.is_empty()
            && self.validity_rules.is_empty()
            && self.anomaly_rules.is_empty()
    }

    /// Validates the rule set at load time.
    ///
    /// Steady-state evaluation never rejects a rule set that passed here:
    /// regexes are pre-compiled for syntax, ranges and windows are checked
    /// for sanity, and empty names are rejected.
    pub fn validate(&self) -> Result<()> {
        for column in self.required_columns.iter().chain(&self.critical_columns) {
            if column.trim().is_empty() {
                return Err(DataSentryError::config("empty column name in rule set"));
            }
        }

        for (column, validation) in &self.validation_rules {
            if validation.is_empty() {
                return Err(DataSentryError::config(format!(
                    "validation rule for column '{}' configures no checks",
                    column
                )));
            }
            if let (Some(min), Some(max)) = (validation.min_value, validation.max_value) {
                if min > max {
                    return Err(DataSentryError::config(format!(
                        "validation rule for column '{}' has min_value {} > max_value {}",
                        column, min, max
                    )));
                }
            }
            if let Some(pattern) = &validation.pattern {
                Regex::new(pattern).map_err(|e| {
                    DataSentryError::config(format!(
                        "invalid pattern for column '{}': {}",
                        column, e
                    ))
                })?;
            }
        }

        for rule in &self.consistency_rules {
            if rule.name.trim().is_empty() {
                return Err(DataSentryError::config("unnamed consistency rule"));
            }
        }

        if let Some(timeliness) = &self.timeliness {
            if timeliness.expected_freshness_hours <= 0.0
                || timeliness.expected_interval_hours <= 0.0
            {
                return Err(DataSentryError::config(
                    "timeliness windows must be positive",
                ));
            }
        }

        for key_set in &self.uniqueness.primary_keys {
            if key_set.is_empty() {
                return Err(DataSentryError::config("empty primary key column set"));
            }
        }

        for rule in &self.validity_rules {
            if rule.name.trim().is_empty() {
                return Err(DataSentryError::config("unnamed validity rule"));
            }
        }

        for (column, rule) in &self.anomaly_rules {
            if rule.threshold <= 0.0 {
                return Err(DataSentryError::config(format!(
                    "anomaly threshold for column '{}' must be positive",
                    column
                )));
            }
        }

        Ok(())
    }
}

/// Alert decision thresholds for one source or model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Overall score floor for `overall_quality_degradation`
    #[serde(default = "default_overall")]
    pub overall: f64,
    /// Maximum anomaly findings before `anomaly_spike`
    #[serde(default = "default_max_anomalies")]
    pub max_anomalies: u64,
    /// Maximum check failure rate before `high_failure_rate`
    #[serde(default = "default_max_failure_rate")]
    pub max_failure_rate: f64,
    /// Per-dimension score floors; unset dimensions default to 95
    #[serde(default)]
    pub dimension_minimums: BTreeMap<Dimension, f64>,
    /// Model accuracy floor for `accuracy_degradation`
    #[serde(default = "default_accuracy")]
    pub accuracy: f64,
    /// Drift score ceiling for `model_drift`
    #[serde(default = "default_drift")]
    pub drift: f64,
    /// Mean prediction confidence floor for `low_confidence`
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

/// Score floor applied to a dimension with no explicit override.
pub const DEFAULT_DIMENSION_MINIMUM: f64 = 95.0;

fn default_overall() -> f64 {
    85.0
}

fn default_max_anomalies() -> u64 {
    10
}

fn default_max_failure_rate() -> f64 {
    0.1
}

fn default_accuracy() -> f64 {
    0.85
}

fn default_drift() -> f64 {
    0.05
}

fn default_confidence() -> f64 {
    0.7
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            overall: default_overall(),
            max_anomalies: default_max_anomalies(),
            max_failure_rate: default_max_failure_rate(),
            dimension_minimums: BTreeMap::new(),
            accuracy: default_accuracy(),
            drift: default_drift(),
            confidence: default_confidence(),
        }
    }
}

impl AlertThresholds {
    /// Score floor for one dimension, defaulting to 95 when unset.
    pub fn dimension_minimum(&self, dimension: Dimension) -> f64 {
        self.dimension_minimums
            .get(&dimension)
            .copied()
            .unwrap_or(DEFAULT_DIMENSION_MINIMUM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_rule_set() {
        let rules = RuleSet::default();
        assert!(rules.is_empty());
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn test_rule_set_deserialization() {
        let rules: RuleSet = serde_json::from_value(json!({
            "required_columns": ["rider_id", "finish_time"],
            "critical_columns": ["rider_id"],
            "validation_rules": {
                "speed_kmh": {"min_value": 0, "max_value": 120},
                "email": {"pattern": "^[^@]+@[^@]+$"}
            },
            "consistency_rules": [
                {"name": "finish_after_start", "column1": "finish_time",
                 "op": "greater_than", "column2": "start_time"}
            ],
            "format_rules": {"race_date": "date"},
            "timeliness": {"timestamp_column": "recorded_at"},
            "uniqueness": {
                "primary_keys": [["race_id", "rider_id"]],
                "unique_columns": ["bib_number"]
            },
            "validity_rules": [
                {"name": "max_speed", "type": "expression",
                 "column": "speed_kmh", "op": "<=", "value": 120},
                {"name": "stage_profile", "type": "validator",
                 "validator": "stage_profile", "params": {"tolerance": 0.05}}
            ],
            "anomaly_rules": {
                "power_watts": {"method": "zscore", "threshold": 3.0},
                "heart_rate": {"method": "iqr"}
            }
        }))
        .unwrap();

        assert!(!rules.is_empty());
        assert!(rules.validate().is_ok());
        assert_eq!(rules.required_columns.len(), 2);
        assert_eq!(
            rules.timeliness.as_ref().unwrap().expected_freshness_hours,
            24.0
        );
        assert_eq!(rules.anomaly_rules["heart_rate"].threshold, 3.0);
        assert_eq!(rules.anomaly_rules["heart_rate"].method, AnomalyMethod::Iqr);
    }

    #[test]
    fn test_validate_rejects_bad_regex() {
        let rules: RuleSet = serde_json::from_value(json!({
            "validation_rules": {"email": {"pattern": "([unclosed"}}
        }))
        .unwrap();
        assert!(matches!(
            rules.validate(),
            Err(DataSentryError::Config { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let rules: RuleSet = serde_json::from_value(json!({
            "validation_rules": {"speed": {"min_value": 100, "max_value": 10}}
        }))
        .unwrap();
        assert!(rules.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_check() {
        let rules: RuleSet = serde_json::from_value(json!({
            "validation_rules": {"speed": {}}
        }))
        .unwrap();
        assert!(rules.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nonpositive_windows() {
        let rules: RuleSet = serde_json::from_value(json!({
            "timeliness": {"timestamp_column": "ts", "expected_freshness_hours": 0.0}
        }))
        .unwrap();
        assert!(rules.validate().is_err());
    }

    #[test]
    fn test_compare_op_numeric_and_equality() {
        assert!(CompareOp::GreaterThan.evaluate(&json!(5), &json!(3)));
        assert!(!CompareOp::GreaterThan.evaluate(&json!(3), &json!(5)));
        assert!(CompareOp::LessThan.evaluate(&json!("2"), &json!(10)));
        assert!(CompareOp::Equal.evaluate(&json!("abc"), &json!("abc")));
        assert!(!CompareOp::GreaterThan.evaluate(&json!("abc"), &json!("abd")));
    }

    #[test]
    fn test_expr_op_evaluation() {
        assert!(ExprOp::Le.evaluate(&json!(120), &json!(120)));
        assert!(!ExprOp::Lt.evaluate(&json!(120), &json!(120)));
        assert!(ExprOp::Ne.evaluate(&json!("a"), &json!("b")));
        assert!(ExprOp::Eq.evaluate(&json!(1.0), &json!(1)));
    }

    #[test]
    fn test_alert_thresholds_defaults() {
        let thresholds = AlertThresholds::default();
        assert_eq!(thresholds.overall, 85.0);
        assert_eq!(thresholds.max_anomalies, 10);
        assert_eq!(thresholds.max_failure_rate, 0.1);
        assert_eq!(
            thresholds.dimension_minimum(Dimension::Completeness),
            95.0
        );
        assert_eq!(thresholds.accuracy, 0.85);
        assert_eq!(thresholds.confidence, 0.7);
    }

    #[test]
    fn test_dimension_minimum_override() {
        let mut thresholds = AlertThresholds::default();
        thresholds
            .dimension_minimums
            .insert(Dimension::Uniqueness, 99.0);
        assert_eq!(thresholds.dimension_minimum(Dimension::Uniqueness), 99.0);
        assert_eq!(thresholds.dimension_minimum(Dimension::Accuracy), 95.0);
    }
}
