//! Validity evaluation: named business rules.
//!
//! Rules are either declarative expressions evaluated row-wise or named
//! validator capabilities resolved through an explicitly registered
//! [`ValidatorRegistry`]. Registration replaces dynamic dispatch: a rule
//! naming an unregistered validator is reported and skipped, never resolved
//! reflectively.

use std::collections::HashMap;

use crate::error::Result;
use crate::models::{Dimension, DimensionResult, Issue, Sample, Severity};
use crate::rules::{RuleSet, ValidityCheck};

const SUB_CHECK_FLOOR: f64 = 95.0;

/// A domain-specific validation capability.
///
/// Implementations receive the whole sample and the rule's parameter object
/// and return a score in [0, 100]. Errors become critical error-kind issues
/// for the owning rule; they never abort the dimension.
pub trait Validator: Send + Sync {
    /// Scores the sample against this capability.
    fn validate(&self, sample: &Sample, params: &serde_json::Value) -> Result<f64>;
}

/// Explicit name-to-capability map consulted by validator-type rules.
#[derive(Default)]
pub struct ValidatorRegistry {
    validators: HashMap<String, Box<dyn Validator>>,
}

impl ValidatorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a capability under a name, replacing any previous holder.
    pub fn register(&mut self, name: impl Into<String>, validator: Box<dyn Validator>) {
        self.validators.insert(name.into(), validator);
    }

    /// Resolves a capability by name.
    pub fn resolve(&self, name: &str) -> Option<&dyn Validator> {
        self.validators.get(name).map(Box::as_ref)
    }
}

/// Evaluates every configured validity rule against the sample.
pub fn evaluate_validity(
    sample: &Sample,
    rules: &RuleSet,
    registry: &ValidatorRegistry,
) -> DimensionResult {
    if rules.validity_rules.is_empty() {
        return DimensionResult::not_applicable();
    }

    let rows = sample.row_count();
    let mut scores: Vec<f64> = Vec::new();
    let mut issues: Vec<Issue> = Vec::new();

    for rule in &rules.validity_rules {
        match &rule.check {
            ValidityCheck::Expression { column, op, value } => {
                if !sample.has_column(column) {
                    scores.push(0.0);
                    issues.push(Issue::check(
                        Dimension::Validity,
                        Severity::Medium,
                        &rule.name,
                        0.0,
                        format!(
                            "rule '{}' references column '{}' missing from the sample",
                            rule.name, column
                        ),
                    ));
                    continue;
                }

                let satisfying = sample
                    .column_values(column)
                    .filter(|v| op.evaluate(v, value))
                    .count();
                let score = if rows == 0 {
                    0.0
                } else {
                    100.0 * satisfying as f64 / rows as f64
                };
                scores.push(score);
                if score < SUB_CHECK_FLOOR {
                    issues.push(Issue::check(
                        Dimension::Validity,
                        Severity::Medium,
                        &rule.name,
                        score,
                        format!(
                            "rule '{}' fails for {:.1}% of rows",
                            rule.name,
                            100.0 - score
                        ),
                    ));
                }
            }
            ValidityCheck::Validator { validator, params } => {
                let Some(capability) = registry.resolve(validator) else {
                    issues.push(Issue::check(
                        Dimension::Validity,
                        Severity::Medium,
                        &rule.name,
                        0.0,
                        format!(
                            "rule '{}' names unregistered validator '{}'",
                            rule.name, validator
                        ),
                    ));
                    continue;
                };
                match capability.validate(sample, params) {
                    Ok(raw) => {
                        let score = raw.clamp(0.0, 100.0);
                        scores.push(score);
                        if score < SUB_CHECK_FLOOR {
                            issues.push(Issue::check(
                                Dimension::Validity,
                                Severity::Medium,
                                &rule.name,
                                score,
                                format!("rule '{}' scored {:.1}", rule.name, score),
                            ));
                        }
                    }
                    Err(e) => {
                        scores.push(0.0);
                        issues.push(Issue::error(
                            Dimension::Validity,
                            &rule.name,
                            format!("validator '{}' failed: {}", validator, e),
                        ));
                    }
                }
            }
        }
    }

    DimensionResult::from_scores(&scores, issues)
}
