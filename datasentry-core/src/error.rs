//! Error taxonomy for the assessment engine.
//!
//! Only configuration errors are fatal, and only at load time. Every
//! steady-state failure class degrades: data access aborts one unit of work,
//! evaluation failures become critical issues, and persistence or alert
//! delivery failures are logged and dropped.

use thiserror::Error;

/// Main error type for DataSentry operations.
#[derive(Debug, Error)]
pub enum DataSentryError {
    /// Missing or invalid rule configuration. Fatal at load time; an
    /// assessment cannot run without a usable rule set.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Sample fetch failed. The assessment for that unit aborts; the cycle
    /// continues for sibling units.
    #[error("Data access failed for {unit}: {context}")]
    DataAccess { unit: String, context: String },

    /// Failure inside one evaluator. Caught at the evaluator boundary and
    /// converted into a critical issue; sibling dimensions are unaffected.
    #[error("Evaluation failed in {dimension}: {context}")]
    Evaluation { dimension: String, context: String },

    /// Result persistence failed. Logged, never fails the assessment.
    #[error("Failed to persist assessment result: {context}")]
    Persistence { context: String },

    /// Alert delivery failed. Best-effort with one retry, then dropped.
    #[error("Alert delivery failed: {context}")]
    AlertDelivery { context: String },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results with DataSentryError
pub type Result<T> = std::result::Result<T, DataSentryError>;

impl DataSentryError {
    /// Creates a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a data access error for one (source, table) or model unit
    pub fn data_access(unit: impl Into<String>, context: impl Into<String>) -> Self {
        Self::DataAccess {
            unit: unit.into(),
            context: context.into(),
        }
    }

    /// Creates an evaluation error scoped to one dimension
    pub fn evaluation(dimension: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Evaluation {
            dimension: dimension.into(),
            context: context.into(),
        }
    }

    /// Creates a persistence error
    pub fn persistence(context: impl Into<String>) -> Self {
        Self::Persistence {
            context: context.into(),
        }
    }

    /// Creates an alert delivery error
    pub fn alert_delivery(context: impl Into<String>) -> Self {
        Self::AlertDelivery {
            context: context.into(),
        }
    }

    /// Creates a serialization error with context
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Creates an I/O error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// True for the failure classes that must never fail an assessment.
    pub fn is_best_effort(&self) -> bool {
        matches!(
            self,
            Self::Persistence { .. } | Self::AlertDelivery { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = DataSentryError::config("no usable rule sets");
        assert!(error.to_string().contains("no usable rule sets"));

        let error = DataSentryError::data_access("races.results", "connection refused");
        assert!(error.to_string().contains("races.results"));
        assert!(error.to_string().contains("connection refused"));
    }

    #[test]
    fn test_best_effort_classification() {
        assert!(DataSentryError::persistence("disk full").is_best_effort());
        assert!(DataSentryError::alert_delivery("webhook 500").is_best_effort());
        assert!(!DataSentryError::config("bad rules").is_best_effort());
        assert!(!DataSentryError::data_access("a.b", "timeout").is_best_effort());
    }
}
