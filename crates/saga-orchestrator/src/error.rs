use std::error::Error as StdError;

use thiserror::Error;

/// Default error type for step operations and compensations.
///
/// Carries a message and, optionally, the error that caused it.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StepError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl StepError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error that wraps the failure that caused it.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for StepError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for StepError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Error from a compensation that failed during rollback.
#[derive(Debug, Error)]
#[error("compensation failed for step {index} '{step}'")]
pub struct CompensationError<E> {
    /// Index of the step whose compensation failed.
    pub index: usize,
    /// Name of the step whose compensation failed.
    pub step: String,
    /// The underlying error.
    #[source]
    pub error: E,
}

/// Outcome of a failed saga run.
///
/// Holds the error of the operation that stopped the forward pass together
/// with every compensation error met while rolling back, in rollback order
/// (highest step index first). This is a report only; the saga it came
/// from cannot be resumed.
#[derive(Debug, Error)]
#[error(
    "step {failed_index} '{failed_step}' failed ({} compensation failure(s) during rollback)",
    .compensation_errors.len()
)]
pub struct SagaFailure<E> {
    /// Index of the step whose operation failed.
    pub failed_index: usize,
    /// Name of the step whose operation failed.
    pub failed_step: String,
    /// The error returned by the failing operation.
    #[source]
    pub error: E,
    /// Errors from failed compensations, in the order they were attempted.
    pub compensation_errors: Vec<CompensationError<E>>,
}

impl<E> SagaFailure<E> {
    /// Whether every completed step was rolled back without error.
    #[must_use]
    pub fn is_fully_compensated(&self) -> bool {
        self.compensation_errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn step_error_displays_message() {
        let error = StepError::new("inventory unavailable");
        assert_eq!(error.to_string(), "inventory unavailable");
        assert_eq!(error.message(), "inventory unavailable");
        assert!(error.source().is_none());
    }

    #[test]
    fn step_error_chains_source() {
        let cause = io::Error::new(io::ErrorKind::ConnectionReset, "peer went away");
        let error = StepError::with_source("charge card", cause);

        let source = error.source().expect("source should be set");
        assert_eq!(source.to_string(), "peer went away");
    }

    #[test]
    fn step_error_converts_from_strings() {
        let from_str: StepError = "a".into();
        let from_string: StepError = String::from("b").into();
        assert_eq!(from_str.message(), "a");
        assert_eq!(from_string.message(), "b");
    }

    #[test]
    fn saga_failure_reports_compensation_count() {
        let failure = SagaFailure {
            failed_index: 2,
            failed_step: "ship".to_string(),
            error: StepError::new("carrier offline"),
            compensation_errors: vec![CompensationError {
                index: 0,
                step: "reserve".to_string(),
                error: StepError::new("release rejected"),
            }],
        };

        assert_eq!(
            failure.to_string(),
            "step 2 'ship' failed (1 compensation failure(s) during rollback)"
        );
        assert!(!failure.is_fully_compensated());
        let source = failure.source().expect("source should be the step error");
        assert_eq!(source.to_string(), "carrier offline");
    }

    #[test]
    fn compensation_error_exposes_source() {
        let error = CompensationError {
            index: 1,
            step: "charge".to_string(),
            error: StepError::new("refund declined"),
        };

        assert_eq!(
            error.to_string(),
            "compensation failed for step 1 'charge'"
        );
        assert_eq!(
            error.source().map(ToString::to_string),
            Some("refund declined".to_string())
        );
    }
}
