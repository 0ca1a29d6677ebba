use std::time::Instant;

use crate::saga::SagaState;

/// Status of a step in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepStatus {
    /// Operation started, or completed successfully.
    Executed,
    /// Operation failed; this step stopped the forward pass.
    Failed,
    /// Step was compensated successfully.
    Compensated,
    /// Step compensation failed.
    CompensationFailed,
}

/// Record of one step's lifecycle within a saga run.
#[derive(Debug)]
pub struct StepRecord {
    /// Position of the step in the saga.
    pub index: usize,
    /// Name of the step.
    pub name: String,
    /// Current status.
    pub status: StepStatus,
    /// When the operation started.
    pub started_at: Instant,
    /// When the operation or, later, its compensation finished.
    pub completed_at: Option<Instant>,
}

/// Audit log of a single saga run.
///
/// Only steps whose operation was started get a record.
#[derive(Debug)]
pub struct SagaAuditLog {
    records: Vec<StepRecord>,
    final_state: SagaState,
}

impl Default for SagaAuditLog {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            final_state: SagaState::NotStarted,
        }
    }
}

impl SagaAuditLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_start(&mut self, index: usize, name: &str) {
        self.records.push(StepRecord {
            index,
            name: name.to_string(),
            status: StepStatus::Executed,
            started_at: Instant::now(),
            completed_at: None,
        });
    }

    pub(crate) fn record_success(&mut self, index: usize) {
        self.complete(index, StepStatus::Executed);
    }

    pub(crate) fn record_failure(&mut self, index: usize) {
        self.complete(index, StepStatus::Failed);
    }

    pub(crate) fn record_compensated(&mut self, index: usize) {
        self.complete(index, StepStatus::Compensated);
    }

    pub(crate) fn record_compensation_failed(&mut self, index: usize) {
        self.complete(index, StepStatus::CompensationFailed);
    }

    pub(crate) fn record_final_state(&mut self, state: SagaState) {
        self.final_state = state;
    }

    fn complete(&mut self, index: usize, status: StepStatus) {
        if let Some(record) = self.records.iter_mut().find(|r| r.index == index) {
            record.status = status;
            record.completed_at = Some(Instant::now());
        }
    }

    /// All records, in the order the steps were started.
    #[must_use]
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// State the saga was in when the run ended.
    #[must_use]
    pub fn final_state(&self) -> SagaState {
        self.final_state
    }

    /// One line per recorded step, for display.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for record in &self.records {
            let status = match record.status {
                StepStatus::Executed => "✓",
                StepStatus::Failed => "✗",
                StepStatus::Compensated => "↩",
                StepStatus::CompensationFailed => "⚠",
            };
            lines.push(format!("{status} {} {}", record.index, record.name));
        }
        lines.join("\n")
    }
}
