use std::marker::PhantomData;

use tracing::{Instrument, debug, debug_span, warn};

use crate::audit::SagaAuditLog;
use crate::error::{CompensationError, SagaFailure, StepError};
use crate::step::Step;
use crate::value::{ErasedValue, recover};

/// Where a saga run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaState {
    NotStarted,
    /// Forward pass; `cursor` is the step being executed.
    Running { cursor: usize },
    /// Rolling back after the operation at `failed_index` failed; `cursor`
    /// is the step being compensated.
    Compensating { failed_index: usize, cursor: usize },
    Succeeded,
    Failed { failed_index: usize },
}

/// A frozen sequence of steps ready for execution.
///
/// Steps run front to back, each operation receiving the previous step's
/// result (`()` for the first step). If an operation fails, the steps that
/// completed before it are compensated back to front and the run ends with a
/// [`SagaFailure`]. The failing step's own compensation is not invoked.
///
/// A saga is consumed by [`Saga::execute`], so it runs at most once.
pub struct Saga<'a, Output, E = StepError> {
    name: String,
    steps: Vec<Step<'a, E>>,
    state: SagaState,
    _output: PhantomData<fn() -> Output>,
}

impl<'a, Output, E> Saga<'a, Output, E>
where
    Output: 'static,
    E: Send + 'a,
{
    pub(crate) fn from_steps(name: String, steps: Vec<Step<'a, E>>) -> Self {
        Self {
            name,
            steps,
            state: SagaState::NotStarted,
            _output: PhantomData,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[must_use]
    pub fn state(&self) -> SagaState {
        self.state
    }

    /// Names of the steps, in execution order.
    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(Step::name)
    }

    /// Run the saga to completion.
    ///
    /// Returns the last step's result, or `()` for a saga without steps.
    ///
    /// # Errors
    ///
    /// Returns a [`SagaFailure`] if a step's operation fails. By then every
    /// previously completed step has had its compensation attempted, and
    /// compensation errors are collected in the failure.
    pub async fn execute(self) -> Result<Output, SagaFailure<E>> {
        let (result, _audit_log) = self.execute_with_audit().await;
        result
    }

    /// Run the saga and also return an audit log of the run.
    pub async fn execute_with_audit(mut self) -> (Result<Output, SagaFailure<E>>, SagaAuditLog) {
        let span = debug_span!("saga", saga = %self.name, steps = self.steps.len());
        let mut audit_log = SagaAuditLog::new();
        let result = self.run(&mut audit_log).instrument(span).await;
        audit_log.record_final_state(self.state);
        (result, audit_log)
    }

    async fn run(&mut self, audit_log: &mut SagaAuditLog) -> Result<Output, SagaFailure<E>> {
        let mut current: Box<dyn ErasedValue> = Box::new(());

        for cursor in 0..self.steps.len() {
            self.transition(SagaState::Running { cursor });
            let step = &mut self.steps[cursor];
            let name = step.name().to_string();
            audit_log.record_start(cursor, &name);
            debug!(step = %name, index = cursor, "executing step");

            let outcome = step.run(current).await;
            match outcome {
                Ok(output) => {
                    audit_log.record_success(cursor);
                    debug!(step = %name, index = cursor, "step completed");
                    current = output;
                }
                Err(error) => {
                    audit_log.record_failure(cursor);
                    warn!(step = %name, index = cursor, "step failed, rolling back");
                    return Err(self.compensate(audit_log, cursor, name, error).await);
                }
            }
        }

        self.transition(SagaState::Succeeded);
        Ok(recover::<Output>(current))
    }

    async fn compensate(
        &mut self,
        audit_log: &mut SagaAuditLog,
        failed_index: usize,
        failed_step: String,
        error: E,
    ) -> SagaFailure<E> {
        let mut compensation_errors = Vec::new();

        for cursor in (0..failed_index).rev() {
            self.transition(SagaState::Compensating {
                failed_index,
                cursor,
            });
            let step = &self.steps[cursor];
            let name = step.name().to_string();
            let pending = step.compensate();

            match pending.await {
                Ok(()) => {
                    audit_log.record_compensated(cursor);
                    debug!(step = %name, index = cursor, "step compensated");
                }
                Err(compensation_error) => {
                    audit_log.record_compensation_failed(cursor);
                    warn!(step = %name, index = cursor, "compensation failed");
                    compensation_errors.push(CompensationError {
                        index: cursor,
                        step: name,
                        error: compensation_error,
                    });
                }
            }
        }

        self.transition(SagaState::Failed { failed_index });
        SagaFailure {
            failed_index,
            failed_step,
            error,
            compensation_errors,
        }
    }

    fn transition(&mut self, next: SagaState) {
        debug!(from = ?self.state, to = ?next, "saga state transition");
        self.state = next;
    }
}
