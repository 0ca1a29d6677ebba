use std::future::{self, Future};
use std::marker::PhantomData;

use crate::audit::SagaAuditLog;
use crate::error::{SagaFailure, StepError};
use crate::saga::Saga;
use crate::step::Step;

const DEFAULT_SAGA_NAME: &str = "saga";

/// Type-state builder for sagas.
///
/// `Last` is the result type of the most recently added step, `()` while the
/// builder is empty. Each added operation must accept `Last`, so every
/// operation receives exactly the previous step's result and the first
/// operation receives `()`. Compensations receive their own step's result.
///
/// Mismatched step types do not compile:
///
/// ```compile_fail
/// use saga_orchestrator::{SagaBuilder, StepError};
///
/// let builder = SagaBuilder::new()
///     .add_step(
///         |()| async { Ok::<_, StepError>(String::from("42")) },
///         |_| async { Ok(()) },
///     )
///     // The previous step produces a String, not an i32.
///     .add_step(|n: i32| async move { Ok(n * 2) }, |_| async { Ok(()) });
/// ```
///
/// Extra parameters are closed over by the callable instead of being passed
/// by the engine:
///
/// ```
/// use saga_orchestrator::{SagaBuilder, StepError};
///
/// fn reserve(sku: &str, quantity: u32) -> Result<String, StepError> {
///     Ok(format!("{sku}x{quantity}"))
/// }
///
/// let sku = "BOOK-1";
/// let saga = SagaBuilder::new()
///     .add_sync_step(move |()| reserve(sku, 2), |_reservation| Ok(()))
///     .build();
///
/// let reservation = futures::executor::block_on(saga.execute())?;
/// assert_eq!(reservation, "BOOK-1x2");
/// # Ok::<(), saga_orchestrator::SagaFailure<StepError>>(())
/// ```
pub struct SagaBuilder<'a, E = StepError, Last = ()> {
    name: String,
    steps: Vec<Step<'a, E>>,
    _last: PhantomData<fn() -> Last>,
}

impl<E> SagaBuilder<'_, E, ()> {
    /// Create a builder without steps.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: DEFAULT_SAGA_NAME.to_string(),
            steps: Vec::new(),
            _last: PhantomData,
        }
    }
}

impl<E> Default for SagaBuilder<'_, E, ()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, E, Last> SagaBuilder<'a, E, Last>
where
    E: Send + 'a,
    Last: 'static,
{
    /// Name the saga; the name is attached to the tracing span of a run.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Append a step built from an async operation and compensation.
    ///
    /// The step is named after its position, `step-<index>`.
    #[must_use]
    pub fn add_step<Out, Op, OpFut, Comp, CompFut>(
        self,
        operation: Op,
        compensation: Comp,
    ) -> SagaBuilder<'a, E, Out>
    where
        Out: Clone + Send + 'static,
        Op: Fn(Last) -> OpFut + Send + Sync + 'a,
        OpFut: Future<Output = Result<Out, E>> + Send + 'a,
        Comp: Fn(Out) -> CompFut + Send + Sync + 'a,
        CompFut: Future<Output = Result<(), E>> + Send + 'a,
    {
        let name = format!("step-{}", self.steps.len());
        self.add_named_step(name, operation, compensation)
    }

    /// Append a named step built from an async operation and compensation.
    #[must_use]
    pub fn add_named_step<Out, Op, OpFut, Comp, CompFut>(
        self,
        name: impl Into<String>,
        operation: Op,
        compensation: Comp,
    ) -> SagaBuilder<'a, E, Out>
    where
        Out: Clone + Send + 'static,
        Op: Fn(Last) -> OpFut + Send + Sync + 'a,
        OpFut: Future<Output = Result<Out, E>> + Send + 'a,
        Comp: Fn(Out) -> CompFut + Send + Sync + 'a,
        CompFut: Future<Output = Result<(), E>> + Send + 'a,
    {
        let mut steps = self.steps;
        steps.push(Step::new(name.into(), operation, compensation));
        SagaBuilder {
            name: self.name,
            steps,
            _last: PhantomData,
        }
    }

    /// Append a step whose operation and compensation complete synchronously.
    #[must_use]
    pub fn add_sync_step<Out, Op, Comp>(
        self,
        operation: Op,
        compensation: Comp,
    ) -> SagaBuilder<'a, E, Out>
    where
        Out: Clone + Send + 'static,
        Op: Fn(Last) -> Result<Out, E> + Send + Sync + 'a,
        Comp: Fn(Out) -> Result<(), E> + Send + Sync + 'a,
    {
        let name = format!("step-{}", self.steps.len());
        self.add_named_sync_step(name, operation, compensation)
    }

    /// Append a named step whose operation and compensation complete
    /// synchronously.
    #[must_use]
    pub fn add_named_sync_step<Out, Op, Comp>(
        self,
        name: impl Into<String>,
        operation: Op,
        compensation: Comp,
    ) -> SagaBuilder<'a, E, Out>
    where
        Out: Clone + Send + 'static,
        Op: Fn(Last) -> Result<Out, E> + Send + Sync + 'a,
        Comp: Fn(Out) -> Result<(), E> + Send + Sync + 'a,
    {
        self.add_named_step(
            name,
            move |input| future::ready(operation(input)),
            move |result| future::ready(compensation(result)),
        )
    }

    /// Freeze the accumulated steps into a saga.
    #[must_use]
    pub fn build(self) -> Saga<'a, Last, E> {
        Saga::from_steps(self.name, self.steps)
    }

    /// Build the saga and run it.
    ///
    /// # Errors
    ///
    /// Returns a [`SagaFailure`] if any step's operation fails.
    pub async fn execute(self) -> Result<Last, SagaFailure<E>> {
        self.build().execute().await
    }

    /// Build the saga and run it, also returning the audit log of the run.
    pub async fn execute_with_audit(self) -> (Result<Last, SagaFailure<E>>, SagaAuditLog) {
        self.build().execute_with_audit().await
    }
}
