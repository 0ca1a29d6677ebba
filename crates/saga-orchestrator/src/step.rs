use std::future::Future;

use futures::future::{self, BoxFuture, FutureExt, TryFutureExt};

use crate::value::{ErasedValue, recover};

type ErasedOperation<'a, E> = Box<
    dyn Fn(Box<dyn ErasedValue>) -> BoxFuture<'a, Result<Box<dyn ErasedValue>, E>>
        + Send
        + Sync
        + 'a,
>;

type ErasedCompensation<'a, E> =
    Box<dyn Fn(Box<dyn ErasedValue>) -> BoxFuture<'a, Result<(), E>> + Send + Sync + 'a>;

/// One operation of a saga paired with the compensation that undoes it.
///
/// The operation and compensation are fixed at construction. The result
/// slot is filled exactly once, when the operation completes successfully,
/// so a step holds a result if and only if its operation succeeded.
pub(crate) struct Step<'a, E> {
    name: String,
    operation: ErasedOperation<'a, E>,
    compensation: ErasedCompensation<'a, E>,
    result: Option<Box<dyn ErasedValue>>,
}

impl<'a, E: Send + 'a> Step<'a, E> {
    pub(crate) fn new<In, Out, Op, OpFut, Comp, CompFut>(
        name: String,
        operation: Op,
        compensation: Comp,
    ) -> Self
    where
        In: 'static,
        Out: Clone + Send + 'static,
        Op: Fn(In) -> OpFut + Send + Sync + 'a,
        OpFut: Future<Output = Result<Out, E>> + Send + 'a,
        Comp: Fn(Out) -> CompFut + Send + Sync + 'a,
        CompFut: Future<Output = Result<(), E>> + Send + 'a,
    {
        let operation: ErasedOperation<'a, E> = Box::new(move |input| {
            operation(recover::<In>(input))
                .map_ok(|output| Box::new(output) as Box<dyn ErasedValue>)
                .boxed()
        });
        let compensation: ErasedCompensation<'a, E> =
            Box::new(move |result| compensation(recover::<Out>(result)).boxed());

        Self {
            name,
            operation,
            compensation,
            result: None,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn has_result(&self) -> bool {
        self.result.is_some()
    }

    /// Run the operation and record its result on success.
    ///
    /// Returns a copy of the recorded result to feed the next step.
    pub(crate) async fn run(
        &mut self,
        input: Box<dyn ErasedValue>,
    ) -> Result<Box<dyn ErasedValue>, E> {
        let output = (self.operation)(input).await?;
        let forwarded = output.clone_value();
        self.result = Some(output);
        Ok(forwarded)
    }

    /// Start the compensation with a copy of this step's recorded result.
    ///
    /// A step without a result has nothing to undo and resolves immediately.
    /// The returned future does not borrow the step.
    pub(crate) fn compensate(&self) -> BoxFuture<'a, Result<(), E>> {
        match &self.result {
            Some(result) => (self.compensation)(result.clone_value()),
            None => future::ready(Ok(())).boxed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::StepError;

    #[tokio::test]
    async fn result_is_recorded_only_after_success() -> anyhow::Result<()> {
        let mut step = Step::new(
            "double".to_string(),
            |input: i32| async move { Ok::<_, StepError>(input * 2) },
            |_: i32| async { Ok(()) },
        );
        assert!(!step.has_result());

        let forwarded = step.run(Box::new(21_i32)).await?;

        assert!(step.has_result());
        assert_eq!(recover::<i32>(forwarded), 42);
        Ok(())
    }

    #[tokio::test]
    async fn failed_operation_leaves_slot_empty() {
        let mut step = Step::new(
            "broken".to_string(),
            |_: ()| async { Err::<i32, _>(StepError::new("nope")) },
            |_: i32| async { Ok(()) },
        );

        let error = step.run(Box::new(())).await.err().expect("operation fails");

        assert_eq!(error.message(), "nope");
        assert!(!step.has_result());
    }

    #[tokio::test]
    async fn compensation_receives_recorded_result() -> anyhow::Result<()> {
        let seen = Mutex::new(Vec::new());
        let mut step = Step::new(
            "label".to_string(),
            |input: i32| async move { Ok::<_, StepError>(format!("order-{input}")) },
            |result: String| {
                seen.lock().expect("lock").push(result);
                async { Ok(()) }
            },
        );

        step.run(Box::new(7_i32)).await?;
        step.compensate().await?;

        assert_eq!(*seen.lock().expect("lock"), vec!["order-7".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn compensation_without_result_is_skipped() -> anyhow::Result<()> {
        let calls = Mutex::new(0);
        let step = Step::new(
            "never_ran".to_string(),
            |_: ()| async { Ok::<_, StepError>(1) },
            |_: i32| {
                *calls.lock().expect("lock") += 1;
                async { Ok(()) }
            },
        );

        step.compensate().await?;

        assert_eq!(*calls.lock().expect("lock"), 0);
        Ok(())
    }
}
