use std::any::Any;

/// A step result with its concrete type erased.
///
/// Results travel through the engine boxed so that steps with different
/// output types can live in one sequence. The type-state builder guarantees
/// that every value is later recovered as the type it was stored with.
pub(crate) trait ErasedValue: Any + Send {
    /// Clone the value into a new box.
    fn clone_value(&self) -> Box<dyn ErasedValue>;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<T> ErasedValue for T
where
    T: Clone + Send + 'static,
{
    fn clone_value(&self) -> Box<dyn ErasedValue> {
        Box::new(self.clone())
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// Recover a value stored by the engine.
///
/// # Panics
///
/// Panics if `T` is not the stored type. The builder makes this unreachable.
pub(crate) fn recover<T: 'static>(value: Box<dyn ErasedValue>) -> T {
    *value
        .into_any()
        .downcast::<T>()
        .expect("type-state builder guarantees the stored value type")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_value_yields_equal_independent_copy() {
        let original: Box<dyn ErasedValue> = Box::new(vec![1_u8, 2, 3]);
        let copy = original.clone_value();

        assert_eq!(recover::<Vec<u8>>(original), vec![1, 2, 3]);
        assert_eq!(recover::<Vec<u8>>(copy), vec![1, 2, 3]);
    }

    #[test]
    fn unit_round_trips_through_erasure() {
        let unit: Box<dyn ErasedValue> = Box::new(());
        recover::<()>(unit);
    }

    #[test]
    fn into_any_rejects_wrong_type() {
        let boxed: Box<dyn ErasedValue> = Box::new(7_i32);
        assert!(boxed.into_any().downcast::<String>().is_err());
    }
}
