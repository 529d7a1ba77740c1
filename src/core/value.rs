//! Type-erased value passed between steps

use std::any::Any;
use std::fmt;

/// The value flowing through a pipeline.
///
/// Its concrete type changes as it moves through the phases: operation input,
/// then a wire request, then a wire response, then the operation output.
pub struct StepValue {
    inner: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl StepValue {
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self {
            inner: Box::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Name of the concrete type held
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.inner.downcast_mut::<T>()
    }

    /// Take the concrete value out, or hand the value back on a type mismatch
    pub fn downcast<T: Any>(self) -> Result<T, StepValue> {
        let type_name = self.type_name;
        match self.inner.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(inner) => Err(StepValue { inner, type_name }),
        }
    }
}

impl fmt::Debug for StepValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StepValue({})", self.type_name)
    }
}
