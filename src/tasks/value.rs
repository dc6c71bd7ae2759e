//! # Type-erased task output.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Success value of a task.
///
/// The engine runs heterogeneous work, so values are stored type-erased behind an `Arc`.
/// Cloning is cheap; callers recover the concrete type with [`TaskValue::downcast_ref`]
/// or [`TaskValue::downcast`].
///
/// ```rust
/// use taskforge::TaskValue;
///
/// let v = TaskValue::new(vec![1u32, 2, 3]);
/// assert_eq!(v.downcast_ref::<Vec<u32>>().map(Vec::len), Some(3));
/// assert!(v.downcast_ref::<String>().is_none());
/// ```
#[derive(Clone)]
pub struct TaskValue(Arc<dyn Any + Send + Sync>);

impl TaskValue {
    /// Wraps a value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// The unit value, for tasks run only for their side effects.
    pub fn unit() -> Self {
        Self::new(())
    }

    /// Returns `true` if the stored value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }

    /// Borrows the stored value as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Converts into a typed `Arc<T>`, or gives the value back on type mismatch.
    pub fn downcast<T: Any + Send + Sync>(self) -> Result<Arc<T>, Self> {
        self.0.downcast::<T>().map_err(Self)
    }
}

impl fmt::Debug for TaskValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TaskValue(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downcast_roundtrip_and_mismatch() {
        let v = TaskValue::new(String::from("digest"));
        assert!(v.is::<String>());
        let back = v.clone().downcast::<u32>().unwrap_err();
        let s = back.downcast::<String>().unwrap();
        assert_eq!(s.as_str(), "digest");
    }
}
