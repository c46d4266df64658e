use super::Deferred;
use super::shared::Shared;
use crate::error::{Error, Result, violation};

use std::fmt;
use std::sync::Arc;

/// The write side of a single-assignment result slot.
///
/// A `Promise` is completed at most once: every completing method consumes
/// it. Dropping a promise that was never completed fails its
/// [`Deferred`] with [`Error::BrokenPromise`].
///
/// # Examples
///
/// ```rust
/// use fiberwait::Promise;
///
/// let mut promise = Promise::new();
/// let deferred = promise.deferred();
///
/// assert!(!deferred.is_ready());
/// promise.set_value(7);
/// assert_eq!(deferred.get().unwrap(), 7);
/// ```
pub struct Promise<T> {
    shared: Arc<Shared<T>>,

    /// Whether the read side has been handed out.
    retrieved: bool,

    /// Whether an outcome has been written.
    completed: bool,
}

impl<T> Promise<T> {
    /// Creates a promise with no outcome.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::new()),
            retrieved: false,
            completed: false,
        }
    }

    /// Returns the read side of this promise.
    ///
    /// # Panics
    ///
    /// Raises a [`ContractViolation`](crate::ContractViolation) when called
    /// twice.
    pub fn deferred(&mut self) -> Deferred<T> {
        if self.retrieved {
            violation("promise read side retrieved twice");
        }

        self.retrieved = true;
        Deferred::from_shared(self.shared.clone())
    }

    /// Completes the promise with a value.
    pub fn set_value(self, value: T) {
        self.complete(Ok(value));
    }

    /// Completes the promise with an error.
    pub fn set_error(self, error: Error) {
        self.complete(Err(error));
    }

    /// Completes the promise with an outcome.
    pub fn complete(mut self, outcome: Result<T>) {
        self.completed = true;
        self.shared.complete(outcome);
    }
}

impl<T> Default for Promise<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Promise<T> {
    fn drop(&mut self) {
        if !self.completed {
            self.shared.complete(Err(Error::BrokenPromise));
        }
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("retrieved", &self.retrieved)
            .field("completed", &self.completed)
            .finish()
    }
}
