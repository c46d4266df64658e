//! Task submission and configuration.

use super::context::TaskContext;
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::future::{Deferred, Promise};

use std::sync::Arc;

/// Stack size given to a task unless configured otherwise: 256 KiB.
pub const DEFAULT_STACK_SIZE: usize = 256 * 1024;

/// Task factory, used to configure a task before submitting it.
///
/// # Examples
///
/// ```rust
/// use fiberwait::{PoolBuilder, task};
///
/// let pool = PoolBuilder::new().worker_threads(1).build().unwrap();
///
/// let named = task::Builder::new()
///     .name("checksum")
///     .stack_size(64 * 1024)
///     .submit(&pool.executor(), || Ok(task::id()));
///
/// assert!(named.get().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    name: Option<String>,
    stack_size: Option<usize>,
}

impl Builder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names the task. The name shows up in logs only.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the size in bytes of the task stack.
    ///
    /// Defaults to [`DEFAULT_STACK_SIZE`]. A size the system cannot provide
    /// makes the submission fail with [`Error::Stack`].
    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Submits `body` to run as a task on `executor`.
    ///
    /// Returns immediately. The body starts from a job posted to
    /// `executor`, never on the caller's stack, and may
    /// [`wait`](crate::wait) on any [`Deferred`]. The returned deferred
    /// completes with the body's outcome; a panic in the body completes it
    /// with [`Error::Panicked`].
    ///
    /// Submitting to a stopped executor yields a deferred already failed with
    /// [`Error::Stopped`].
    pub fn submit<F, T>(self, executor: &Arc<dyn Executor>, body: F) -> Deferred<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        if executor.stopped() {
            return Deferred::failed(Error::Stopped);
        }

        let mut promise = Promise::new();
        let deferred = promise.deferred();

        let context = Arc::new(TaskContext::new(
            self.name,
            self.stack_size.unwrap_or(DEFAULT_STACK_SIZE),
            executor.clone(),
        ));

        tracing::trace!(task.id = %context.id(), task.name = context.name(), "submitting task");

        executor.post(Box::new(move || {
            if context.set_task(body, promise) {
                context.resume();
            }
        }));

        deferred
    }
}

/// Submits `body` to run as a task on `executor`, with default settings.
///
/// See [`Builder::submit`].
pub fn submit<F, T>(executor: &Arc<dyn Executor>, body: F) -> Deferred<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    Builder::new().submit(executor, body)
}
