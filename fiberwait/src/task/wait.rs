//! Waiting on a [`Deferred`] from inside a task.

use super::registry;
use crate::error::{Result, violation};
use crate::future::Deferred;

/// Waits for `deferred` from inside a task, without blocking the worker.
///
/// If the value is already there it is returned right away. Otherwise the
/// running task registers a continuation, suspends, and is resumed through
/// its executor once the value arrives; the worker thread meanwhile runs
/// other jobs. The task may continue on a different worker thread.
///
/// If the executor has been stopped by the time the value arrives, the
/// task stays suspended and never returns from this call.
///
/// # Panics
///
/// Panics with a [`ContractViolation`](crate::ContractViolation) if
/// `deferred` is invalid, or if it is not ready and the caller is not a task
/// body.
///
/// # Examples
///
/// ```rust
/// use fiberwait::{PoolBuilder, Promise};
///
/// let pool = PoolBuilder::new().worker_threads(1).build().unwrap();
///
/// let mut promise = Promise::new();
/// let input = promise.deferred();
///
/// let doubled = pool.submit(move || Ok(fiberwait::wait(input)? * 2));
/// promise.set_value(21);
///
/// assert_eq!(doubled.get().unwrap(), 42);
/// ```
pub fn wait<T>(deferred: Deferred<T>) -> Result<T>
where
    T: Send + 'static,
{
    if !deferred.is_valid() {
        violation("waiting on an invalid deferred");
    }

    if deferred.is_ready() {
        return deferred.get();
    }

    let Some(context) = registry::current() else {
        violation("waiting on a pending deferred outside a task");
    };

    let waiter = context.clone();
    deferred.on_complete(Box::new(move || {
        if waiter.executor().stopped() {
            tracing::debug!(task.id = %waiter.id(), "executor stopped, task left suspended");
            return;
        }
        waiter.wake();
    }));

    context.suspend();

    debug_assert!(deferred.is_ready());
    deferred.get()
}
