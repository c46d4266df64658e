//! Per-task state machine.
//!
//! Decides who may resume a task and when: a task is resumed by exactly one
//! thread at a time, and each suspension accepts exactly one wake.

use super::fiber::{Body, Fiber, Switch, Yielder};
use super::id::Id;
use super::registry;
use super::state::{self, COMPLETED, CREATED, NOTIFIED, RUNNING, SCHEDULED, SUSPENDED};
use crate::error::{ContractViolation, Error, Result, violation};
use crate::executor::Executor;
use crate::future::Promise;
use crate::utils::ScopeGuard;

use std::cell::UnsafeCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// One submitted task: its suspendable stack, its progress and the
/// executor it resumes on.
///
/// The fiber is only touched by the thread that moved the state into
/// `RUNNING`, which is what makes the `UnsafeCell` sound. Shared ownership
/// (`Arc`) keeps the context alive while a continuation still has to resume
/// it, even after the submitter dropped everything else.
pub(crate) struct TaskContext {
    id: Id,

    name: Option<String>,

    /// Lifecycle state (see [`state`]).
    state: AtomicUsize,

    /// Stack slot, present once bound and until completion.
    fiber: UnsafeCell<Option<Fiber>>,

    /// Fiber-side handle. Set exactly once, by `set_task`.
    yielder: OnceLock<Yielder>,

    stack_size: usize,

    executor: Arc<dyn Executor>,
}

unsafe impl Sync for TaskContext {}

impl TaskContext {
    pub(crate) fn new(name: Option<String>, stack_size: usize, executor: Arc<dyn Executor>) -> Self {
        Self {
            id: Id::next(),
            name,
            state: AtomicUsize::new(CREATED),
            fiber: UnsafeCell::new(None),
            yielder: OnceLock::new(),
            stack_size,
            executor,
        }
    }

    pub(crate) fn id(&self) -> Id {
        self.id
    }

    pub(crate) fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    /// Binds `body` as the task body.
    ///
    /// The body's outcome (or its panic, as [`Error::Panicked`]) completes
    /// `promise`. The context is the running task on this thread for the
    /// duration of the binding. Returns `false` when the stack could not be
    /// allocated, in which case `promise` already holds the error and the
    /// task is completed.
    pub(crate) fn set_task<F, T>(self: &Arc<Self>, body: F, promise: Promise<T>) -> bool
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        if self.state.load(Ordering::Acquire) != CREATED || self.yielder.get().is_some() {
            violation("task body bound twice");
        }

        registry::enter(self.clone());
        let leave = ScopeGuard::new(registry::leave);

        let stack = match Fiber::allocate_stack(self.stack_size) {
            Ok(stack) => stack,
            Err(err) => {
                tracing::debug!(task.id = %self.id, error = %err, "task stack allocation failed");
                self.state.store(COMPLETED, Ordering::Release);
                drop(leave);
                promise.set_error(err);
                return false;
            }
        };

        let id = self.id;
        let body: Body = Box::new(move || {
            let outcome = match panic::catch_unwind(AssertUnwindSafe(body)) {
                Ok(outcome) => outcome,
                Err(payload) => {
                    if let Some(contract) = payload.downcast_ref::<ContractViolation>() {
                        tracing::error!(task.id = %id, violation = %contract, "aborting");
                        std::process::abort();
                    }
                    Err(Error::from_panic(payload))
                }
            };

            promise.complete(outcome);
        });

        let fiber = Fiber::new(stack, body);

        if self.yielder.set(fiber.yielder()).is_err() {
            violation("task body bound twice");
        }

        // Safety: still `CREATED`, nobody else holds the context yet.
        unsafe { *self.fiber.get() = Some(fiber) };

        tracing::trace!(task.id = %self.id, task.name = self.name(), "task bound");
        true
    }

    /// Runs the task until it suspends or completes.
    ///
    /// Only valid for a bound task that is `CREATED`, `SUSPENDED` or
    /// `SCHEDULED`; any other state means two resumes raced or the task is
    /// finished, both contract violations. Blocks the calling thread for the
    /// duration of the run.
    pub(crate) fn resume(self: &Arc<Self>) {
        let prev = self.state.load(Ordering::Acquire);

        if !matches!(prev, CREATED | SUSPENDED | SCHEDULED) {
            tracing::error!(task.id = %self.id, state = state::name(prev), "resume out of protocol");
            violation("task resumed while running or after completion");
        }

        if self.yielder.get().is_none() {
            violation("task resumed before a body was bound");
        }

        if self
            .state
            .compare_exchange(prev, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            violation("task resumed concurrently");
        }

        tracing::trace!(task.id = %self.id, from = state::name(prev), "resuming task");

        registry::enter(self.clone());

        // Safety: the RUNNING state guarantees that no other thread touches
        // the fiber.
        let switch = match unsafe { (*self.fiber.get()).as_mut() } {
            Some(fiber) => fiber.resume(),
            None => Switch::Completed,
        };

        registry::leave();

        match switch {
            Switch::Completed => {
                // Safety: still RUNNING.
                unsafe { *self.fiber.get() = None };
                self.state.store(COMPLETED, Ordering::Release);

                tracing::trace!(task.id = %self.id, "task completed");
            }
            Switch::Suspended => self.park(),
        }
    }

    /// Publishes a suspension that just handed control back to the resumer.
    fn park(self: &Arc<Self>) {
        match self
            .state
            .compare_exchange(RUNNING, SUSPENDED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                tracing::trace!(task.id = %self.id, "task suspended");
            }
            Err(NOTIFIED) => {
                // Woken before it got here; the wake left the resume to us.
                self.state.store(SCHEDULED, Ordering::Release);
                self.post_resume();
            }
            Err(other) => {
                tracing::error!(task.id = %self.id, state = state::name(other), "corrupt task state");
                violation("task state changed while running");
            }
        }
    }

    /// Suspends the running task, handing control back to its resumer.
    ///
    /// Must be called from the task's own stack while it is the running task
    /// on this thread. Consumes the caller's reference so that no strong
    /// count is parked on the task stack; the resumer keeps the context
    /// alive while it runs.
    pub(crate) fn suspend(self: Arc<Self>) {
        if !registry::is_current(&self) {
            violation("suspend called outside the task's own stack");
        }

        let Some(yielder) = self.yielder.get().copied() else {
            violation("suspend called on an unbound task");
        };

        tracing::trace!(task.id = %self.id, "suspending task");
        drop(self);

        // Safety: the registry check above proves we run on this task's
        // fiber.
        unsafe { yielder.suspend() };
    }

    /// Requests a resume after the completion the task is waiting for.
    ///
    /// Each suspension accepts exactly one wake:
    /// - `SUSPENDED`: the resume is posted right away,
    /// - `RUNNING`: the task has not switched out yet, so it is marked
    ///   `NOTIFIED` and its resumer posts the resume once it has.
    ///
    /// Any other state means a suspension was woken twice.
    pub(crate) fn wake(self: &Arc<Self>) {
        loop {
            match self.state.load(Ordering::Acquire) {
                SUSPENDED => {
                    if self
                        .state
                        .compare_exchange(SUSPENDED, SCHEDULED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        self.post_resume();
                        return;
                    }
                }
                RUNNING => {
                    if self
                        .state
                        .compare_exchange(RUNNING, NOTIFIED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return;
                    }
                }
                other => {
                    tracing::error!(task.id = %self.id, state = state::name(other), "wake out of protocol");
                    violation("task woken more than once for a single suspension");
                }
            }
        }
    }

    fn post_resume(self: &Arc<Self>) {
        let context = self.clone();
        self.executor.post(Box::new(move || context.resume()));
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> usize {
        self.state.load(Ordering::Acquire)
    }
}

impl Drop for TaskContext {
    fn drop(&mut self) {
        let state = *self.state.get_mut();

        if state != COMPLETED && state != CREATED {
            tracing::debug!(
                task.id = %self.id,
                state = state::name(state),
                "dropping a task that never completed"
            );
        }
    }
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &state::name(self.state.load(Ordering::Relaxed)))
            .finish()
    }
}
