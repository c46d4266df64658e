use crate::error::{ContractViolation, Error, Result, violation};

use parking_lot::{Condvar, Mutex};

use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

/// Callback run once the outcome is available.
pub(crate) type Callback = Box<dyn FnOnce() + Send>;

/// Lifecycle of the single outcome slot.
enum Slot<T> {
    /// No outcome yet.
    Pending,

    /// Outcome written, not yet read.
    Ready(Result<T>),

    /// Outcome moved out by the reader.
    Taken,
}

struct State<T> {
    slot: Slot<T>,

    /// Continuations registered before completion, run in registration order.
    callbacks: Vec<Callback>,

    /// Waker of the last `poll` through the `Future` impl.
    waker: Option<Waker>,
}

/// State shared between a [`Promise`](super::Promise) and its
/// [`Deferred`](super::Deferred).
///
/// The outcome is written once. Blocking readers park on `ready`;
/// continuation readers register a [`Callback`] which runs on the completing
/// thread, outside the lock.
pub(crate) struct Shared<T> {
    state: Mutex<State<T>>,
    ready: Condvar,
}

impl<T> Shared<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State {
                slot: Slot::Pending,
                callbacks: Vec::new(),
                waker: None,
            }),
            ready: Condvar::new(),
        }
    }

    /// Creates state that is already complete.
    pub(crate) fn completed(outcome: Result<T>) -> Self {
        let shared = Self::new();
        shared.state.lock().slot = Slot::Ready(outcome);
        shared
    }

    /// Writes the outcome, wakes blocked readers and runs continuations.
    pub(crate) fn complete(&self, outcome: Result<T>) {
        let (callbacks, waker) = {
            let mut state = self.state.lock();

            if !matches!(state.slot, Slot::Pending) {
                drop(state);
                violation("outcome written twice");
            }

            state.slot = Slot::Ready(outcome);
            (mem::take(&mut state.callbacks), state.waker.take())
        };

        self.ready.notify_all();

        for callback in callbacks {
            notify(callback);
        }

        if let Some(waker) = waker {
            notify(|| waker.wake());
        }
    }

    pub(crate) fn is_ready(&self) -> bool {
        !matches!(self.state.lock().slot, Slot::Pending)
    }

    /// Blocks the calling thread until the outcome is written.
    pub(crate) fn wait(&self) {
        let mut state = self.state.lock();
        while matches!(state.slot, Slot::Pending) {
            self.ready.wait(&mut state);
        }
    }

    /// Blocks for at most `timeout`. Returns whether the outcome is available.
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();

        while matches!(state.slot, Slot::Pending) {
            if self.ready.wait_until(&mut state, deadline).timed_out() {
                return !matches!(state.slot, Slot::Pending);
            }
        }

        true
    }

    /// Moves the outcome out, if it is available.
    pub(crate) fn take(&self) -> Option<Result<T>> {
        let mut state = self.state.lock();

        match mem::replace(&mut state.slot, Slot::Taken) {
            Slot::Ready(outcome) => Some(outcome),
            other => {
                state.slot = other;
                None
            }
        }
    }

    /// Registers `callback` to run once the outcome is written.
    ///
    /// Runs it immediately on the calling thread when the outcome is already
    /// there.
    pub(crate) fn on_complete(&self, callback: Callback) {
        let mut state = self.state.lock();

        if matches!(state.slot, Slot::Pending) {
            state.callbacks.push(callback);
            return;
        }

        drop(state);
        callback();
    }

    /// Polls the outcome, registering the waker when it is not ready.
    ///
    /// The waker is stored under the same lock that `complete` takes, so a
    /// completion racing with this call cannot be missed.
    pub(crate) fn poll(&self, cx: &mut Context<'_>) -> Poll<Result<T>> {
        let mut state = self.state.lock();

        match mem::replace(&mut state.slot, Slot::Taken) {
            Slot::Ready(outcome) => Poll::Ready(outcome),
            Slot::Pending => {
                state.slot = Slot::Pending;
                state.waker = Some(cx.waker().clone());
                Poll::Pending
            }
            Slot::Taken => {
                drop(state);
                violation("outcome polled after it was taken")
            }
        }
    }
}

/// Runs one completion callback.
///
/// Completion may happen on a task stack, which a panic must not leave, so
/// a panicking callback or waker is logged and skipped. Contract violations
/// keep unwinding.
fn notify(callback: impl FnOnce()) {
    let Err(payload) = panic::catch_unwind(AssertUnwindSafe(callback)) else {
        return;
    };

    if payload.is::<ContractViolation>() {
        panic::resume_unwind(payload);
    }

    tracing::error!(error = %Error::from_panic(payload), "completion callback panicked");
}
