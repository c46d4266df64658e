use super::Promise;
use super::shared::{Callback, Shared};
use crate::error::{Error, Result, violation};

use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

/// The read side of a single-assignment result slot.
///
/// A `Deferred` is handed out by [`Promise::deferred`] and by every task
/// submission. It can be observed in three ways:
///
/// - blocking, with [`get`](Self::get) or [`wait`](Self::wait),
/// - from inside a task, with [`crate::wait`], which suspends only the task,
/// - from async code, since `Deferred<T>` implements [`Future`].
///
/// A `Deferred` built with [`Default`] has no shared state and is *invalid*.
/// Reading from it is a contract violation.
pub struct Deferred<T> {
    shared: Option<Arc<Shared<T>>>,
}

impl<T> Deferred<T> {
    pub(crate) fn from_shared(shared: Arc<Shared<T>>) -> Self {
        Self {
            shared: Some(shared),
        }
    }

    /// Creates a deferred that already holds `value`.
    pub fn ready(value: T) -> Self {
        Self::from_shared(Arc::new(Shared::completed(Ok(value))))
    }

    /// Creates a deferred that already holds `error`.
    pub fn failed(error: Error) -> Self {
        Self::from_shared(Arc::new(Shared::completed(Err(error))))
    }

    /// Returns `true` when this deferred is bound to a promise.
    pub fn is_valid(&self) -> bool {
        self.shared.is_some()
    }

    /// Returns `true` once the outcome is available.
    ///
    /// Invalid deferreds are never ready.
    pub fn is_ready(&self) -> bool {
        self.shared.as_ref().is_some_and(|shared| shared.is_ready())
    }

    /// Blocks the calling thread until the outcome is available, then
    /// returns it.
    ///
    /// Inside a task prefer [`crate::wait`], which suspends the task instead
    /// of the worker thread.
    pub fn get(self) -> Result<T> {
        let shared = self.shared();
        shared.wait();

        match shared.take() {
            Some(outcome) => outcome,
            None => violation("outcome already taken"),
        }
    }

    /// Blocks the calling thread until the outcome is available.
    pub fn wait(&self) {
        self.shared().wait();
    }

    /// Blocks for at most `timeout`. Returns `true` if the outcome is
    /// available.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.shared().wait_timeout(timeout)
    }

    /// Chains a continuation.
    ///
    /// `f` receives this deferred once it is complete and runs on the thread
    /// that completes it, or inline when it is already complete. Its return
    /// value completes the returned deferred. A panic inside `f` completes it
    /// with [`Error::Panicked`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fiberwait::Promise;
    ///
    /// let mut promise = Promise::new();
    /// let doubled = promise.deferred().then(|d| d.get().unwrap() * 2);
    ///
    /// promise.set_value(21);
    /// assert_eq!(doubled.get().unwrap(), 42);
    /// ```
    pub fn then<U, F>(self, f: F) -> Deferred<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(Deferred<T>) -> U + Send + 'static,
    {
        let shared = self.shared().clone();

        let mut promise = Promise::new();
        let chained = promise.deferred();

        shared.on_complete(Box::new(move || {
            match panic::catch_unwind(AssertUnwindSafe(|| f(self))) {
                Ok(value) => promise.set_value(value),
                Err(payload) => promise.set_error(Error::from_panic(payload)),
            }
        }));

        chained
    }

    /// Registers a callback that runs once the outcome is available.
    pub(crate) fn on_complete(&self, callback: Callback) {
        self.shared().on_complete(callback);
    }

    #[track_caller]
    fn shared(&self) -> &Arc<Shared<T>> {
        match &self.shared {
            Some(shared) => shared,
            None => violation("deferred has no shared state"),
        }
    }
}

impl<T> Default for Deferred<T> {
    /// Returns an invalid deferred.
    fn default() -> Self {
        Self { shared: None }
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T>;

    /// Polls the outcome.
    ///
    /// The waker is registered under the slot lock, so a completion that
    /// races with this poll is never missed.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.shared().poll(cx)
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("valid", &self.is_valid())
            .field("ready", &self.is_ready())
            .finish()
    }
}
