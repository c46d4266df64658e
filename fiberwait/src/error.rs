//! Error types.
//!
//! Two kinds of failure exist in this crate and they never mix:
//!
//! - [`Error`] is a runtime outcome. It travels through a
//!   [`Deferred`](crate::Deferred), is returned by [`wait`](crate::wait) and
//!   can be handled like any other `Result`.
//! - [`ContractViolation`] signals misuse of the API (waiting outside a task,
//!   resuming a running task, ...). It is raised as a panic payload and is
//!   not meant to be recovered from.

use std::any::Any;
use std::fmt;

/// Outcome of a failed operation or task.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The [`Promise`](crate::Promise) was dropped before a value was set.
    #[error("promise dropped before a value was set")]
    BrokenPromise,

    /// The task body panicked. Carries the panic message when it was a string.
    #[error("task panicked: {0}")]
    Panicked(String),

    /// The stack for a task could not be allocated.
    #[error("failed to allocate task stack: {0}")]
    Stack(String),

    /// The executor was stopped before the task could be scheduled.
    #[error("executor stopped before the task was scheduled")]
    Stopped,

    /// Application-defined failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Builds an [`Error::Other`] from a plain message.
    pub fn msg<M>(message: M) -> Self
    where
        M: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Error::Other(anyhow::Error::msg(message))
    }

    /// Converts a caught panic payload into [`Error::Panicked`].
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "<non-string panic payload>".to_owned()
        };

        Error::Panicked(message)
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Panic payload raised when the task protocol is misused.
///
/// These are programming errors: a [`Deferred`](crate::Deferred) without
/// shared state, [`wait`](crate::wait) called outside a task, a task resumed
/// while it is already running, and so on. Outside a task the payload unwinds
/// like any panic and can be observed with [`std::panic::catch_unwind`].
/// Raised on a task stack, it aborts the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractViolation {
    message: &'static str,
}

impl ContractViolation {
    /// Human readable description of the violated rule.
    pub fn message(&self) -> &'static str {
        self.message
    }
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "contract violation: {}", self.message)
    }
}

/// Logs and raises a [`ContractViolation`].
#[cold]
#[track_caller]
pub(crate) fn violation(message: &'static str) -> ! {
    tracing::error!(%message, location = %std::panic::Location::caller(), "contract violation");
    std::panic::panic_any(ContractViolation { message })
}
