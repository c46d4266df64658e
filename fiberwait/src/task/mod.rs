//! Tasks: closures running on their own stack that can wait without
//! blocking a thread.
//!
//! A task is submitted to an [`Executor`](crate::Executor) with [`submit`]
//! (or a [`Builder`]) and starts from a job posted there. Inside the body,
//! [`wait`](crate::wait) on a pending [`Deferred`](crate::Deferred)
//! switches off the task stack and frees the worker thread; the task is
//! resumed through the same executor when the value arrives.
//!
//! Internally a task is made of
//! - a `Fiber`: the stack and the machine context parked on it,
//! - a `TaskContext`: the state machine deciding who may resume it,
//! - the registry: the thread-local slot naming the task running on the
//!   current thread.

mod context;
mod fiber;
mod id;
mod registry;
mod state;
mod submit;
mod wait;

pub use id::{Id, id, in_task, try_id};
pub use submit::{Builder, DEFAULT_STACK_SIZE, submit};
pub use wait::wait;
