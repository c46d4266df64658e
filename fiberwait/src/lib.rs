//! # fiberwait
//!
//! **fiberwait** lets plain, synchronous-looking code wait for a future value
//! without blocking the thread it runs on.
//!
//! A task is an ordinary closure submitted to an [`Executor`]. It runs on its
//! own stack, so when it calls [`wait`] on a [`Deferred`] that is not ready
//! yet, the task is switched out and the worker thread goes back to running
//! other jobs. Once the value arrives the task is resumed through the same
//! executor, possibly on another worker, and `wait` returns the value.
//!
//! The crate provides:
//!
//! - **Single-assignment futures**: [`Promise`] / [`Deferred`], with blocking
//!   reads, continuations and an `std::future::Future` implementation
//! - **A work-stealing [`ThreadPool`]** implementing the [`Executor`] trait
//! - **Stackful tasks**: [`task::submit`] and [`task::Builder`], plus the
//!   process-wide [`submit`] on the [`system_pool`]
//!
//! ## Quick Start
//!
//! ```rust
//! use fiberwait::{PoolBuilder, Promise, wait};
//!
//! let pool = PoolBuilder::new().worker_threads(2).build().unwrap();
//!
//! let mut promise = Promise::new();
//! let request = promise.deferred();
//!
//! // The task suspends at `wait` without holding a worker.
//! let response = pool.submit(move || {
//!     let body: String = wait(request)?;
//!     Ok(body.len())
//! });
//!
//! promise.set_value(String::from("hello"));
//! assert_eq!(response.get().unwrap(), 5);
//! ```
//!
//! ## Modules
//!
//! - [`task`]: task submission, identity and configuration
//!
//! ## Caveat
//!
//! A task may resume on a different worker thread than the one it suspended
//! on. Thread-local values read before a [`wait`] must not be assumed to be
//! the same afterwards.

mod error;
mod executor;
mod future;
mod utils;

#[cfg(test)]
mod test_utils;

pub mod task;

pub use error::{ContractViolation, Error, Result};
pub use executor::{Executor, Job, PoolBuilder, ThreadPool};
pub use future::{Deferred, Promise};
pub use task::wait;

#[cfg(feature = "system-pool")]
pub use executor::system::{submit, system_pool};
