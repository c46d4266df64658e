//! Executors that run posted jobs on worker threads.
//!
//! The task machinery only needs three things from an executor, captured by
//! the [`Executor`] trait:
//! - [`post`](Executor::post): enqueue a job for later execution,
//! - [`dispatch`](Executor::dispatch): run a job inline when already on one
//!   of the executor's workers, otherwise enqueue it,
//! - [`stopped`](Executor::stopped): whether the executor is shutting down.
//!
//! [`ThreadPool`] is the bundled implementation: a multi-threaded,
//! work-stealing pool built from
//! - [`pool`]: lifecycle and the `Executor` implementation,
//! - [`worker`]: the per-thread run loop,
//! - [`work_stealing`]: the global injector and per-worker queues,
//! - [`context`]: thread-local worker identity.

pub(crate) mod builder;
pub(crate) mod context;
pub(crate) mod pool;
pub(crate) mod worker;
mod work_stealing;

#[cfg(feature = "system-pool")]
pub(crate) mod system;

pub use builder::PoolBuilder;
pub use pool::ThreadPool;

/// A unit of work accepted by an [`Executor`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Something that runs [`Job`]s, usually on a pool of worker threads.
pub trait Executor: Send + Sync + 'static {
    /// Enqueues `job` for asynchronous execution.
    ///
    /// The job never runs on the calling stack. Jobs posted after the
    /// executor stopped are dropped without running.
    fn post(&self, job: Job);

    /// Runs `job` inline if the caller is one of this executor's worker
    /// threads, otherwise behaves like [`post`](Self::post).
    fn dispatch(&self, job: Job);

    /// Returns `true` once the executor has been asked to stop.
    fn stopped(&self) -> bool;
}
