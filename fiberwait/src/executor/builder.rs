use super::ThreadPool;
use crate::task::DEFAULT_STACK_SIZE;

use std::io;
use std::thread;

/// Builder for configuring and creating a [`ThreadPool`].
///
/// # Examples
///
/// ```rust
/// use fiberwait::PoolBuilder;
///
/// let pool = PoolBuilder::new()
///     .worker_threads(4)
///     .thread_name("io-glue")
///     .stack_size(128 * 1024)
///     .build()
///     .unwrap();
///
/// assert_eq!(pool.worker_threads(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct PoolBuilder {
    /// Number of worker threads in the pool.
    worker_threads: usize,

    /// Prefix of worker thread names.
    thread_name: String,

    /// Default task stack size for [`ThreadPool::submit`].
    stack_size: usize,
}

impl PoolBuilder {
    /// Creates a new `PoolBuilder` with default configuration.
    ///
    /// By default, the number of worker threads is set to the number
    /// of available logical CPUs, falling back to `1` if unavailable.
    pub fn new() -> Self {
        let worker_threads = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self {
            worker_threads,
            thread_name: String::from("fiberwait-worker"),
            stack_size: DEFAULT_STACK_SIZE,
        }
    }

    /// Sets the number of worker threads.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn worker_threads(mut self, n: usize) -> Self {
        assert!(n > 0, "worker_threads must be > 0");

        self.worker_threads = n;
        self
    }

    /// Sets the prefix of worker thread names.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Sets the stack size of tasks submitted through
    /// [`ThreadPool::submit`].
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }

    /// Builds the pool and starts its workers.
    ///
    /// # Errors
    ///
    /// Returns the OS error if a worker thread cannot be spawned.
    pub fn build(self) -> io::Result<ThreadPool> {
        ThreadPool::new(self.worker_threads, &self.thread_name, self.stack_size)
    }
}

impl Default for PoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}
