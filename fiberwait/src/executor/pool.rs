//! The work-stealing thread pool and its [`Executor`] implementation.

use crate::executor::context::{self, WorkerId, enter_worker};
use crate::executor::work_stealing::injector::Injector;
use crate::executor::work_stealing::queue::LocalQueue;
use crate::executor::worker::Worker;
use crate::executor::{Executor, Job};
use crate::future::Deferred;
use crate::task;

use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

/// State shared between a [`ThreadPool`], its workers and every
/// `Arc<dyn Executor>` handed out for it.
pub(crate) struct PoolShared {
    /// Process-unique pool identifier, matched against the worker
    /// thread-local to recognise this pool's own threads.
    pub(crate) id: usize,

    /// Global injector queue shared by all workers.
    pub(crate) injector: Injector,

    /// One local queue per worker.
    pub(crate) locals: Vec<LocalQueue>,
}

impl PoolShared {
    fn next_id() -> usize {
        static NEXT_ID: AtomicUsize = AtomicUsize::new(1);
        NEXT_ID.fetch_add(1, Ordering::Relaxed)
    }

    /// Drops all queued jobs. Called once the workers are gone.
    fn drain(&self) {
        let mut dropped = self.injector.clear();
        for local in &self.locals {
            dropped += local.clear();
        }

        if dropped > 0 {
            tracing::debug!(pool = self.id, dropped, "dropped queued jobs at shutdown");
        }
    }
}

impl Executor for PoolShared {
    /// Posting from one of this pool's workers goes to that worker's local
    /// queue; posting from anywhere else goes to the injector.
    fn post(&self, job: Job) {
        if self.injector.is_shutdown() {
            return;
        }

        match context::worker_index(self.id) {
            Some(index) => {
                self.locals[index].push(job);
                self.injector.notify();
            }
            None => self.injector.push(job),
        }
    }

    fn dispatch(&self, job: Job) {
        if context::worker_index(self.id).is_some() {
            job();
        } else {
            self.post(job);
        }
    }

    fn stopped(&self) -> bool {
        self.injector.is_shutdown()
    }
}

/// A multi-threaded, work-stealing pool of worker threads.
///
/// The pool:
/// - spawns its worker threads on construction,
/// - runs posted jobs until [`stop`](Self::stop) is called,
/// - hosts tasks submitted with [`submit`](Self::submit),
/// - stops and joins its workers when dropped.
///
/// Jobs still queued when the pool stops are dropped without running, and
/// tasks suspended at that point are never resumed.
///
/// # Examples
///
/// ```rust
/// use fiberwait::PoolBuilder;
///
/// let pool = PoolBuilder::new().worker_threads(2).build().unwrap();
/// let answer = pool.submit(|| Ok(6 * 7));
///
/// assert_eq!(answer.get().unwrap(), 42);
/// ```
pub struct ThreadPool {
    shared: Arc<PoolShared>,

    /// Join handles for worker threads.
    handles: Vec<JoinHandle<()>>,

    /// Stack size used by [`submit`](Self::submit).
    stack_size: usize,
}

impl ThreadPool {
    /// Creates a pool and spawns its workers.
    ///
    /// Workers are named `"{thread_name}-{index}"`.
    pub(crate) fn new(worker_threads: usize, thread_name: &str, stack_size: usize) -> io::Result<Self> {
        let shared = Arc::new(PoolShared {
            id: PoolShared::next_id(),
            injector: Injector::new(),
            locals: (0..worker_threads).map(|_| LocalQueue::new()).collect(),
        });

        let mut pool = Self {
            shared,
            handles: Vec::with_capacity(worker_threads),
            stack_size,
        };

        for index in 0..worker_threads {
            let worker = Worker::new(index, pool.shared.clone());
            let identity = WorkerId {
                pool: pool.shared.id,
                index,
            };

            // On error `pool` is dropped, which stops and joins the workers
            // spawned so far.
            let handle = thread::Builder::new()
                .name(format!("{thread_name}-{index}"))
                .spawn(move || enter_worker(identity, || worker.run()))?;

            pool.handles.push(handle);
        }

        tracing::debug!(pool = pool.shared.id, worker_threads, "thread pool started");

        Ok(pool)
    }

    /// Submits `body` as a task on this pool.
    ///
    /// Shorthand for [`task::submit`] with this pool's executor and its
    /// default stack size.
    pub fn submit<F, T>(&self, body: F) -> Deferred<T>
    where
        F: FnOnce() -> crate::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        task::Builder::new()
            .stack_size(self.stack_size)
            .submit(&self.executor(), body)
    }

    /// Returns a shareable handle implementing [`Executor`] for this pool.
    pub fn executor(&self) -> Arc<dyn Executor> {
        self.shared.clone()
    }

    /// Enqueues a plain job. See [`Executor::post`].
    pub fn post(&self, job: impl FnOnce() + Send + 'static) {
        self.shared.post(Box::new(job));
    }

    /// Runs a plain job inline on a worker, or enqueues it. See
    /// [`Executor::dispatch`].
    pub fn dispatch(&self, job: impl FnOnce() + Send + 'static) {
        self.shared.dispatch(Box::new(job));
    }

    /// Number of worker threads.
    pub fn worker_threads(&self) -> usize {
        self.shared.locals.len()
    }

    /// Asks every worker to stop after its current job.
    ///
    /// Continuations firing after this point see [`Executor::stopped`] and
    /// leave their task suspended.
    pub fn stop(&self) {
        if !self.shared.injector.is_shutdown() {
            tracing::debug!(pool = self.shared.id, "stopping thread pool");
        }
        self.shared.injector.shutdown();
    }

    /// Returns `true` once [`stop`](Self::stop) was called.
    pub fn stopped(&self) -> bool {
        self.shared.stopped()
    }

    /// Stops the pool and waits for all workers to exit.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.stop();

        // A pool dropped from one of its own workers cannot join itself; the
        // remaining workers exit on their own.
        let on_own_worker = context::worker_index(self.shared.id).is_some();

        for handle in self.handles.drain(..) {
            if on_own_worker {
                continue;
            }
            if let Err(payload) = handle.join() {
                tracing::error!(
                    pool = self.shared.id,
                    error = %crate::Error::from_panic(payload),
                    "worker thread panicked"
                );
            }
        }

        self.shared.drain();
    }
}

impl Drop for ThreadPool {
    /// Stops the pool and joins its workers.
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

impl fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadPool")
            .field("id", &self.shared.id)
            .field("worker_threads", &self.worker_threads())
            .field("stopped", &self.stopped())
            .finish()
    }
}
