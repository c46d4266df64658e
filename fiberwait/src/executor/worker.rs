//! Worker thread run loop.

use crate::error::ContractViolation;
use crate::executor::Job;
use crate::executor::pool::PoolShared;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// A worker thread of a [`ThreadPool`](crate::ThreadPool).
///
/// Each worker owns one local queue and cooperates with its siblings to
/// balance load. The lookup order is:
/// 1. Pop from its own local queue
/// 2. Steal from the global injector
/// 3. Steal from other workers
/// 4. Park if no work is available
pub(crate) struct Worker {
    /// Index of the worker and of its local queue.
    index: usize,

    /// State shared by all workers of the pool.
    shared: Arc<PoolShared>,
}

impl Worker {
    pub(crate) fn new(index: usize, shared: Arc<PoolShared>) -> Self {
        Self { index, shared }
    }

    /// Runs the worker loop until the pool is stopped.
    ///
    /// Jobs still queued when the pool stops are left to the pool, which
    /// drops them.
    pub(crate) fn run(&self) {
        tracing::trace!(worker = self.index, "worker started");

        loop {
            if self.shared.injector.is_shutdown() {
                break;
            }

            if let Some(job) = self.shared.locals[self.index].pop() {
                self.execute(job);
                continue;
            }

            if let Some(job) = self.shared.injector.steal() {
                self.execute(job);
                continue;
            }

            if let Some(job) = self.try_steal() {
                self.execute(job);
                continue;
            }

            self.shared.injector.park();
        }

        tracing::trace!(worker = self.index, "worker stopped");
    }

    /// Runs one job.
    ///
    /// An ordinary panic is logged and the worker keeps serving jobs. A
    /// [`ContractViolation`] aborts the process.
    fn execute(&self, job: Job) {
        let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) else {
            return;
        };

        if let Some(violation) = payload.downcast_ref::<ContractViolation>() {
            tracing::error!(worker = self.index, %violation, "aborting");
            std::process::abort();
        }

        tracing::error!(
            worker = self.index,
            error = %crate::Error::from_panic(payload),
            "job panicked"
        );
    }

    /// Attempts to steal a job from a sibling's local queue.
    ///
    /// Siblings are visited round-robin starting after this worker.
    fn try_steal(&self) -> Option<Job> {
        let len = self.shared.locals.len();

        if len <= 1 {
            return None;
        }

        for i in 0..len - 1 {
            let victim = (self.index + i + 1) % len;

            if let Some(job) = self.shared.locals[victim].steal() {
                return Some(job);
            }
        }
        None
    }
}
