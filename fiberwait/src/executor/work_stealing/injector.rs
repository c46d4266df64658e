use crate::executor::Job;

use parking_lot::{Condvar, Mutex};

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// How long an idle worker sleeps before looking for work again.
///
/// Local pushes do notify, but a worker may miss a notification between its
/// last steal attempt and parking; the timeout bounds that delay.
const PARK_TIMEOUT: Duration = Duration::from_millis(1);

/// Global job injector for the work-stealing pool.
///
/// Jobs posted from outside the pool land here before being picked up by a
/// worker. The injector also coordinates parking and waking of idle workers.
pub(crate) struct Injector {
    /// Globally injected jobs, taken in FIFO order.
    queue: Mutex<VecDeque<Job>>,

    /// Condition variable parked workers wait on.
    condvar: Condvar,

    /// Set once the pool is stopping.
    shutdown: AtomicBool,
}

impl Injector {
    /// Creates an empty injector.
    pub(crate) fn new() -> Self {
        Injector {
            queue: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Signals shutdown and wakes all parked workers.
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);

        // Take the lock so a worker between its check and its wait cannot
        // miss the notification.
        let _queue = self.queue.lock();
        self.condvar.notify_all();
    }

    /// Returns `true` once shutdown was signalled.
    pub(crate) fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Pushes a job and wakes one parked worker.
    pub(crate) fn push(&self, job: Job) {
        self.queue.lock().push_back(job);
        self.condvar.notify_one();
    }

    /// Wakes one parked worker, e.g. after a push to a local queue.
    pub(crate) fn notify(&self) {
        self.condvar.notify_one();
    }

    /// Parks the current worker until a job is pushed, shutdown is signalled
    /// or the park timeout elapses.
    pub(crate) fn park(&self) {
        let mut queue = self.queue.lock();

        if !queue.is_empty() || self.is_shutdown() {
            return;
        }

        let _ = self.condvar.wait_for(&mut queue, PARK_TIMEOUT);
    }

    /// Takes the oldest job, if any.
    pub(crate) fn steal(&self) -> Option<Job> {
        self.queue.lock().pop_front()
    }

    /// Drops every queued job. Returns how many were dropped.
    pub(crate) fn clear(&self) -> usize {
        let drained: Vec<Job> = self.queue.lock().drain(..).collect();
        drained.len()
    }
}
