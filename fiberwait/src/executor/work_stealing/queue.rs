use crate::executor::Job;

use parking_lot::Mutex;

use std::collections::VecDeque;

/// A per-worker local job queue.
///
/// The owning worker pushes and pops at the back (LIFO), which keeps a task
/// that was just resumed close to the worker that resumed it. Other workers
/// steal from the front (FIFO).
pub(crate) struct LocalQueue {
    /// Inner deque protected by a mutex.
    inner: Mutex<VecDeque<Job>>,
}

impl LocalQueue {
    /// Creates an empty local queue.
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    /// Pushes a job to the back of the queue.
    pub(crate) fn push(&self, job: Job) {
        self.inner.lock().push_back(job);
    }

    /// Pops a job from the back of the queue.
    pub(crate) fn pop(&self) -> Option<Job> {
        self.inner.lock().pop_back()
    }

    /// Steals a job from the front of the queue.
    pub(crate) fn steal(&self) -> Option<Job> {
        self.inner.lock().pop_front()
    }

    /// Drops every queued job. Returns how many were dropped.
    pub(crate) fn clear(&self) -> usize {
        let drained: Vec<Job> = self.inner.lock().drain(..).collect();
        drained.len()
    }
}
