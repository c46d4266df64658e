use crate::executor::{Executor, Job};

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Executor that only runs jobs when the test tells it to.
///
/// Every `post` and `dispatch` is counted and queued; nothing runs until
/// [`run_pending`](Self::run_pending) or [`run_one`](Self::run_one). This
/// makes every resume observable from the test thread.
#[derive(Default)]
pub(crate) struct ManualExecutor {
    queue: Mutex<VecDeque<Job>>,
    stopped: AtomicBool,
    posts: AtomicUsize,
    dispatches: AtomicUsize,
}

impl ManualExecutor {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Same executor, as the handle task submission expects.
    pub(crate) fn handle(self: &Arc<Self>) -> Arc<dyn Executor> {
        self.clone()
    }

    pub(crate) fn posts(&self) -> usize {
        self.posts.load(Ordering::SeqCst)
    }

    pub(crate) fn dispatches(&self) -> usize {
        self.dispatches.load(Ordering::SeqCst)
    }

    pub(crate) fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    pub(crate) fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// Drops every queued job without running it, like a pool shutting
    /// down. Returns how many were dropped.
    pub(crate) fn clear(&self) -> usize {
        let jobs: Vec<Job> = self.queue.lock().drain(..).collect();
        jobs.len()
    }

    /// Runs the oldest queued job. Returns `false` if there was none.
    pub(crate) fn run_one(&self) -> bool {
        let job = self.queue.lock().pop_front();

        match job {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Runs jobs until the queue is empty, including jobs queued meanwhile.
    /// Returns how many ran.
    pub(crate) fn run_pending(&self) -> usize {
        let mut ran = 0;
        while self.run_one() {
            ran += 1;
        }
        ran
    }
}

impl Executor for ManualExecutor {
    fn post(&self, job: Job) {
        self.posts.fetch_add(1, Ordering::SeqCst);
        self.queue.lock().push_back(job);
    }

    fn dispatch(&self, job: Job) {
        self.dispatches.fetch_add(1, Ordering::SeqCst);
        self.queue.lock().push_back(job);
    }

    fn stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jobs_wait_for_the_test() {
        let executor = ManualExecutor::new();
        let ran = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let ran = ran.clone();
            executor.post(Box::new(move || {
                ran.fetch_add(1, Ordering::SeqCst);
            }));
        }

        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(executor.posts(), 3);
        assert_eq!(executor.run_pending(), 3);
        assert_eq!(ran.load(Ordering::SeqCst), 3);
        assert!(!executor.run_one());
    }
}
