#![allow(dead_code)]

use fiberwait::{Executor, Job, ThreadPool};

use std::future::Future;
use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::task::{Context, Poll, Wake, Waker};
use std::thread::{self, Thread};

/// Executor forwarding to a pool while counting what goes through it.
pub struct SpyExecutor {
    inner: Arc<dyn Executor>,
    posts: AtomicUsize,
    dispatches: AtomicUsize,
}

impl SpyExecutor {
    pub fn wrap(pool: &ThreadPool) -> Arc<Self> {
        Arc::new(Self {
            inner: pool.executor(),
            posts: AtomicUsize::new(0),
            dispatches: AtomicUsize::new(0),
        })
    }

    pub fn handle(self: &Arc<Self>) -> Arc<dyn Executor> {
        self.clone()
    }

    pub fn posts(&self) -> usize {
        self.posts.load(Ordering::SeqCst)
    }

    pub fn dispatches(&self) -> usize {
        self.dispatches.load(Ordering::SeqCst)
    }
}

impl Executor for SpyExecutor {
    fn post(&self, job: Job) {
        self.posts.fetch_add(1, Ordering::SeqCst);
        self.inner.post(job);
    }

    fn dispatch(&self, job: Job) {
        self.dispatches.fetch_add(1, Ordering::SeqCst);
        self.inner.dispatch(job);
    }

    fn stopped(&self) -> bool {
        self.inner.stopped()
    }
}

/// Blocks until every job posted to `pool` so far has been picked up.
///
/// Only meaningful for a single-worker pool, where jobs run in order.
pub fn drain(pool: &ThreadPool) {
    let (tx, rx) = mpsc::channel();
    pool.post(move || {
        let _ = tx.send(());
    });
    rx.recv().expect("pool stopped before draining");
}

struct ThreadWaker(Thread);

impl Wake for ThreadWaker {
    fn wake(self: Arc<Self>) {
        self.0.unpark();
    }
}

/// Minimal executor for a single future on the calling thread.
pub fn block_on<F: Future>(future: F) -> F::Output {
    let mut future = pin!(future);

    let waker = Waker::from(Arc::new(ThreadWaker(thread::current())));
    let mut cx = Context::from_waker(&waker);

    loop {
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(output) => return output,
            Poll::Pending => thread::park(),
        }
    }
}
