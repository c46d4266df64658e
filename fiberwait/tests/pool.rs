mod common;

use fiberwait::{Error, PoolBuilder};

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex, mpsc};
use std::thread;

#[test]
fn test_pool_runs_posted_jobs() {
    let pool = PoolBuilder::new().worker_threads(2).build().unwrap();
    let counter = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = mpsc::channel();

    for _ in 0..100 {
        let counter = counter.clone();
        let tx = tx.clone();

        pool.post(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            tx.send(()).unwrap();
        });
    }

    for _ in 0..100 {
        rx.recv().unwrap();
    }
    assert_eq!(counter.load(Ordering::SeqCst), 100);
}

#[test]
fn test_worker_threads_run_in_parallel() {
    let pool = PoolBuilder::new().worker_threads(4).build().unwrap();
    assert_eq!(pool.worker_threads(), 4);

    // Only completes if four jobs are running at the same time.
    let barrier = Arc::new(Barrier::new(4));
    let names = Arc::new(Mutex::new(HashSet::new()));
    let (tx, rx) = mpsc::channel();

    for _ in 0..4 {
        let barrier = barrier.clone();
        let names = names.clone();
        let tx = tx.clone();

        pool.post(move || {
            barrier.wait();
            names
                .lock()
                .unwrap()
                .insert(thread::current().name().map(str::to_owned));
            tx.send(()).unwrap();
        });
    }

    for _ in 0..4 {
        rx.recv().unwrap();
    }
    assert_eq!(names.lock().unwrap().len(), 4);
}

#[test]
fn test_worker_threads_are_named() {
    let pool = PoolBuilder::new()
        .worker_threads(1)
        .thread_name("glue")
        .build()
        .unwrap();
    let (tx, rx) = mpsc::channel();

    pool.post(move || {
        tx.send(thread::current().name().map(str::to_owned)).unwrap();
    });

    assert_eq!(rx.recv().unwrap().as_deref(), Some("glue-0"));
}

#[test]
fn test_dispatch_runs_inline_on_a_worker() {
    let pool = PoolBuilder::new().worker_threads(1).build().unwrap();
    let executor = pool.executor();
    let (tx, rx) = mpsc::channel();

    pool.post(move || {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();

        executor.dispatch(Box::new(move || flag.store(true, Ordering::SeqCst)));

        tx.send(ran.load(Ordering::SeqCst)).unwrap();
    });

    assert!(rx.recv().unwrap());
}

#[test]
fn test_dispatch_from_outside_is_posted() {
    let pool = PoolBuilder::new().worker_threads(1).build().unwrap();
    let (tx, rx) = mpsc::channel();
    let caller = thread::current().id();

    pool.dispatch(move || {
        tx.send(thread::current().id()).unwrap();
    });

    assert_ne!(rx.recv().unwrap(), caller);
}

#[test]
fn test_post_after_stop_is_dropped() {
    let pool = PoolBuilder::new().worker_threads(1).build().unwrap();
    let (tx, rx) = mpsc::channel::<()>();

    pool.stop();
    assert!(pool.stopped());
    assert!(pool.executor().stopped());

    pool.post(move || {
        let _ = tx.send(());
    });

    assert!(rx.recv().is_err());
}

#[test]
fn test_submit_after_stop_fails() {
    let pool = PoolBuilder::new().worker_threads(1).build().unwrap();
    pool.stop();

    let result = pool.submit(|| Ok(1));

    assert!(matches!(result.get(), Err(Error::Stopped)));
}

#[test]
fn test_panicking_job_does_not_kill_the_worker() {
    let pool = PoolBuilder::new().worker_threads(1).build().unwrap();
    let (tx, rx) = mpsc::channel();

    pool.post(|| panic!("job failed"));
    pool.post(move || tx.send("still alive").unwrap());

    assert_eq!(rx.recv().unwrap(), "still alive");
}

#[test]
fn test_shutdown_joins_workers() {
    let pool = PoolBuilder::new().worker_threads(1).build().unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    let seen = counter.clone();
    pool.post(move || {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    common::drain(&pool);

    pool.shutdown();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}
