//! Single-assignment result slots.
//!
//! A [`Promise`] is the write side and a [`Deferred`] the read side of one
//! outcome (`Result<T, Error>`). Besides blocking reads, a deferred accepts
//! continuations that run on the completing thread. The task machinery uses
//! those continuations to resume a suspended task without parking a worker.

mod deferred;
mod promise;
mod shared;

pub use deferred::Deferred;
pub use promise::Promise;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn value_is_available_after_set() {
        let mut promise = Promise::new();
        let deferred = promise.deferred();

        assert!(deferred.is_valid());
        assert!(!deferred.is_ready());

        promise.set_value(true);

        assert!(deferred.is_ready());
        assert!(deferred.get().unwrap());
    }

    #[test]
    fn dropped_promise_breaks_deferred() {
        let mut promise = Promise::<u8>::new();
        let deferred = promise.deferred();

        drop(promise);

        assert!(matches!(deferred.get(), Err(Error::BrokenPromise)));
    }

    #[test]
    fn default_deferred_is_invalid() {
        let deferred = Deferred::<()>::default();

        assert!(!deferred.is_valid());
        assert!(!deferred.is_ready());
    }

    #[test]
    fn continuation_runs_on_completion() {
        let mut promise = Promise::new();
        let chained = promise.deferred().then(|d| {
            assert!(d.is_ready());
            d.get().unwrap() == 100
        });

        assert!(!chained.is_ready());
        promise.set_value(100);
        assert!(chained.get().unwrap());
    }

    #[test]
    fn continuation_on_ready_runs_inline() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();

        let chained = Deferred::ready(5).then(move |d| {
            seen.fetch_add(1, Ordering::SeqCst);
            d.get().unwrap() + 1
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(chained.get().unwrap(), 6);
    }

    #[test]
    fn panicking_continuation_fails_chained() {
        let chained = Deferred::ready(()).then(|_| -> u32 { panic!("bad continuation") });

        match chained.get() {
            Err(Error::Panicked(message)) => assert_eq!(message, "bad continuation"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn blocking_get_sees_value_from_other_thread() {
        let mut promise = Promise::new();
        let deferred = promise.deferred();

        let writer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            promise.set_value("done");
        });

        assert_eq!(deferred.get().unwrap(), "done");
        writer.join().unwrap();
    }

    #[test]
    fn wait_timeout_reports_pending() {
        let mut promise = Promise::<()>::new();
        let deferred = promise.deferred();

        assert!(!deferred.wait_timeout(Duration::from_millis(5)));

        promise.set_value(());
        assert!(deferred.wait_timeout(Duration::from_millis(5)));
    }

    #[test]
    fn failed_deferred_carries_error() {
        let deferred = Deferred::<()>::failed(Error::msg("nope"));

        assert!(deferred.is_ready());
        assert_eq!(deferred.get().unwrap_err().to_string(), "nope");
    }

    #[test]
    fn second_read_side_is_a_violation() {
        let mut promise = Promise::<u8>::new();
        let _first = promise.deferred();

        let payload = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| promise.deferred()))
            .expect_err("second deferred must be refused");

        let violation = payload
            .downcast_ref::<crate::ContractViolation>()
            .expect("payload is a ContractViolation");
        assert_eq!(violation.message(), "promise read side retrieved twice");
    }

    #[test]
    fn poll_registers_waker_until_ready() {
        use std::future::Future;
        use std::pin::Pin;
        use std::task::{Context, Poll, Waker};

        let mut promise = Promise::new();
        let mut deferred = promise.deferred();
        let mut cx = Context::from_waker(Waker::noop());

        assert!(Pin::new(&mut deferred).poll(&mut cx).is_pending());

        promise.set_value(9);

        match Pin::new(&mut deferred).poll(&mut cx) {
            Poll::Ready(outcome) => assert_eq!(outcome.unwrap(), 9),
            Poll::Pending => panic!("completed deferred still pending"),
        }
    }

    #[test]
    fn panicking_callback_does_not_stop_completion() {
        let later = Arc::new(AtomicUsize::new(0));
        let seen = later.clone();

        let mut promise = Promise::new();
        let deferred = promise.deferred();
        deferred.on_complete(Box::new(|| panic!("callback failed")));
        deferred.on_complete(Box::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        promise.set_value(3);

        assert_eq!(later.load(Ordering::SeqCst), 1);
        assert_eq!(deferred.get().unwrap(), 3);
    }

    #[test]
    fn panicking_waker_does_not_escape_completion() {
        use std::future::Future;
        use std::pin::Pin;
        use std::task::{Context, Wake, Waker};

        struct FailingWaker;

        impl Wake for FailingWaker {
            fn wake(self: Arc<Self>) {
                panic!("waker failed");
            }
        }

        let mut promise = Promise::new();
        let mut deferred = promise.deferred();
        let waker = Waker::from(Arc::new(FailingWaker));

        assert!(Pin::new(&mut deferred).poll(&mut Context::from_waker(&waker)).is_pending());

        promise.set_value("delivered");

        assert!(deferred.is_ready());
    }
}
