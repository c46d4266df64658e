use super::{PoolBuilder, ThreadPool};
use crate::future::Deferred;

use std::sync::OnceLock;

/// Returns the process-wide pool, starting it on first use.
///
/// It runs one worker per available CPU and is never stopped.
///
/// # Panics
///
/// Panics if the worker threads cannot be spawned on first use.
pub fn system_pool() -> &'static ThreadPool {
    static POOL: OnceLock<ThreadPool> = OnceLock::new();

    POOL.get_or_init(|| {
        match PoolBuilder::new().thread_name("fiberwait-system").build() {
            Ok(pool) => pool,
            Err(err) => panic!("failed to start the system pool: {err}"),
        }
    })
}

/// Submits `body` as a task on the [`system_pool`].
///
/// # Examples
///
/// ```rust
/// let greeting = fiberwait::submit(|| {
///     let name = fiberwait::wait(fiberwait::Deferred::ready("fiber"))?;
///     Ok(format!("hello, {name}"))
/// });
///
/// assert_eq!(greeting.get().unwrap(), "hello, fiber");
/// ```
pub fn submit<F, T>(body: F) -> Deferred<T>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    system_pool().submit(body)
}
