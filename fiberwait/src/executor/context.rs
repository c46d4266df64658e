use std::cell::Cell;

/// Identity of the pool worker running on the current thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WorkerId {
    /// Identifier of the owning pool.
    pub(crate) pool: usize,

    /// Index of the worker (and of its local queue) inside the pool.
    pub(crate) index: usize,
}

thread_local! {
    /// Worker identity of the current thread.
    ///
    /// Set for the whole lifetime of a pool worker thread. Lets `post` pick
    /// the local queue and `dispatch` decide whether it may run inline,
    /// without passing handles through every call.
    static CURRENT_WORKER: Cell<Option<WorkerId>> = const { Cell::new(None) };
}

/// Installs `worker` as the identity of the current thread for the duration
/// of `f`, restoring the previous one afterwards.
pub(crate) fn enter_worker<R>(worker: WorkerId, f: impl FnOnce() -> R) -> R {
    CURRENT_WORKER.with(|current| {
        let prev = current.replace(Some(worker));

        let out = f();

        current.set(prev);
        out
    })
}

/// Returns the worker index of the current thread if it belongs to `pool`.
pub(crate) fn worker_index(pool: usize) -> Option<usize> {
    CURRENT_WORKER
        .with(Cell::get)
        .filter(|worker| worker.pool == pool)
        .map(|worker| worker.index)
}
