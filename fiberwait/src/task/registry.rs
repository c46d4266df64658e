//! Per-thread record of the running task.
//!
//! The slot is occupied exactly while a task stack runs on the thread:
//! [`enter`] when a task is bound or resumed, [`leave`] when control comes
//! back. A task that suspends on thread A and resumes on thread B is only
//! ever visible through B's slot afterwards.
//!
//! The accessors are kept out of line: a task body can migrate to another
//! thread across a suspension, and every lookup has to resolve the
//! thread-local of the thread it runs on now.

use super::context::TaskContext;
use crate::error::violation;

use std::cell::RefCell;
use std::sync::Arc;

thread_local! {
    /// Task currently running on this thread.
    static CURRENT_TASK: RefCell<Option<Arc<TaskContext>>> = const { RefCell::new(None) };
}

/// Marks `context` as running on this thread.
#[inline(never)]
pub(crate) fn enter(context: Arc<TaskContext>) {
    CURRENT_TASK.with(|current| {
        let mut current = current.borrow_mut();

        if current.is_some() {
            drop(current);
            violation("a task is already running on this thread");
        }

        *current = Some(context);
    });
}

/// Clears the slot.
#[inline(never)]
pub(crate) fn leave() {
    let left = CURRENT_TASK.with(|current| current.borrow_mut().take());

    if left.is_none() {
        violation("no task is running on this thread");
    }
}

/// The task running on this thread, if any.
#[inline(never)]
pub(crate) fn current() -> Option<Arc<TaskContext>> {
    CURRENT_TASK.with(|current| current.borrow().clone())
}

/// Whether `context` is the task running on this thread.
#[inline(never)]
pub(crate) fn is_current(context: &TaskContext) -> bool {
    CURRENT_TASK.with(|current| {
        current
            .borrow()
            .as_ref()
            .is_some_and(|running| std::ptr::eq(Arc::as_ptr(running), context))
    })
}
