/// Task is bound (or about to be) but has never run.
pub(crate) const CREATED: usize = 0;

/// Task stack is executing on some thread.
///
/// At most one thread may observe this state at a time; it owns the fiber.
pub(crate) const RUNNING: usize = 1;

/// Task is parked at a wait point with no resume pending.
pub(crate) const SUSPENDED: usize = 2;

/// Task was woken while still running toward its wait point.
///
/// The resumer posts the resume once the stack has actually switched out.
pub(crate) const NOTIFIED: usize = 3;

/// A resume for the task has been posted to the executor.
pub(crate) const SCHEDULED: usize = 4;

/// Task body returned. The task will not run again.
pub(crate) const COMPLETED: usize = 5;

/// Short name of a state, for logs.
pub(crate) fn name(state: usize) -> &'static str {
    match state {
        CREATED => "created",
        RUNNING => "running",
        SUSPENDED => "suspended",
        NOTIFIED => "notified",
        SCHEDULED => "scheduled",
        COMPLETED => "completed",
        _ => "unknown",
    }
}
