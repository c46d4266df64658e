//! The task stack slot.
//!
//! A [`Fiber`] owns a protected stack and the saved machine context of a
//! body running on it. It is a two-sided handshake:
//!
//! - the resumer calls [`Fiber::resume`], which switches onto the fiber
//!   stack and returns once the body suspends or finishes,
//! - the body calls [`Yielder::suspend`], which switches back to whoever
//!   resumed it and returns on the next resume, possibly on another thread.

use crate::error::{Error, Result, violation};

use context::stack::ProtectedFixedSizeStack;
use context::{Context, Transfer};

use std::fmt;
use std::ptr::NonNull;

/// Body executed on a fiber stack.
pub(crate) type Body = Box<dyn FnOnce() + Send + 'static>;

/// How control came back from [`Fiber::resume`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Switch {
    /// The body called [`Yielder::suspend`].
    Suspended,

    /// The body returned. The fiber must not be resumed again.
    Completed,
}

/// State reachable from both sides of the switch.
///
/// Lives in its own heap allocation so its address is stable while the
/// `Fiber` value itself moves around.
struct Inner {
    /// Context of the current resumer. Present while the body runs.
    caller: Option<Context>,

    /// Body, taken when the fiber starts.
    body: Option<Body>,

    completed: bool,
}

/// A stack plus the saved context of the body running on it.
pub(crate) struct Fiber {
    /// Saved fiber context while the body is not running.
    context: Option<Context>,

    inner: NonNull<Inner>,

    _stack: ProtectedFixedSizeStack,
}

// Moving a fiber between threads is the point of the type. Access is
// serialised by the owning task's state machine.
unsafe impl Send for Fiber {}

impl Fiber {
    /// Allocates a guarded stack of `size` bytes.
    pub(crate) fn allocate_stack(size: usize) -> Result<ProtectedFixedSizeStack> {
        ProtectedFixedSizeStack::new(size).map_err(|err| Error::Stack(format!("{err:?}")))
    }

    /// Prepares `body` to run on `stack`. Nothing runs until the first
    /// [`resume`](Self::resume).
    pub(crate) fn new(stack: ProtectedFixedSizeStack, body: Body) -> Self {
        let inner = NonNull::from(Box::leak(Box::new(Inner {
            caller: None,
            body: Some(body),
            completed: false,
        })));

        // Safety: `fiber_entry` never returns, and the stack outlives the
        // context because both are owned by this fiber.
        let context = unsafe { Context::new(&stack, fiber_entry) };

        Self {
            context: Some(context),
            inner,
            _stack: stack,
        }
    }

    /// Handle the body uses to suspend itself.
    pub(crate) fn yielder(&self) -> Yielder {
        Yielder { inner: self.inner }
    }

    /// Switches onto the fiber stack, starting the body on first use.
    ///
    /// Blocks the calling thread until the body suspends or returns.
    pub(crate) fn resume(&mut self) -> Switch {
        let Some(context) = self.context.take() else {
            violation("fiber resumed after completion");
        };

        // Safety: `context` is the saved state of this fiber, taken out so
        // it is jumped to exactly once.
        let transfer = unsafe { context.resume(self.inner.as_ptr() as usize) };

        // Safety: the body is parked again, nothing else touches `inner`.
        let completed = unsafe { self.inner.as_ref().completed };

        if completed {
            Switch::Completed
        } else {
            self.context = Some(transfer.context);
            Switch::Suspended
        }
    }
}

impl Drop for Fiber {
    /// Frees the stack.
    ///
    /// A body that never started is dropped normally. A body parked mid-way
    /// is discarded without unwinding: values living on its stack are leaked.
    fn drop(&mut self) {
        // Safety: allocated in `new` with `Box::leak`, freed only here.
        drop(unsafe { Box::from_raw(self.inner.as_ptr()) });
    }
}

impl fmt::Debug for Fiber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fiber")
            .field("parked", &self.context.is_some())
            .finish()
    }
}

/// Fiber-side handle to switch back to the resumer.
#[derive(Clone, Copy)]
pub(crate) struct Yielder {
    inner: NonNull<Inner>,
}

unsafe impl Send for Yielder {}
unsafe impl Sync for Yielder {}

impl Yielder {
    /// Switches back to the current resumer. Returns on the next resume.
    ///
    /// Kept out of line so that callers re-read thread-locals after it
    /// returns: the body may now run on a different thread.
    ///
    /// # Safety
    ///
    /// Must be called from the body of the fiber this handle belongs to,
    /// while that fiber is running.
    #[inline(never)]
    pub(crate) unsafe fn suspend(self) {
        let inner = self.inner.as_ptr();

        let Some(caller) = (unsafe { (*inner).caller.take() }) else {
            violation("fiber suspended while not running");
        };

        let transfer = unsafe { caller.resume(0) };

        unsafe { (*inner).caller = Some(transfer.context) };
    }
}

/// First frame on every fiber stack.
extern "C" fn fiber_entry(transfer: Transfer) -> ! {
    let inner = transfer.data as *mut Inner;

    // Safety: `Fiber::resume` passes its `Inner` pointer as data.
    unsafe { (*inner).caller = Some(transfer.context) };

    // Safety: as above. Run in its own statement so the body and its
    // captures are dropped before the final switch.
    if let Some(body) = unsafe { (*inner).body.take() } {
        body();
    }

    let caller = unsafe {
        (*inner).completed = true;
        (*inner).caller.take()
    };

    if let Some(caller) = caller {
        // Safety: a completed fiber is never resumed, so this never returns.
        unsafe { caller.resume(0) };
    }

    tracing::error!("completed fiber was resumed");
    std::process::abort()
}
