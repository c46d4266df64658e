/// Runs a closure when it goes out of scope.
///
/// Used to pair an "enter" step with its "leave" step, so the leave also
/// happens when the scope is left by unwinding.
pub(crate) struct ScopeGuard<F: FnOnce()> {
    // `Option` so the closure can be taken out exactly once.
    closure: Option<F>,
}

impl<F: FnOnce()> ScopeGuard<F> {
    /// Creates an armed guard.
    pub(crate) fn new(closure: F) -> Self {
        ScopeGuard {
            closure: Some(closure),
        }
    }
}

impl<F: FnOnce()> Drop for ScopeGuard<F> {
    fn drop(&mut self) {
        if let Some(closure) = self.closure.take() {
            closure();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn runs_on_scope_exit() {
        let ran = Cell::new(false);
        {
            let _guard = ScopeGuard::new(|| ran.set(true));
            assert!(!ran.get());
        }
        assert!(ran.get());
    }

    #[test]
    fn runs_while_unwinding() {
        let ran = Cell::new(false);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = ScopeGuard::new(|| ran.set(true));
            panic!("unwind");
        }));

        assert!(result.is_err());
        assert!(ran.get());
    }
}
