//! Small internal helpers.
//!
//! - [`ScopeGuard`] runs a closure when a scope is left, including by
//!   unwinding.

mod scope_guard;

pub(crate) use scope_guard::ScopeGuard;
