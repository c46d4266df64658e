//! Work-stealing scheduler components.
//!
//! - [`injector`]: the global queue for jobs posted from outside the pool,
//!   which also parks and wakes idle workers,
//! - [`queue`]: per-worker local queues used for fast local execution and
//!   stealing.

pub(crate) mod injector;
pub(crate) mod queue;
