//! The [`System`] trait — one unit of per-tick logic.

use engine_component::{CommandBuffer, Store};

/// A single unit of per-tick game logic.
///
/// Systems never mutate the store directly. They read through `store` and
/// record intent into `buffer`, which the scheduler drains into the store
/// during the tick's single-threaded sync phase. This is what lets
/// disjoint-write systems in the same group run across worker threads
/// without any locking inside `run`.
pub trait System: Send + Sync {
    /// A stable, unique name used for dependency references and diagnostics.
    fn name(&self) -> &str;

    /// Run this system's logic for the current tick.
    fn run(&self, store: &Store, buffer: &mut CommandBuffer, dt: f64);
}
