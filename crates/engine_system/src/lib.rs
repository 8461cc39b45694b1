//! # engine_system
//!
//! The system scheduler for the in-process ECS tick loop.
//!
//! This crate provides:
//!
//! - [`System`] — the trait a unit of per-tick logic implements.
//! - [`SystemGroup`] — the fixed-order phases a tick runs through.
//! - [`Scheduler`] — conflict- and dependency-aware stage computation plus
//!   parallel dispatch over a `rayon` worker pool.
//! - [`RefChangeRegistry`] — event-driven reaction chains for component
//!   add/remove transitions (the death/respawn pipeline's chief consumer).
//!
//! Systems never touch the store mutably. They read through a shared
//! `&Store` and record intent into a [`engine_component::CommandBuffer`],
//! which the world drains during the tick's single-threaded sync phase.

pub mod group;
pub mod refchange;
pub mod scheduler;
pub mod system;

pub use group::SystemGroup;
pub use refchange::{RefChangeHandler, RefChangeRegistry};
pub use scheduler::{compute_stages, RegisteredSystem, Scheduler, SchedulerError, Stage};
pub use system::System;
