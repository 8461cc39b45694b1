//! # engine_component
//!
//! The "C" in ECS — defines what a component is, how it is stored, and how it
//! is serialised for network transport.
//!
//! This crate provides:
//!
//! - [`Component`] trait — the contract all ECS data must satisfy.
//! - [`Ref`] — a generation-checked, stable entity handle.
//! - [`ArchetypeTable`] / [`ArchetypeChunk`] — chunked SoA storage grouped by
//!   component combination.
//! - [`QueryDescriptor`] — declarative data access requirements for systems.
//! - [`CommandBuffer`] — deferred mutation recording, applied by [`Store`]
//!   during the sync phase.
//! - [`Store`] — the authoritative entity/component owner.

pub mod archetype;
pub mod command_buffer;
pub mod component;
pub mod entity;
pub mod query;
pub mod store;

pub use archetype::{ArchetypeChunk, ArchetypeId, ArchetypeTable, Column, RowLocation, CHUNK_CAPACITY};
pub use command_buffer::{Command, CommandBuffer, RawComponent};
pub use component::{Component, ComponentMeta, ComponentRecord, ComponentTypeId};
pub use entity::Ref;
pub use query::{QueryDescriptor, QueryFilter};
pub use store::{RefChangeEvent, RefChangeKind, Store};
