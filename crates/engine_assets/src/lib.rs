//! # engine_assets
//!
//! The in-memory config/asset lookup collaborator. Systems that need
//! per-kind tuning (a projectile's launch speed, an item's stack size) read
//! it from an [`AssetRegistry`] by string id rather than hard-coding it;
//! whatever owns asset loading (out of scope here) populates the registry.

pub mod config;
pub mod registry;

pub use config::{DamageCause, ItemDescriptor, ProjectileConfig, RotationMode};
pub use registry::AssetRegistry;
