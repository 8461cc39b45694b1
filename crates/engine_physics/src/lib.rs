//! # engine_physics
//!
//! Item and projectile physics for the ECS engine: gravity integration,
//! collision resolution, item merging/pickup, and ballistic projectile
//! simulation. Every system here is a plain [`engine_system::System`] —
//! reads through the store, writes only through its `CommandBuffer`.
//!
//! This crate provides:
//!
//! - [`bounding_box`] — [`BoundingBox`], axis-aligned bounds for collision.
//! - [`physics_values`] — [`PhysicsValues`], per-entity gravity/drag/bounce.
//! - [`item`] — dropped-item components: [`ItemComponent`],
//!   [`PickupItemComponent`], and the merge/pickup marker components.
//! - [`projectile`] — [`PredictedProjectile`] and the
//!   [`projectile::StandardPhysicsProvider`] ballistic integrator.
//! - [`collision`] — [`collision::CollisionModule`] /
//!   [`collision::SpatialResource`] collaborator traits.
//! - [`systems`] — the concrete [`engine_system::System`] implementations
//!   tying the above together.

pub mod bounding_box;
pub mod collision;
pub mod fluid;
pub mod item;
pub mod physics_values;
pub mod projectile;
pub mod systems;

pub use bounding_box::BoundingBox;
pub use collision::{
    submerged_fraction, CollisionModule, EmptySpatialResource, FluidVolume, NoCollisionModule, NoFluidVolume,
    SpatialResource, SweepHit,
};
pub use fluid::{FluidSubmersionSystem, Swimming};
pub use item::{Interactable, ItemComponent, PickupItemComponent, PreventItemMerging, PreventPickup};
pub use physics_values::{clamp_velocity, PhysicsValues, MAX_LINEAR_SPEED};
pub use projectile::{BounceConsumer, ImpactConsumer, NullConsumer, PredictedProjectile, StandardPhysicsProvider};
pub use systems::{
    CollisionResolutionSystem, GravityIntegrationSystem, ItemMergeSystem, PickupInterpolationSystem,
    ProjectileIntegrationSystem, UnstickSystem,
};
