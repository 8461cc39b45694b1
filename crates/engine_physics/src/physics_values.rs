//! Per-entity physical tuning.

use engine_component::{Component, Ref};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Per-entity physical properties read by the gravity/collision/fluid
/// systems. Distinct from [`engine_assets::ItemDescriptor`], which tunes an
/// item *kind*, not a specific entity instance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PhysicsValues {
    pub mass: f32,
    /// Linear drag coefficient applied every tick (0 = no drag).
    pub drag: f32,
    /// Fraction of normal-direction speed retained on collision.
    pub restitution: f32,
    /// Multiplier applied to world gravity for this entity.
    pub gravity_scale: f32,
    /// `true` once the entity has come to rest and can be skipped by the
    /// integrator until disturbed.
    pub resting: bool,
}

impl PhysicsValues {
    #[must_use]
    pub fn new(mass: f32) -> Self {
        Self {
            mass,
            drag: 0.02,
            restitution: 0.3,
            gravity_scale: 1.0,
            resting: false,
        }
    }
}

impl Component for PhysicsValues {
    fn type_name() -> &'static str {
        "PhysicsValues"
    }
}

/// Ceiling on any integrated linear velocity, in metres/second. Shared by
/// the item-gravity and projectile integrators so a degenerate collision
/// normal or an extreme externally-set force can't propagate a runaway or
/// non-finite value through the rest of the tick.
pub const MAX_LINEAR_SPEED: f32 = 1000.0;

/// Clamp `v` to a finite vector no longer than `max_speed`. A non-finite
/// input (NaN or infinite component) is truncated to zero; a finite input
/// exceeding `max_speed` is rescaled down to it. Either case logs a
/// one-shot `tracing::warn!` tagged with `entity` and `context` so the
/// affected entity is identifiable without spamming every subsequent tick
/// (the caller only calls this once per entity per tick).
#[must_use]
pub fn clamp_velocity(v: Vec3, max_speed: f32, entity: Ref, context: &str) -> Vec3 {
    if !v.is_finite() {
        warn!(?entity, context, "non-finite velocity clamped to zero");
        return Vec3::ZERO;
    }
    let speed = v.length();
    if speed > max_speed {
        warn!(
            ?entity,
            context,
            speed = f64::from(speed),
            max_speed = f64::from(max_speed),
            "velocity exceeded ceiling, truncated"
        );
        v * (max_speed / speed)
    } else {
        v
    }
}
