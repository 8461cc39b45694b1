//! Config record shapes looked up through [`crate::registry::AssetRegistry`].
//!
//! These are plain data, not components — they describe an item/projectile
//! *kind*, shared by every instance, rather than per-entity state.

use serde::{Deserialize, Serialize};

/// How a projectile's rotation tracks its velocity in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationMode {
    /// The model's forward axis is kept aligned with the current velocity
    /// vector — arrows, thrown axes.
    AlignToVelocity,
    /// The launch-time rotation is kept fixed regardless of velocity —
    /// grenades, rocks.
    Preserve,
}

/// Per-kind tuning for a ballistic projectile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileConfig {
    /// Initial speed along the launch direction, in units/second.
    pub launch_speed: f32,
    /// Multiplier applied to world gravity for this projectile (0 = no drop).
    pub gravity_scale: f32,
    /// Fraction of speed retained after a bounce (0 = stops dead, 1 = perfectly elastic).
    pub bounce_restitution: f32,
    /// Maximum number of bounces before the projectile is treated as settled.
    pub max_bounces: u32,
    pub rotation_mode: RotationMode,
    /// Muzzle height offset above the shooter's eye position, in world units.
    pub vertical_center_shot: f32,
    /// Muzzle forward offset along the shooter's aim direction, in world units.
    pub depth_shot: f32,
}

/// Per-kind tuning for a physical item entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemDescriptor {
    /// Largest quantity a single stack of this item may hold.
    pub max_stack_size: u32,
    /// Distance within which two stacks of the same item auto-merge.
    pub merge_radius: f32,
    /// Seconds an item must rest before it becomes eligible for pickup, to
    /// avoid instantly re-vacuuming an item the moment it's dropped.
    pub pickup_delay_seconds: f32,
}

/// The source of a single damage record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DamageCause {
    Melee,
    Projectile,
    Fall,
    Drowning,
    Environmental,
    Suicide,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projectile_config_roundtrip() {
        let cfg = ProjectileConfig {
            launch_speed: 60.0,
            gravity_scale: 1.0,
            bounce_restitution: 0.4,
            max_bounces: 2,
            rotation_mode: RotationMode::AlignToVelocity,
            vertical_center_shot: 1.5,
            depth_shot: 0.3,
        };
        let bytes = rmp_serde::to_vec(&cfg).unwrap();
        let restored: ProjectileConfig = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_damage_cause_roundtrip() {
        let cause = DamageCause::Fall;
        let bytes = rmp_serde::to_vec(&cause).unwrap();
        let restored: DamageCause = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(cause, restored);
    }
}
