//! `GatherDamage` group: systems that turn world state into `Damage` records.
//!
//! Each system here targets a distinct damage source (fall, out-of-world,
//! damage-over-time) and is independent of the others; the scheduler is free
//! to run them in parallel since they all declare the same `Damage` write
//! and therefore get serialized into their own stage, converging on
//! whichever one runs last for a given entity per the store's documented
//! last-writer-wins rule for duplicate component adds.

use engine_assets::DamageCause;
use engine_component::{CommandBuffer, Component, ComponentTypeId, Store};
use engine_math::{Transform3D, Velocity};
use engine_physics::Swimming;
use engine_system::System;
use serde::{Deserialize, Serialize};

use crate::damage::Damage;
use crate::query::{entities_with1, entities_with2};

/// Tracks an entity's peak downward speed while airborne, so landing can be
/// detected as the tick where vertical speed returns to ~0 after having been
/// significantly negative.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct FallState {
    pub max_fall_speed: f32,
}

impl Component for FallState {
    fn type_name() -> &'static str {
        "FallState"
    }
}

/// Computes fall damage on landing from the peak fall speed tracked in
/// [`FallState`]. Entities without `FallState` never take fall damage (they
/// opt in by being spawned with one, e.g. players and falling mobs).
pub struct FallDamageSystem {
    /// Downward speed, in units/second, below which a landing is free.
    pub safe_speed: f32,
    /// Damage inflicted per unit of speed beyond `safe_speed`.
    pub damage_per_unit_speed: f32,
}

impl System for FallDamageSystem {
    fn name(&self) -> &str {
        "FallDamage"
    }

    fn run(&self, store: &Store, buffer: &mut CommandBuffer, _dt: f64) {
        const LANDED_EPSILON: f32 = 0.05;
        for entity in entities_with2::<Velocity, FallState>(store) {
            let velocity = *store.get_component::<Velocity>(entity).unwrap();
            let state = *store.get_component::<FallState>(entity).unwrap();
            let falling_speed = (-velocity.linear.y).max(0.0);

            if falling_speed < LANDED_EPSILON && state.max_fall_speed > 0.0 {
                let excess = state.max_fall_speed - self.safe_speed;
                if excess > 0.0 {
                    buffer.add_component(entity, Damage::new(DamageCause::Fall, excess * self.damage_per_unit_speed));
                }
                buffer.set_component(entity, FallState::default());
            } else if falling_speed > state.max_fall_speed {
                buffer.set_component(entity, FallState { max_fall_speed: falling_speed });
            }
        }
    }
}

/// Inflicts continuous damage on any entity whose `Transform3D.position.y`
/// has dropped below the world floor (fell through geometry, left the
/// playable volume).
pub struct OutOfWorldDamageSystem {
    pub floor_y: f32,
    pub damage_per_tick: f32,
}

impl System for OutOfWorldDamageSystem {
    fn name(&self) -> &str {
        "OutOfWorldDamage"
    }

    fn run(&self, store: &Store, buffer: &mut CommandBuffer, _dt: f64) {
        for entity in entities_with1::<Transform3D>(store) {
            let transform = store.get_component::<Transform3D>(entity).unwrap();
            if transform.position.y < self.floor_y {
                buffer.add_component(entity, Damage::new(DamageCause::Environmental, self.damage_per_tick));
            }
        }
    }
}

/// A damage-over-time effect (burning, poison, ...) ticking down each frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DotEffect {
    pub cause: DamageCause,
    pub damage_per_second: f32,
    pub remaining_seconds: f32,
}

impl Component for DotEffect {
    fn type_name() -> &'static str {
        "DotEffect"
    }
}

/// Applies and decays [`DotEffect`]s, removing the effect once it expires.
pub struct DotDamageSystem;

impl System for DotDamageSystem {
    fn name(&self) -> &str {
        "DotDamage"
    }

    fn run(&self, store: &Store, buffer: &mut CommandBuffer, dt: f64) {
        let dt = dt as f32;
        for entity in entities_with1::<DotEffect>(store) {
            let effect = *store.get_component::<DotEffect>(entity).unwrap();
            buffer.add_component(entity, Damage::new(effect.cause, effect.damage_per_second * dt));
            let remaining = effect.remaining_seconds - dt;
            if remaining <= 0.0 {
                buffer.remove_component(entity, ComponentTypeId::of::<DotEffect>());
            } else {
                buffer.set_component(entity, DotEffect { remaining_seconds: remaining, ..effect });
            }
        }
    }
}

/// An entity's remaining breath while submerged. Present only on entities
/// that need drowning tracked (players, air-breathing mobs); regenerates
/// while not [`Swimming`] and depletes while it is, inflicting
/// [`DamageCause::Drowning`] once it bottoms out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Breath {
    pub current: f32,
    pub max: f32,
}

impl Component for Breath {
    fn type_name() -> &'static str {
        "Breath"
    }
}

/// Depletes [`Breath`] while an entity is [`Swimming`] (set by
/// `engine_physics::FluidSubmersionSystem` in `PrePhysics`), inflicting
/// drowning damage once it runs out, and regenerates it otherwise.
pub struct DrowningDamageSystem {
    pub depletion_per_second: f32,
    pub regeneration_per_second: f32,
    pub damage_per_second: f32,
}

impl System for DrowningDamageSystem {
    fn name(&self) -> &str {
        "DrowningDamage"
    }

    fn run(&self, store: &Store, buffer: &mut CommandBuffer, dt: f64) {
        let dt = dt as f32;
        for entity in entities_with1::<Breath>(store) {
            let breath = *store.get_component::<Breath>(entity).unwrap();
            if store.get_component::<Swimming>(entity).is_some() {
                let next = breath.current - self.depletion_per_second * dt;
                if next <= 0.0 {
                    buffer.add_component(entity, Damage::new(DamageCause::Drowning, self.damage_per_second * dt));
                    buffer.set_component(entity, Breath { current: 0.0, ..breath });
                } else {
                    buffer.set_component(entity, Breath { current: next, ..breath });
                }
            } else if breath.current < breath.max {
                let next = (breath.current + self.regeneration_per_second * dt).min(breath.max);
                buffer.set_component(entity, Breath { current: next, ..breath });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use engine_component::RawComponent;
    use glam::Vec3;

    use super::*;

    #[test]
    fn test_fall_damage_triggers_on_landing_past_safe_speed() {
        let mut store = Store::new();
        let entity = store.spawn(vec![
            RawComponent::of(Velocity::ZERO),
            RawComponent::of(FallState { max_fall_speed: 20.0 }),
        ]);
        let system = FallDamageSystem {
            safe_speed: 5.0,
            damage_per_unit_speed: 1.0,
        };
        let mut buffer = CommandBuffer::new();
        system.run(&store, &mut buffer, 0.05);
        let mut buffers = [buffer];
        store.apply_commands(&mut buffers);
        let damage = store.get_component::<Damage>(entity).unwrap();
        assert!((damage.amount - 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_fall_damage_skipped_under_safe_speed() {
        let mut store = Store::new();
        let entity = store.spawn(vec![
            RawComponent::of(Velocity::ZERO),
            RawComponent::of(FallState { max_fall_speed: 2.0 }),
        ]);
        let system = FallDamageSystem {
            safe_speed: 5.0,
            damage_per_unit_speed: 1.0,
        };
        let mut buffer = CommandBuffer::new();
        system.run(&store, &mut buffer, 0.05);
        let mut buffers = [buffer];
        store.apply_commands(&mut buffers);
        assert!(store.get_component::<Damage>(entity).is_none());
    }

    #[test]
    fn test_out_of_world_damage_below_floor() {
        let mut store = Store::new();
        let entity = store.spawn(vec![
            RawComponent::of(Transform3D::from_position(Vec3::new(0.0, -100.0, 0.0))),
            RawComponent::of(Velocity::ZERO),
        ]);
        let system = OutOfWorldDamageSystem {
            floor_y: -64.0,
            damage_per_tick: 4.0,
        };
        let mut buffer = CommandBuffer::new();
        system.run(&store, &mut buffer, 0.05);
        let mut buffers = [buffer];
        store.apply_commands(&mut buffers);
        assert_eq!(store.get_component::<Damage>(entity).unwrap().amount, 4.0);
    }

    #[test]
    fn test_dot_effect_expires_after_duration() {
        let mut store = Store::new();
        let entity = store.spawn(vec![RawComponent::of(DotEffect {
            cause: DamageCause::Environmental,
            damage_per_second: 2.0,
            remaining_seconds: 0.05,
        })]);
        let system = DotDamageSystem;
        let mut buffer = CommandBuffer::new();
        system.run(&store, &mut buffer, 0.1);
        let mut buffers = [buffer];
        store.apply_commands(&mut buffers);
        assert!(store.get_component::<DotEffect>(entity).is_none());
        assert!(store.get_component::<Damage>(entity).is_some());
    }

    #[test]
    fn test_drowning_damage_triggers_when_breath_runs_out() {
        let mut store = Store::new();
        let entity = store.spawn(vec![
            RawComponent::of(Breath { current: 0.5, max: 10.0 }),
            RawComponent::of(Swimming { submerged_fraction: 1.0 }),
        ]);
        let system = DrowningDamageSystem {
            depletion_per_second: 1.0,
            regeneration_per_second: 2.0,
            damage_per_second: 5.0,
        };
        let mut buffer = CommandBuffer::new();
        system.run(&store, &mut buffer, 1.0);
        let mut buffers = [buffer];
        store.apply_commands(&mut buffers);
        assert_eq!(store.get_component::<Breath>(entity).unwrap().current, 0.0);
        assert_eq!(store.get_component::<Damage>(entity).unwrap().amount, 5.0);
    }

    #[test]
    fn test_breath_regenerates_when_not_swimming() {
        let mut store = Store::new();
        let entity = store.spawn(vec![RawComponent::of(Breath { current: 5.0, max: 10.0 })]);
        let system = DrowningDamageSystem {
            depletion_per_second: 1.0,
            regeneration_per_second: 2.0,
            damage_per_second: 5.0,
        };
        let mut buffer = CommandBuffer::new();
        system.run(&store, &mut buffer, 1.0);
        let mut buffers = [buffer];
        store.apply_commands(&mut buffers);
        assert_eq!(store.get_component::<Breath>(entity).unwrap().current, 7.0);
        assert!(store.get_component::<Damage>(entity).is_none());
    }

    #[test]
    fn test_breath_depletes_without_damage_while_above_zero() {
        let mut store = Store::new();
        let entity = store.spawn(vec![
            RawComponent::of(Breath { current: 5.0, max: 10.0 }),
            RawComponent::of(Swimming { submerged_fraction: 1.0 }),
        ]);
        let system = DrowningDamageSystem {
            depletion_per_second: 1.0,
            regeneration_per_second: 2.0,
            damage_per_second: 5.0,
        };
        let mut buffer = CommandBuffer::new();
        system.run(&store, &mut buffer, 1.0);
        let mut buffers = [buffer];
        store.apply_commands(&mut buffers);
        assert_eq!(store.get_component::<Breath>(entity).unwrap().current, 4.0);
        assert!(store.get_component::<Damage>(entity).is_none());
    }
}
