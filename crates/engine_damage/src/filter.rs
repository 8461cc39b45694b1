//! `FilterDamage` group: systems that attenuate or cancel gathered damage.
//!
//! All of these write the same `Damage` component the `GatherDamage` group
//! produced, so the scheduler serializes them into their own stages in
//! registration order — which is also the order armor, invulnerability, and
//! the unkillable filter should logically apply in.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use engine_component::{Component, CommandBuffer, Store};
use engine_system::System;
use serde::{Deserialize, Serialize};

use crate::damage::Damage;
use crate::query::entities_with2;

/// Flat damage reduction worn by an entity. A plain per-entity stat, not an
/// item-kind lookup — the inventory/equipment layer that computes this value
/// from worn gear is out of scope here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Armor {
    pub flat_reduction: f32,
}

impl Component for Armor {
    fn type_name() -> &'static str {
        "Armor"
    }
}

/// Reduces `Damage.amount` by the target's `Armor.flat_reduction`, floored
/// at zero (armor cannot turn damage into healing).
pub struct ArmorReductionSystem;

impl System for ArmorReductionSystem {
    fn name(&self) -> &str {
        "ArmorReduction"
    }

    fn run(&self, store: &Store, buffer: &mut CommandBuffer, _dt: f64) {
        for entity in entities_with2::<Damage, Armor>(store) {
            let damage = store.get_component::<Damage>(entity).unwrap().clone();
            if damage.cancelled {
                continue;
            }
            let armor = store.get_component::<Armor>(entity).unwrap();
            let reduced = (damage.amount - armor.flat_reduction).max(0.0);
            buffer.set_component(entity, Damage { amount: reduced, ..damage });
        }
    }
}

/// A temporary damage immunity window (respawn grace period, block/parry).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Invulnerable {
    pub remaining_seconds: f32,
}

impl Component for Invulnerable {
    fn type_name() -> &'static str {
        "Invulnerable"
    }
}

/// Cancels damage against any entity with a live [`Invulnerable`] window.
pub struct InvulnerabilityFilterSystem;

impl System for InvulnerabilityFilterSystem {
    fn name(&self) -> &str {
        "InvulnerabilityFilter"
    }

    fn run(&self, store: &Store, buffer: &mut CommandBuffer, _dt: f64) {
        for entity in entities_with2::<Damage, Invulnerable>(store) {
            let window = store.get_component::<Invulnerable>(entity).unwrap();
            if window.remaining_seconds <= 0.0 {
                continue;
            }
            let damage = store.get_component::<Damage>(entity).unwrap().clone();
            if !damage.cancelled {
                buffer.set_component(entity, Damage { cancelled: true, ..damage });
            }
        }
    }
}

/// Marks an entity immune to death (bosses mid-cutscene, tutorial dummies).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Unkillable;

impl Component for Unkillable {
    fn type_name() -> &'static str {
        "Unkillable"
    }
}

/// Process-wide debug toggle that bypasses [`FilterUnkillableSystem`]. Per
/// design note, its intended client-visible effect is undocumented in the
/// source material; this crate preserves it purely as the documented
/// pass-through switch. Flipped only by an operator command between ticks
/// (see `engine_system`'s concurrency model for global debug flags), read
/// by the filter system during the tick.
#[derive(Debug, Clone, Default)]
pub struct DesyncFlag(Arc<AtomicBool>);

impl DesyncFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, desync: bool) {
        self.0.store(desync, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Cancels damage against [`Unkillable`] entities, unless [`DesyncFlag`] is
/// set — in which case the step is bypassed and the damage passes through
/// uncancelled.
pub struct FilterUnkillableSystem {
    pub desync: DesyncFlag,
}

impl System for FilterUnkillableSystem {
    fn name(&self) -> &str {
        "FilterUnkillable"
    }

    fn run(&self, store: &Store, buffer: &mut CommandBuffer, _dt: f64) {
        if self.desync.is_set() {
            return;
        }
        for entity in entities_with2::<Damage, Unkillable>(store) {
            let damage = store.get_component::<Damage>(entity).unwrap().clone();
            if !damage.cancelled {
                buffer.set_component(entity, Damage { cancelled: true, ..damage });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use engine_assets::DamageCause;
    use engine_component::RawComponent;

    use super::*;

    #[test]
    fn test_armor_reduces_damage_floored_at_zero() {
        let mut store = Store::new();
        let entity = store.spawn(vec![
            RawComponent::of(Damage::new(DamageCause::Melee, 5.0)),
            RawComponent::of(Armor { flat_reduction: 8.0 }),
        ]);
        let system = ArmorReductionSystem;
        let mut buffer = CommandBuffer::new();
        system.run(&store, &mut buffer, 0.05);
        let mut buffers = [buffer];
        store.apply_commands(&mut buffers);
        assert_eq!(store.get_component::<Damage>(entity).unwrap().amount, 0.0);
    }

    #[test]
    fn test_invulnerability_cancels_damage() {
        let mut store = Store::new();
        let entity = store.spawn(vec![
            RawComponent::of(Damage::new(DamageCause::Melee, 5.0)),
            RawComponent::of(Invulnerable { remaining_seconds: 1.0 }),
        ]);
        let system = InvulnerabilityFilterSystem;
        let mut buffer = CommandBuffer::new();
        system.run(&store, &mut buffer, 0.05);
        let mut buffers = [buffer];
        store.apply_commands(&mut buffers);
        assert!(store.get_component::<Damage>(entity).unwrap().cancelled);
    }

    #[test]
    fn test_unkillable_cancels_damage_normally() {
        let mut store = Store::new();
        let entity = store.spawn(vec![
            RawComponent::of(Damage::new(DamageCause::Melee, 5.0)),
            RawComponent::of(Unkillable),
        ]);
        let system = FilterUnkillableSystem { desync: DesyncFlag::new() };
        let mut buffer = CommandBuffer::new();
        system.run(&store, &mut buffer, 0.05);
        let mut buffers = [buffer];
        store.apply_commands(&mut buffers);
        assert!(store.get_component::<Damage>(entity).unwrap().cancelled);
    }

    #[test]
    fn test_desync_flag_bypasses_unkillable_filter() {
        let mut store = Store::new();
        let entity = store.spawn(vec![
            RawComponent::of(Damage::new(DamageCause::Melee, 5.0)),
            RawComponent::of(Unkillable),
        ]);
        let desync = DesyncFlag::new();
        desync.set(true);
        let system = FilterUnkillableSystem { desync };
        let mut buffer = CommandBuffer::new();
        system.run(&store, &mut buffer, 0.05);
        assert!(buffer.is_empty());
    }
}
