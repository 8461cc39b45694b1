//! `ApplyDamage` group: the single system that subtracts surviving damage
//! from `Health` and attaches `DeathComponent` on lethal hits.

use engine_component::{Component, CommandBuffer, Ref, Store};
use engine_system::System;
use serde::{Deserialize, Serialize};

use crate::damage::{Damage, Health};
use crate::query::entities_with2;

/// How much of a player's inventory is dropped on death. Read by the
/// `DropPlayerDeathItems` ref-change handler.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum ItemLossRule {
    DropAll,
    DropNone,
    DropFraction(f32),
}

/// Attached to an entity the tick its `Health` reaches zero. Its *presence*
/// — not any particular field — is what the death ref-change chain reacts
/// to; its absence being removed later is what drives respawn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeathComponent {
    pub fatal_damage: Damage,
    pub item_loss: ItemLossRule,
}

impl Component for DeathComponent {
    fn type_name() -> &'static str {
        "DeathComponent"
    }
}

/// Subtracts the tick's surviving `Damage.amount` from `Health.current`,
/// attaching `DeathComponent` once health reaches zero. Does not remove the
/// `Damage` component — `InspectDamage`'s cleanup step does that, after
/// read-only observers of this tick's outcome have had a chance to run.
pub struct ApplyDamageSystem {
    pub item_loss: ItemLossRule,
}

impl System for ApplyDamageSystem {
    fn name(&self) -> &str {
        "ApplyDamage"
    }

    fn run(&self, store: &Store, buffer: &mut CommandBuffer, _dt: f64) {
        for entity in entities_with2::<Damage, Health>(store) {
            let damage = store.get_component::<Damage>(entity).unwrap().clone();
            if damage.cancelled {
                continue;
            }
            let health = *store.get_component::<Health>(entity).unwrap();
            let new_current = (health.current - damage.amount).max(0.0);
            buffer.set_component(entity, Health { current: new_current, ..health });
            if new_current <= 0.0 && health.current > 0.0 {
                buffer.add_component(
                    entity,
                    DeathComponent {
                        fatal_damage: damage,
                        item_loss: self.item_loss,
                    },
                );
            }
        }
    }
}

/// Inflict `damage` against `target`, deferred through `buffer`. The single
/// entry point other subsystems (interaction dispatch, scripted events) use
/// to cause damage outside the `GatherDamage` group — it records the same
/// `Damage` component a gather system would, so it is picked up by the rest
/// of the pipeline starting at `FilterDamage` on the next sync.
pub fn execute_damage(target: Ref, buffer: &mut CommandBuffer, damage: Damage) {
    buffer.add_component(target, damage);
}
