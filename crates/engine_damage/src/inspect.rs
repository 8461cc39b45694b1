//! `InspectDamage` group: read-only observers of this tick's applied damage,
//! plus the cleanup system that retires the `Damage` record afterward so it
//! never leaks into the next tick.

use std::sync::Arc;

use engine_component::{CommandBuffer, ComponentTypeId, Store};
use engine_net::{EntityViewer, Packet, PacketOutbox};
use engine_system::System;
use serde::{Deserialize, Serialize};

use crate::damage::Damage;
use crate::query::entities_with1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DamageIndicatorMessage {
    amount: f32,
    cause: engine_assets::DamageCause,
    cancelled: bool,
}

/// Enqueues a client-visible damage indicator packet for every entity that
/// received a `Damage` record this tick, whether or not it was cancelled —
/// clients still show a "blocked" indicator for cancelled hits.
pub struct DamageIndicatorSystem {
    pub outbox: Arc<dyn PacketOutbox>,
    pub viewer: Arc<dyn EntityViewer>,
    pub connections: Vec<engine_component::Ref>,
}

impl System for DamageIndicatorSystem {
    fn name(&self) -> &str {
        "DamageIndicator"
    }

    fn run(&self, store: &Store, _buffer: &mut CommandBuffer, _dt: f64) {
        for entity in entities_with1::<Damage>(store) {
            let damage = store.get_component::<Damage>(entity).unwrap();
            let Ok(packet) = Packet::encode(
                "damage_indicator",
                &DamageIndicatorMessage {
                    amount: damage.amount,
                    cause: damage.cause,
                    cancelled: damage.cancelled,
                },
            ) else {
                continue;
            };
            self.outbox
                .broadcast_to_viewers(entity, packet, self.viewer.as_ref(), &self.connections);
        }
    }
}

/// Removes the per-tick `Damage` record once every `InspectDamage` observer
/// has had a chance to read it. Declared with `depends_on` on the other
/// inspect-group systems by the caller that registers it, so it always runs
/// last within the group.
pub struct DamageCleanupSystem;

impl System for DamageCleanupSystem {
    fn name(&self) -> &str {
        "DamageCleanup"
    }

    fn run(&self, store: &Store, buffer: &mut CommandBuffer, _dt: f64) {
        for entity in entities_with1::<Damage>(store) {
            buffer.remove_component(entity, ComponentTypeId::of::<Damage>());
        }
    }
}

#[cfg(test)]
mod tests {
    use engine_assets::DamageCause;
    use engine_component::RawComponent;
    use engine_net::{OmniscientViewer, RecordingOutbox};

    use super::*;

    #[test]
    fn test_damage_indicator_broadcasts_for_every_damaged_entity() {
        let mut store = Store::new();
        let entity = store.spawn(vec![RawComponent::of(Damage::new(DamageCause::Melee, 5.0))]);
        let outbox = Arc::new(RecordingOutbox::new());
        let system = DamageIndicatorSystem {
            outbox: outbox.clone(),
            viewer: Arc::new(OmniscientViewer),
            connections: vec![engine_component::Ref::from_parts(1, 0)],
        };
        let mut buffer = CommandBuffer::new();
        system.run(&store, &mut buffer, 0.05);
        let _ = entity;
        assert_eq!(outbox.drain().len(), 1);
    }

    #[test]
    fn test_damage_cleanup_removes_record() {
        let mut store = Store::new();
        let entity = store.spawn(vec![RawComponent::of(Damage::new(DamageCause::Melee, 5.0))]);
        let system = DamageCleanupSystem;
        let mut buffer = CommandBuffer::new();
        system.run(&store, &mut buffer, 0.05);
        let mut buffers = [buffer];
        store.apply_commands(&mut buffers);
        assert!(store.get_component::<Damage>(entity).is_none());
    }
}
