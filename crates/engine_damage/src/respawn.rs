//! The respawn chain: `RefChange` handlers reacting to `DeathComponent`
//! being removed, run as a parallel class (each only touches the single
//! respawning entity, so registration order does not matter the way the
//! death chain's does) followed by the `RespawnController` invocation.

use std::sync::Arc;

use engine_component::{CommandBuffer, Component, ComponentTypeId, RefChangeEvent, Ref, Store};
use engine_system::RefChangeHandler;
use serde::{Deserialize, Serialize};

use crate::collaborators::{BrokenItemChecker, ConnectionDirectory, InteractionCanceller, RespawnController};
use crate::damage::Health;

/// Per-player bookkeeping reset on respawn. Kept minimal — a richer
/// player-profile component lives outside this crate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PlayerMetadata {
    pub death_count: u32,
}

impl Component for PlayerMetadata {
    fn type_name() -> &'static str {
        "PlayerMetadata"
    }
}

/// Resets `Health.current` to `Health.max`.
pub struct ResetHealthHandler;

impl RefChangeHandler for ResetHealthHandler {
    fn name(&self) -> &str {
        "ResetHealth"
    }

    fn run(&self, store: &Store, event: &RefChangeEvent, buffer: &mut CommandBuffer) {
        if let Some(health) = store.get_component::<Health>(event.entity) {
            buffer.set_component(event.entity, Health { current: health.max, ..*health });
        }
    }
}

/// Removes every listed status-effect component type, same as the death
/// chain's equivalent step — carried over so effects acquired between death
/// and respawn (grace-period buffs, say) don't leak into the new life.
pub struct ClearEffectsOnRespawnHandler {
    pub effect_types: Vec<ComponentTypeId>,
}

impl RefChangeHandler for ClearEffectsOnRespawnHandler {
    fn name(&self) -> &str {
        "ClearEffectsOnRespawn"
    }

    fn run(&self, _store: &Store, event: &RefChangeEvent, buffer: &mut CommandBuffer) {
        for &type_id in &self.effect_types {
            buffer.remove_component(event.entity, type_id);
        }
    }
}

/// Cancels any interaction left in progress (should be none after the death
/// chain's own `ClearInteractions`, but respawn can also be invoked
/// directly by an operator/admin command without a prior death).
pub struct ClearInteractionsOnRespawnHandler {
    pub canceller: Arc<dyn InteractionCanceller>,
}

impl RefChangeHandler for ClearInteractionsOnRespawnHandler {
    fn name(&self) -> &str {
        "ClearInteractionsOnRespawn"
    }

    fn run(&self, _store: &Store, event: &RefChangeEvent, buffer: &mut CommandBuffer) {
        self.canceller.cancel_interactions(event.entity, buffer);
    }
}

/// Removes items the death pipeline marked broken (durability hit zero) so
/// they do not reappear in the respawned player's inventory.
pub struct CheckBrokenItemsHandler {
    pub checker: Arc<dyn BrokenItemChecker>,
}

impl RefChangeHandler for CheckBrokenItemsHandler {
    fn name(&self) -> &str {
        "CheckBrokenItems"
    }

    fn run(&self, store: &Store, event: &RefChangeEvent, buffer: &mut CommandBuffer) {
        self.checker.clear_broken_items(event.entity, store, buffer);
    }
}

/// Increments the respawning player's death counter.
pub struct ResetPlayerMetadataHandler;

impl RefChangeHandler for ResetPlayerMetadataHandler {
    fn name(&self) -> &str {
        "ResetPlayerMetadata"
    }

    fn run(&self, store: &Store, event: &RefChangeEvent, buffer: &mut CommandBuffer) {
        let current = store
            .get_component::<PlayerMetadata>(event.entity)
            .copied()
            .unwrap_or_default();
        buffer.add_component(
            event.entity,
            PlayerMetadata {
                death_count: current.death_count + 1,
            },
        );
    }
}

/// Notifies connected viewers that the entity is alive again (the inverse
/// of the death chain's kill-feed broadcast — kept low-key as a presence
/// update rather than a feed message).
pub struct RespawnPresenceHandler {
    pub outbox: Arc<dyn engine_net::PacketOutbox>,
    pub viewer: Arc<dyn engine_net::EntityViewer>,
    pub connections: Arc<dyn ConnectionDirectory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RespawnedMessage {
    entity: Ref,
}

impl RefChangeHandler for RespawnPresenceHandler {
    fn name(&self) -> &str {
        "RespawnPresence"
    }

    fn run(&self, _store: &Store, event: &RefChangeEvent, _buffer: &mut CommandBuffer) {
        let Ok(packet) = engine_net::Packet::encode("respawned", &RespawnedMessage { entity: event.entity }) else {
            return;
        };
        let connections = self.connections.all_connections();
        self.outbox
            .broadcast_to_viewers(event.entity, packet, self.viewer.as_ref(), &connections);
    }
}

/// The final step: hands off to the world-scoped [`RespawnController`] to
/// pick a spawn location and re-enable the player entity.
pub struct RespawnControllerHandler {
    pub controller: Arc<dyn RespawnController>,
}

impl RefChangeHandler for RespawnControllerHandler {
    fn name(&self) -> &str {
        "RespawnController"
    }

    fn run(&self, store: &Store, event: &RefChangeEvent, buffer: &mut CommandBuffer) {
        self.controller.respawn(event.entity, store, buffer);
    }
}

#[cfg(test)]
mod tests {
    use engine_component::RawComponent;

    use super::*;
    use crate::apply::DeathComponent;

    fn removed_event(entity: Ref) -> RefChangeEvent {
        RefChangeEvent {
            entity,
            type_id: Some(ComponentTypeId::of::<DeathComponent>()),
            kind: engine_component::RefChangeKind::ComponentRemoved,
        }
    }

    #[test]
    fn test_reset_health_restores_max() {
        let mut store = Store::new();
        let entity = store.spawn(vec![RawComponent::of(Health { current: 0.0, max: 20.0 })]);
        let handler = ResetHealthHandler;
        let mut buffer = CommandBuffer::new();
        handler.run(&store, &removed_event(entity), &mut buffer);
        let mut buffers = [buffer];
        store.apply_commands(&mut buffers);
        assert_eq!(store.get_component::<Health>(entity).unwrap().current, 20.0);
    }

    #[test]
    fn test_player_metadata_increments_death_count() {
        let mut store = Store::new();
        let entity = store.spawn(vec![RawComponent::of(PlayerMetadata { death_count: 2 })]);
        let handler = ResetPlayerMetadataHandler;
        let mut buffer = CommandBuffer::new();
        handler.run(&store, &removed_event(entity), &mut buffer);
        let mut buffers = [buffer];
        store.apply_commands(&mut buffers);
        assert_eq!(store.get_component::<PlayerMetadata>(entity).unwrap().death_count, 3);
    }

    #[test]
    fn test_player_metadata_defaults_when_absent() {
        let mut store = Store::new();
        let entity = store.spawn(vec![]);
        let handler = ResetPlayerMetadataHandler;
        let mut buffer = CommandBuffer::new();
        handler.run(&store, &removed_event(entity), &mut buffer);
        let mut buffers = [buffer];
        store.apply_commands(&mut buffers);
        assert_eq!(store.get_component::<PlayerMetadata>(entity).unwrap().death_count, 1);
    }
}
