//! The death chain: ten `RefChange` handlers reacting to `DeathComponent`
//! being added, registered onto a [`RefChangeRegistry`] in declared order,
//! plus the non-`RefChange` system that ticks corpse removal afterward.

use std::sync::Arc;

use engine_assets::DamageCause;
use engine_component::{CommandBuffer, Component, ComponentTypeId, RefChangeEvent, Store};
use engine_math::Transform3D;
use engine_net::{EntityViewer, Packet, PacketOutbox};
use engine_system::{RefChangeHandler, System};
use serde::{Deserialize, Serialize};

use crate::apply::DeathComponent;
use crate::collaborators::{ConnectionDirectory, DeathDropConfig, DeathInteractionRunner, InteractionCanceller};
use crate::damage::Health;
use crate::query::entities_with1;

/// A coarse animation state driven by gameplay events (death, respawn,
/// hit-react). The interpolation/blend-tree that consumes this client-side
/// is out of scope here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnimationState {
    pub state: String,
}

impl Component for AnimationState {
    fn type_name() -> &'static str {
        "AnimationState"
    }
}

/// Ticking countdown to corpse destruction, set by step 10 of the death
/// chain and consumed by [`DeferredCorpseRemovalSystem`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DeferredCorpseRemoval {
    pub remaining_seconds: f32,
}

impl Component for DeferredCorpseRemoval {
    fn type_name() -> &'static str {
        "DeferredCorpseRemoval"
    }
}

/// 1. Removes every listed status-effect component type from the dying
/// entity. The concrete set of effect types is supplied by the caller
/// wiring the chain together, since this crate does not itself define every
/// effect kind in the game (only `DotEffect`).
pub struct ClearEntityEffectsHandler {
    pub effect_types: Vec<ComponentTypeId>,
}

impl RefChangeHandler for ClearEntityEffectsHandler {
    fn name(&self) -> &str {
        "ClearEntityEffects"
    }

    fn run(&self, _store: &Store, event: &RefChangeEvent, buffer: &mut CommandBuffer) {
        for &type_id in &self.effect_types {
            buffer.remove_component(event.entity, type_id);
        }
    }
}

/// 2. Cancels any interaction in progress on the dying entity.
pub struct ClearInteractionsHandler {
    pub canceller: Arc<dyn InteractionCanceller>,
}

impl RefChangeHandler for ClearInteractionsHandler {
    fn name(&self) -> &str {
        "ClearInteractions"
    }

    fn run(&self, _store: &Store, event: &RefChangeEvent, buffer: &mut CommandBuffer) {
        self.canceller.cancel_interactions(event.entity, buffer);
    }
}

/// 3. Floors `Health.current` to zero (it may already be there from
/// `ApplyDamage`, but death can also be triggered directly).
pub struct ClearHealthHandler;

impl RefChangeHandler for ClearHealthHandler {
    fn name(&self) -> &str {
        "ClearHealth"
    }

    fn run(&self, store: &Store, event: &RefChangeEvent, buffer: &mut CommandBuffer) {
        if let Some(health) = store.get_component::<Health>(event.entity) {
            buffer.set_component(event.entity, Health { current: 0.0, ..*health });
        }
    }
}

/// 4. Sets an animation state derived from the fatal damage's cause.
pub struct DeathAnimationSystem;

impl RefChangeHandler for DeathAnimationSystem {
    fn name(&self) -> &str {
        "DeathAnimation"
    }

    fn run(&self, store: &Store, event: &RefChangeEvent, buffer: &mut CommandBuffer) {
        let Some(death) = store.get_component::<DeathComponent>(event.entity) else {
            return;
        };
        let state = match death.fatal_damage.cause {
            DamageCause::Fall => "death_fall",
            DamageCause::Projectile => "death_ranged",
            DamageCause::Melee => "death_melee",
            DamageCause::Drowning => "death_drowning",
            DamageCause::Environmental => "death_environmental",
            DamageCause::Suicide => "death_suicide",
        };
        buffer.add_component(event.entity, AnimationState { state: state.to_string() });
    }
}

/// 5. Runs whatever death interactions are configured for this entity.
pub struct RunDeathInteractionsHandler {
    pub runner: Arc<dyn DeathInteractionRunner>,
}

impl RefChangeHandler for RunDeathInteractionsHandler {
    fn name(&self) -> &str {
        "RunDeathInteractions"
    }

    fn run(&self, store: &Store, event: &RefChangeEvent, buffer: &mut CommandBuffer) {
        let Some(death) = store.get_component::<DeathComponent>(event.entity) else {
            return;
        };
        self.runner
            .run_death_interactions(event.entity, death.fatal_damage.cause, store, buffer);
    }
}

/// 6. Computes drops via the configured [`DeathDropConfig`] and spawns one
/// item entity per stack at the death position.
pub struct DropPlayerDeathItemsHandler {
    pub config: Arc<dyn DeathDropConfig>,
}

impl RefChangeHandler for DropPlayerDeathItemsHandler {
    fn name(&self) -> &str {
        "DropPlayerDeathItems"
    }

    fn run(&self, store: &Store, event: &RefChangeEvent, buffer: &mut CommandBuffer) {
        let position = store
            .get_component::<Transform3D>(event.entity)
            .map_or(Transform3D::IDENTITY, Clone::clone);
        for drop in self.config.compute_drops(event.entity, store) {
            let pending = buffer.create_entity();
            buffer.add_component(pending, position.clone());
            buffer.add_component(pending, engine_physics::ItemComponent::new(drop.item_id, drop.quantity));
        }
    }
}

/// 7. Enqueues a kill-feed packet visible to every connection.
pub struct KillFeedHandler {
    pub outbox: Arc<dyn PacketOutbox>,
    pub viewer: Arc<dyn EntityViewer>,
    pub connections: Arc<dyn ConnectionDirectory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct KillFeedMessage {
    victim: engine_component::Ref,
    source: Option<engine_component::Ref>,
    cause: DamageCause,
}

impl RefChangeHandler for KillFeedHandler {
    fn name(&self) -> &str {
        "KillFeed"
    }

    fn run(&self, store: &Store, event: &RefChangeEvent, _buffer: &mut CommandBuffer) {
        let Some(death) = store.get_component::<DeathComponent>(event.entity) else {
            return;
        };
        let Ok(packet) = Packet::encode(
            "kill_feed",
            &KillFeedMessage {
                victim: event.entity,
                source: death.fatal_damage.source,
                cause: death.fatal_damage.cause,
            },
        ) else {
            return;
        };
        let connections = self.connections.all_connections();
        self.outbox
            .broadcast_to_viewers(event.entity, packet, self.viewer.as_ref(), &connections);
    }
}

/// 8. Spawns a map-marker entity at the death position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeathMarker;

impl Component for DeathMarker {
    fn type_name() -> &'static str {
        "DeathMarker"
    }
}

pub struct PlayerDeathMarkerHandler;

impl RefChangeHandler for PlayerDeathMarkerHandler {
    fn name(&self) -> &str {
        "PlayerDeathMarker"
    }

    fn run(&self, store: &Store, event: &RefChangeEvent, buffer: &mut CommandBuffer) {
        let position = store
            .get_component::<Transform3D>(event.entity)
            .map_or(Transform3D::IDENTITY, Clone::clone);
        let pending = buffer.create_entity();
        buffer.add_component(pending, position);
        buffer.add_component(pending, DeathMarker);
    }
}

/// 9. Enqueues the client-side death-screen UI packet to the dying entity.
pub struct PlayerDeathScreenHandler {
    pub outbox: Arc<dyn PacketOutbox>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DeathScreenMessage {
    cause: DamageCause,
}

impl RefChangeHandler for PlayerDeathScreenHandler {
    fn name(&self) -> &str {
        "PlayerDeathScreen"
    }

    fn run(&self, store: &Store, event: &RefChangeEvent, _buffer: &mut CommandBuffer) {
        let Some(death) = store.get_component::<DeathComponent>(event.entity) else {
            return;
        };
        if let Ok(packet) = Packet::encode("death_screen", &DeathScreenMessage { cause: death.fatal_damage.cause }) {
            self.outbox.send(event.entity, packet);
        }
    }
}

/// 10. Attaches the corpse-removal countdown.
pub struct CorpseRemovalSetupHandler {
    pub duration_seconds: f32,
}

impl RefChangeHandler for CorpseRemovalSetupHandler {
    fn name(&self) -> &str {
        "CorpseRemovalSetup"
    }

    fn run(&self, _store: &Store, event: &RefChangeEvent, buffer: &mut CommandBuffer) {
        buffer.add_component(
            event.entity,
            DeferredCorpseRemoval {
                remaining_seconds: self.duration_seconds,
            },
        );
    }
}

/// Ticks every live [`DeferredCorpseRemoval`] down by `dt`, destroying the
/// entity once it reaches zero. Runs every tick as a regular system, not a
/// `RefChange` handler — it has no structural event to react to, just a
/// countdown.
pub struct DeferredCorpseRemovalSystem;

impl System for DeferredCorpseRemovalSystem {
    fn name(&self) -> &str {
        "DeferredCorpseRemoval"
    }

    fn run(&self, store: &Store, buffer: &mut CommandBuffer, dt: f64) {
        let dt = dt as f32;
        for entity in entities_with1::<DeferredCorpseRemoval>(store) {
            let corpse = *store.get_component::<DeferredCorpseRemoval>(entity).unwrap();
            let remaining = corpse.remaining_seconds - dt;
            if remaining <= 0.0 {
                buffer.destroy_entity(entity);
            } else {
                buffer.set_component(entity, DeferredCorpseRemoval { remaining_seconds: remaining });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use engine_component::RawComponent;
    use engine_net::RecordingOutbox;
    use engine_net::OmniscientViewer;

    use super::*;
    use crate::collaborators::NullCollaborators;

    fn death_event(entity: engine_component::Ref) -> RefChangeEvent {
        RefChangeEvent {
            entity,
            type_id: Some(ComponentTypeId::of::<DeathComponent>()),
            kind: engine_component::RefChangeKind::ComponentAdded,
        }
    }

    #[test]
    fn test_clear_health_floors_to_zero() {
        let mut store = Store::new();
        let entity = store.spawn(vec![RawComponent::of(Health { current: 3.0, max: 10.0 })]);
        let handler = ClearHealthHandler;
        let mut buffer = CommandBuffer::new();
        handler.run(&store, &death_event(entity), &mut buffer);
        let mut buffers = [buffer];
        store.apply_commands(&mut buffers);
        assert_eq!(store.get_component::<Health>(entity).unwrap().current, 0.0);
    }

    #[test]
    fn test_death_animation_picks_cause_specific_state() {
        let mut store = Store::new();
        let entity = store.spawn(vec![RawComponent::of(DeathComponent {
            fatal_damage: crate::damage::Damage::new(DamageCause::Fall, 20.0),
            item_loss: crate::apply::ItemLossRule::DropAll,
        })]);
        let handler = DeathAnimationSystem;
        let mut buffer = CommandBuffer::new();
        handler.run(&store, &death_event(entity), &mut buffer);
        let mut buffers = [buffer];
        store.apply_commands(&mut buffers);
        assert_eq!(store.get_component::<AnimationState>(entity).unwrap().state, "death_fall");
    }

    #[test]
    fn test_drop_config_spawns_item_entities() {
        struct OneDrop;
        impl DeathDropConfig for OneDrop {
            fn compute_drops(&self, _entity: engine_component::Ref, _store: &Store) -> Vec<crate::collaborators::ItemDrop> {
                vec![crate::collaborators::ItemDrop { item_id: "wood_plank".into(), quantity: 4 }]
            }
        }
        let mut store = Store::new();
        let entity = store.spawn(vec![RawComponent::of(Transform3D::IDENTITY)]);
        let handler = DropPlayerDeathItemsHandler { config: Arc::new(OneDrop) };
        let mut buffer = CommandBuffer::new();
        handler.run(&store, &death_event(entity), &mut buffer);
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_corpse_removal_countdown_destroys_entity() {
        let mut store = Store::new();
        let entity = store.spawn(vec![RawComponent::of(DeferredCorpseRemoval { remaining_seconds: 0.05 })]);
        let system = DeferredCorpseRemovalSystem;
        let mut buffer = CommandBuffer::new();
        system.run(&store, &mut buffer, 0.1);
        let mut buffers = [buffer];
        store.apply_commands(&mut buffers);
        assert!(!store.is_alive(entity));
    }

    #[test]
    fn test_kill_feed_broadcasts_to_all_connections() {
        let mut store = Store::new();
        let entity = store.spawn(vec![RawComponent::of(DeathComponent {
            fatal_damage: crate::damage::Damage::new(DamageCause::Melee, 20.0),
            item_loss: crate::apply::ItemLossRule::DropAll,
        })]);
        struct TwoConnections;
        impl ConnectionDirectory for TwoConnections {
            fn all_connections(&self) -> Vec<engine_component::Ref> {
                vec![engine_component::Ref::from_parts(1, 0), engine_component::Ref::from_parts(2, 0)]
            }
        }
        let outbox = Arc::new(RecordingOutbox::new());
        let handler = KillFeedHandler {
            outbox: outbox.clone(),
            viewer: Arc::new(OmniscientViewer),
            connections: Arc::new(TwoConnections),
        };
        let mut buffer = CommandBuffer::new();
        handler.run(&store, &death_event(entity), &mut buffer);
        assert_eq!(outbox.drain().len(), 2);
        let _ = NullCollaborators;
    }
}
