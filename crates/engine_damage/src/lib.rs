//! # engine_damage
//!
//! The damage, death, and respawn pipeline: four ordered per-tick system
//! groups (`GatherDamage` → `FilterDamage` → `ApplyDamage` → `InspectDamage`)
//! producing and consuming an ephemeral `Damage` record, plus two
//! `RefChange`-driven reaction chains triggered by `DeathComponent` being
//! added and removed.
//!
//! This crate provides:
//!
//! - [`damage`] — the ephemeral [`damage::Damage`] record and [`damage::Health`] stat.
//! - [`gather`] — `GatherDamage` group systems (fall, out-of-world, DoT, drowning).
//! - [`filter`] — `FilterDamage` group systems (armor, invulnerability, unkillable).
//! - [`apply`] — the `ApplyDamage` system and [`apply::DeathComponent`].
//! - [`death`] — the ten-step death `RefChange` chain and corpse-removal tick.
//! - [`respawn`] — the respawn `RefChange` chain.
//! - [`collaborators`] — collaborator traits the chains invoke but do not implement.

pub mod apply;
pub mod collaborators;
pub mod damage;
pub mod death;
pub mod filter;
pub mod gather;
pub mod inspect;
pub mod query;
pub mod respawn;

pub use apply::{ApplyDamageSystem, DeathComponent, ItemLossRule};
pub use collaborators::{
    BrokenItemChecker, ConnectionDirectory, DeathDropConfig, DeathInteractionRunner, InPlaceRespawnController,
    InteractionCanceller, ItemDrop, NullCollaborators, RespawnController,
};
pub use damage::{Damage, Health};
pub use death::{
    AnimationState, ClearEntityEffectsHandler, ClearHealthHandler, ClearInteractionsHandler, CorpseRemovalSetupHandler,
    DeathAnimationSystem, DeathMarker, DeferredCorpseRemoval, DeferredCorpseRemovalSystem, DropPlayerDeathItemsHandler,
    KillFeedHandler, PlayerDeathMarkerHandler, PlayerDeathScreenHandler, RunDeathInteractionsHandler,
};
pub use filter::{Armor, ArmorReductionSystem, DesyncFlag, FilterUnkillableSystem, Invulnerable, InvulnerabilityFilterSystem, Unkillable};
pub use gather::{Breath, DotDamageSystem, DotEffect, DrowningDamageSystem, FallDamageSystem, FallState, OutOfWorldDamageSystem};
pub use inspect::{DamageCleanupSystem, DamageIndicatorSystem};
pub use respawn::{
    CheckBrokenItemsHandler, ClearEffectsOnRespawnHandler, ClearInteractionsOnRespawnHandler, PlayerMetadata,
    ResetHealthHandler, ResetPlayerMetadataHandler, RespawnControllerHandler, RespawnPresenceHandler,
};

use std::sync::Arc;

use engine_component::{Component as _, ComponentTypeId};
use engine_system::{RefChangeKind, RefChangeRegistry};

/// Registers the full death chain (ten handlers, in declared order) and the
/// respawn chain onto `registry`, keyed off [`DeathComponent`]'s type id.
/// Callers supply the collaborators and ambient config the chains need;
/// `effect_types` is the set of status-effect component types to strip on
/// both death and respawn.
#[allow(clippy::too_many_arguments)]
pub fn register_death_and_respawn_chains(
    registry: &mut RefChangeRegistry,
    effect_types: Vec<ComponentTypeId>,
    interaction_canceller: Arc<dyn InteractionCanceller>,
    death_interaction_runner: Arc<dyn DeathInteractionRunner>,
    drop_config: Arc<dyn DeathDropConfig>,
    outbox: Arc<dyn engine_net::PacketOutbox>,
    viewer: Arc<dyn engine_net::EntityViewer>,
    connections: Arc<dyn ConnectionDirectory>,
    broken_item_checker: Arc<dyn BrokenItemChecker>,
    respawn_controller: Arc<dyn RespawnController>,
    corpse_removal_seconds: f32,
) {
    let death_type = DeathComponent::component_type_id();

    registry.subscribe(
        death_type,
        RefChangeKind::ComponentAdded,
        Arc::new(death::ClearEntityEffectsHandler {
            effect_types: effect_types.clone(),
        }),
    );
    registry.subscribe(
        death_type,
        RefChangeKind::ComponentAdded,
        Arc::new(death::ClearInteractionsHandler {
            canceller: interaction_canceller.clone(),
        }),
    );
    registry.subscribe(death_type, RefChangeKind::ComponentAdded, Arc::new(death::ClearHealthHandler));
    registry.subscribe(death_type, RefChangeKind::ComponentAdded, Arc::new(death::DeathAnimationSystem));
    registry.subscribe(
        death_type,
        RefChangeKind::ComponentAdded,
        Arc::new(death::RunDeathInteractionsHandler {
            runner: death_interaction_runner,
        }),
    );
    registry.subscribe(
        death_type,
        RefChangeKind::ComponentAdded,
        Arc::new(death::DropPlayerDeathItemsHandler { config: drop_config }),
    );
    registry.subscribe(
        death_type,
        RefChangeKind::ComponentAdded,
        Arc::new(death::KillFeedHandler {
            outbox: outbox.clone(),
            viewer: viewer.clone(),
            connections: connections.clone(),
        }),
    );
    registry.subscribe(
        death_type,
        RefChangeKind::ComponentAdded,
        Arc::new(death::PlayerDeathMarkerHandler),
    );
    registry.subscribe(
        death_type,
        RefChangeKind::ComponentAdded,
        Arc::new(death::PlayerDeathScreenHandler { outbox: outbox.clone() }),
    );
    registry.subscribe(
        death_type,
        RefChangeKind::ComponentAdded,
        Arc::new(death::CorpseRemovalSetupHandler {
            duration_seconds: corpse_removal_seconds,
        }),
    );

    registry.subscribe(death_type, RefChangeKind::ComponentRemoved, Arc::new(respawn::ResetHealthHandler));
    registry.subscribe(
        death_type,
        RefChangeKind::ComponentRemoved,
        Arc::new(respawn::ClearEffectsOnRespawnHandler { effect_types }),
    );
    registry.subscribe(
        death_type,
        RefChangeKind::ComponentRemoved,
        Arc::new(respawn::ClearInteractionsOnRespawnHandler {
            canceller: interaction_canceller,
        }),
    );
    registry.subscribe(
        death_type,
        RefChangeKind::ComponentRemoved,
        Arc::new(respawn::CheckBrokenItemsHandler {
            checker: broken_item_checker,
        }),
    );
    registry.subscribe(
        death_type,
        RefChangeKind::ComponentRemoved,
        Arc::new(respawn::ResetPlayerMetadataHandler),
    );
    registry.subscribe(
        death_type,
        RefChangeKind::ComponentRemoved,
        Arc::new(respawn::RespawnPresenceHandler { outbox, viewer, connections }),
    );
    registry.subscribe(
        death_type,
        RefChangeKind::ComponentRemoved,
        Arc::new(respawn::RespawnControllerHandler {
            controller: respawn_controller,
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_component::{CommandBuffer, RawComponent, Store};
    use engine_net::{OmniscientViewer, RecordingOutbox};

    #[test]
    fn test_full_death_chain_runs_in_declared_order() {
        let mut registry = RefChangeRegistry::new();
        register_death_and_respawn_chains(
            &mut registry,
            vec![ComponentTypeId::of::<DotEffect>()],
            Arc::new(NullCollaborators),
            Arc::new(NullCollaborators),
            Arc::new(NullCollaborators),
            Arc::new(RecordingOutbox::new()),
            Arc::new(OmniscientViewer),
            Arc::new(NullCollaborators),
            Arc::new(NullCollaborators),
            Arc::new(InPlaceRespawnController),
            5.0,
        );

        let mut store = Store::new();
        let entity = store.spawn(vec![RawComponent::of(Health::new(10.0))]);
        let mut buffer = CommandBuffer::new();
        buffer.add_component(
            entity,
            DeathComponent {
                fatal_damage: Damage::new(engine_assets::DamageCause::Fall, 10.0),
                item_loss: ItemLossRule::DropAll,
            },
        );
        let mut buffers = [buffer];
        let events = store.apply_commands(&mut buffers);
        let mut handler_buffers = registry.dispatch(&store, &events);
        store.apply_commands(&mut handler_buffers);

        assert!(store.get_component::<DeathComponent>(entity).is_some());
        assert_eq!(store.get_component::<AnimationState>(entity).unwrap().state, "death_fall");
        assert!(store.get_component::<DeferredCorpseRemoval>(entity).is_some());
    }

    #[test]
    fn test_respawn_chain_resets_health() {
        let mut registry = RefChangeRegistry::new();
        register_death_and_respawn_chains(
            &mut registry,
            vec![],
            Arc::new(NullCollaborators),
            Arc::new(NullCollaborators),
            Arc::new(NullCollaborators),
            Arc::new(RecordingOutbox::new()),
            Arc::new(OmniscientViewer),
            Arc::new(NullCollaborators),
            Arc::new(NullCollaborators),
            Arc::new(InPlaceRespawnController),
            5.0,
        );

        let mut store = Store::new();
        let entity = store.spawn(vec![
            RawComponent::of(Health { current: 0.0, max: 10.0 }),
            RawComponent::of(DeathComponent {
                fatal_damage: Damage::new(engine_assets::DamageCause::Fall, 10.0),
                item_loss: ItemLossRule::DropAll,
            }),
        ]);
        let mut buffer = CommandBuffer::new();
        buffer.remove_component(entity, DeathComponent::component_type_id());
        let mut buffers = [buffer];
        let events = store.apply_commands(&mut buffers);
        let mut handler_buffers = registry.dispatch(&store, &events);
        store.apply_commands(&mut handler_buffers);

        assert_eq!(store.get_component::<Health>(entity).unwrap().current, 10.0);
        assert_eq!(store.get_component::<PlayerMetadata>(entity).unwrap().death_count, 1);
    }
}
