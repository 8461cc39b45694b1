//! The coordinator's aggregate: the entity store, the system scheduler, and
//! the collaborators every gameplay crate wires its systems and reaction
//! chains through.
//!
//! [`World::tick`] is the fixed-timestep step: each [`SystemGroup`] runs its
//! parallel stages against a read-only snapshot of the store, then syncs —
//! applies the group's command buffers and dispatches any `RefChange`
//! reactions those buffers triggered (the death/respawn chain's chief use) —
//! before the next group starts. This is the single-process analogue of
//! `engine_system::scheduler`'s doc comment: "the world/tick loop ... calls
//! `Scheduler::run_group` once per group and applies each group's buffers to
//! the store before starting the next."

use std::sync::Arc;

use engine_assets::AssetRegistry;
use engine_component::{CommandBuffer, RawComponent, Ref, RefChangeEvent, Store};
use engine_damage::collaborators::{
    BrokenItemChecker, ConnectionDirectory, DeathDropConfig, DeathInteractionRunner, InteractionCanceller,
    RespawnController,
};
use engine_damage::DesyncFlag;
use engine_interaction::InteractionDispatcher;
use engine_net::{EntityViewer, PacketOutbox};
use engine_system::{RefChangeRegistry, Scheduler, SchedulerError, SystemGroup};

use crate::systems::{register_default_systems, PhysicsCollaborators, TuningConfig};

/// The collaborators a [`World`] needs to wire the damage/death/respawn
/// chain (see `engine_damage::register_death_and_respawn_chains`) and the
/// per-tick gameplay systems (see `crate::systems::register_default_systems`).
/// Bundled into one struct since `World::new` otherwise takes an unwieldy
/// number of trait-object arguments.
pub struct WorldCollaborators {
    pub death_interaction_runner: Arc<dyn DeathInteractionRunner>,
    pub drop_config: Arc<dyn DeathDropConfig>,
    pub outbox: Arc<dyn PacketOutbox>,
    pub viewer: Arc<dyn EntityViewer>,
    pub connections: Arc<dyn ConnectionDirectory>,
    pub broken_item_checker: Arc<dyn BrokenItemChecker>,
    pub respawn_controller: Arc<dyn RespawnController>,
    pub physics: PhysicsCollaborators,
    pub tuning: TuningConfig,
}

/// The canonical per-process world state: the ECS store plus everything
/// needed to advance it one tick.
pub struct World {
    pub store: Store,
    pub scheduler: Scheduler,
    pub refchange: RefChangeRegistry,
    pub assets: Arc<AssetRegistry>,
    pub interactions: Arc<InteractionDispatcher>,
    pub desync: DesyncFlag,
    tick_count: u64,
}

impl World {
    /// Build a world with `worker_count` scheduler threads, wiring the
    /// death/death-animation/respawn `RefChange` chain immediately so every
    /// `DeathComponent` add/remove reacts from tick one.
    ///
    /// # Errors
    ///
    /// Returns a [`SchedulerError`] if the scheduler's worker pool fails to
    /// start.
    pub fn new(
        worker_count: usize,
        effect_types: Vec<engine_component::ComponentTypeId>,
        status_effect_corpse_seconds: f32,
        max_client_data_wait_ticks: u32,
        collaborators: WorldCollaborators,
    ) -> Result<Self, SchedulerError> {
        let mut scheduler = Scheduler::new(worker_count)?;
        let assets = Arc::new(AssetRegistry::new());
        let interactions = Arc::new(InteractionDispatcher::new(max_client_data_wait_ticks));
        let desync = DesyncFlag::new();

        register_default_systems(
            &mut scheduler,
            assets.clone(),
            collaborators.physics,
            collaborators.outbox.clone(),
            collaborators.viewer.clone(),
            collaborators.connections.clone(),
            &desync,
            collaborators.tuning,
        )?;

        let mut refchange = RefChangeRegistry::new();
        engine_damage::register_death_and_respawn_chains(
            &mut refchange,
            effect_types,
            interactions.clone() as Arc<dyn InteractionCanceller>,
            collaborators.death_interaction_runner,
            collaborators.drop_config,
            collaborators.outbox,
            collaborators.viewer,
            collaborators.connections,
            collaborators.broken_item_checker,
            collaborators.respawn_controller,
            status_effect_corpse_seconds,
        );

        Ok(Self {
            store: Store::new(),
            scheduler,
            refchange,
            assets,
            interactions,
            desync,
            tick_count: 0,
        })
    }

    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Spawn an entity with the given initial components.
    pub fn spawn(&mut self, components: Vec<RawComponent>) -> Ref {
        self.store.spawn(components)
    }

    /// Advance the world by one tick of `dt` seconds: run every
    /// [`SystemGroup`] in order, syncing (applying buffers, then dispatching
    /// `RefChange` reactions those buffers produced) between each.
    ///
    /// Returns every [`RefChangeEvent`] observed this tick, in group order,
    /// for callers that want to react further (e.g. networking fan-out).
    pub fn tick(&mut self, dt: f64) -> Vec<RefChangeEvent> {
        let mut all_events = Vec::new();
        for &group in &SystemGroup::ORDER {
            let mut buffers = self.scheduler.run_group(group, &self.store, dt);
            all_events.extend(self.sync(&mut buffers));
        }
        self.tick_count += 1;
        all_events
    }

    /// Apply a single externally-sourced command buffer (e.g. a client
    /// packet's requested mutation) outside the regular system groups,
    /// immediately syncing it and dispatching any `RefChange` reactions it
    /// triggers. Used for interaction `first_run` commands, which are
    /// recorded in response to a packet rather than a per-tick query.
    pub fn apply_immediate(&mut self, buffer: CommandBuffer) -> Vec<RefChangeEvent> {
        let mut buffers = [buffer];
        self.sync(&mut buffers)
    }

    /// Apply `buffers` to the store, then dispatch and apply any
    /// `RefChange` reactions those buffers triggered. Shared by `tick`
    /// (per-group) and `apply_immediate` (single out-of-band buffer) so
    /// neither path can apply a structural change without giving the
    /// death/respawn chain a chance to react to it.
    fn sync(&mut self, buffers: &mut [CommandBuffer]) -> Vec<RefChangeEvent> {
        let mut events = self.store.apply_commands(buffers);
        let mut reaction_buffers = self.refchange.dispatch(&self.store, &events);
        if !reaction_buffers.is_empty() {
            events.extend(self.store.apply_commands(&mut reaction_buffers));
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use engine_damage::NullCollaborators;
    use engine_net::{OmniscientViewer, RecordingOutbox};
    use engine_physics::{EmptySpatialResource, NoCollisionModule, NoFluidVolume};

    use super::*;

    fn null_collaborators() -> WorldCollaborators {
        WorldCollaborators {
            death_interaction_runner: Arc::new(NullCollaborators),
            drop_config: Arc::new(NullCollaborators),
            outbox: Arc::new(RecordingOutbox::new()),
            viewer: Arc::new(OmniscientViewer),
            connections: Arc::new(NullCollaborators),
            broken_item_checker: Arc::new(NullCollaborators),
            respawn_controller: Arc::new(engine_damage::InPlaceRespawnController),
            physics: PhysicsCollaborators {
                collision: Arc::new(NoCollisionModule),
                spatial: Arc::new(EmptySpatialResource),
                fluid: Arc::new(NoFluidVolume),
            },
            tuning: TuningConfig::default(),
        }
    }

    #[test]
    fn test_new_world_starts_at_tick_zero() {
        let world = World::new(2, vec![], 5.0, 20, null_collaborators()).unwrap();
        assert_eq!(world.tick_count(), 0);
        assert!(world.store.is_empty());
    }

    #[test]
    fn test_tick_with_no_entities_is_a_noop_and_advances_counter() {
        let mut world = World::new(2, vec![], 5.0, 20, null_collaborators()).unwrap();
        let events = world.tick(1.0 / 60.0);
        assert!(events.is_empty());
        assert_eq!(world.tick_count(), 1);
    }

    #[test]
    fn test_death_chain_fires_through_world_tick_sync() {
        use engine_damage::{Damage, DeathComponent, Health, ItemLossRule};

        let mut world = World::new(2, vec![], 5.0, 20, null_collaborators()).unwrap();
        let entity = world.spawn(vec![RawComponent::of(Health::new(10.0))]);

        let mut buffer = CommandBuffer::new();
        buffer.add_component(
            entity,
            DeathComponent {
                fatal_damage: Damage::new(engine_assets::DamageCause::Fall, 10.0),
                item_loss: ItemLossRule::DropAll,
            },
        );
        world.apply_immediate(buffer);

        assert!(world.store.get_component::<DeathComponent>(entity).is_some());
        assert!(world.store.get_component::<engine_damage::DeferredCorpseRemoval>(entity).is_some());
    }
}
