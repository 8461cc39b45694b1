//! # engine_app — Coordinator
//!
//! The single-process tick coordinator. It owns the [`world::World`] (entity
//! store, scheduler, `RefChange` reaction chains) and drives it at a fixed
//! rate via [`tick::TickLoop`].
//!
//! Gameplay systems are registered into the scheduler at startup, grouped by
//! `engine_system::SystemGroup`; this binary's job is assembling those
//! systems and their collaborators, not implementing gameplay logic itself.

mod systems;
mod tick;
mod tracker;
mod world;

use std::sync::Arc;

use anyhow::Result;
use engine_damage::{InPlaceRespawnController, NullCollaborators};
use engine_net::{OmniscientViewer, RecordingOutbox};
use engine_physics::{EmptySpatialResource, NoCollisionModule, NoFluidVolume};
use systems::{PhysicsCollaborators, TuningConfig};
use tick::{TickConfig, TickLoop};
use tracing::info;
use tracing_subscriber::EnvFilter;
use world::{World, WorldCollaborators};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("engine_app=info".parse()?))
        .init();

    info!("engine coordinator starting");

    // Collaborators are no-op/in-place placeholders until the deployment
    // that owns interaction cancellation, item drops, and connection fan-out
    // is wired in here.
    let mut world = World::new(
        num_cpus(),
        vec![],
        5.0,
        20,
        WorldCollaborators {
            death_interaction_runner: Arc::new(NullCollaborators),
            drop_config: Arc::new(NullCollaborators),
            outbox: Arc::new(RecordingOutbox::new()),
            viewer: Arc::new(OmniscientViewer),
            connections: Arc::new(NullCollaborators),
            broken_item_checker: Arc::new(NullCollaborators),
            respawn_controller: Arc::new(InPlaceRespawnController),
            physics: PhysicsCollaborators {
                collision: Arc::new(NoCollisionModule),
                spatial: Arc::new(EmptySpatialResource),
                fluid: Arc::new(NoFluidVolume),
            },
            tuning: TuningConfig::default(),
        },
    )?;

    let config = TickConfig {
        tick_rate: 60.0,
        max_ticks: 0,
    };
    TickLoop::new(config).run(&mut world);

    info!("engine coordinator shut down");
    Ok(())
}

fn num_cpus() -> usize {
    std::thread::available_parallelism().map(std::num::NonZeroUsize::get).unwrap_or(4)
}
