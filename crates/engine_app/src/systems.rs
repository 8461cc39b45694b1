//! Assembles the concrete gameplay [`System`]s and registers them into a
//! [`Scheduler`], grouped and ordered per [`SystemGroup`]. This binary's own
//! job ends here — the gameplay logic lives in `engine_damage`,
//! `engine_physics`, and this crate's own [`crate::tracker`].

use std::sync::Arc;

use engine_assets::AssetRegistry;
use engine_component::{ComponentTypeId, QueryDescriptor};
use engine_damage::collaborators::ConnectionDirectory;
use engine_damage::{
    Armor, ArmorReductionSystem, ApplyDamageSystem, Breath, Damage, DamageCleanupSystem, DamageIndicatorSystem,
    DesyncFlag, DotDamageSystem, DotEffect, DrowningDamageSystem, FallDamageSystem, FallState, FilterUnkillableSystem,
    Health, ItemLossRule, Invulnerable, InvulnerabilityFilterSystem, OutOfWorldDamageSystem, Unkillable,
};
use engine_damage::apply::DeathComponent;
use engine_damage::death::DeferredCorpseRemoval;
use engine_math::{Transform3D, Velocity};
use engine_net::{EntityViewer, PacketOutbox};
use engine_physics::{
    BoundingBox, CollisionModule, CollisionResolutionSystem, FluidSubmersionSystem, FluidVolume,
    GravityIntegrationSystem, ItemComponent, ItemMergeSystem, PhysicsValues, PickupInterpolationSystem,
    PickupItemComponent, PredictedProjectile, ProjectileIntegrationSystem, SpatialResource, Swimming, UnstickSystem,
};
use engine_system::{RegisteredSystem, Scheduler, SchedulerError, SystemGroup};
use glam::Vec3;

use crate::tracker::EntityTrackerUpdateSystem;

/// Collision/spatial/fluid seams the physics systems dispatch through.
pub struct PhysicsCollaborators {
    pub collision: Arc<dyn CollisionModule>,
    pub spatial: Arc<dyn SpatialResource>,
    pub fluid: Arc<dyn FluidVolume>,
}

/// Tunable constants for the default system set. Mirrors the kind of
/// deployment-specific knobs a real server reads from its config file; here
/// they're just fields with sane defaults.
pub struct TuningConfig {
    pub gravity: Vec3,
    pub rest_speed_threshold: f32,
    pub pickup_speed: f32,
    pub fall_safe_speed: f32,
    pub fall_damage_per_unit_speed: f32,
    pub out_of_world_floor_y: f32,
    pub out_of_world_damage_per_tick: f32,
    pub drowning_depletion_per_second: f32,
    pub drowning_regeneration_per_second: f32,
    pub drowning_damage_per_second: f32,
    pub fully_submerged_threshold: f32,
    pub item_loss: ItemLossRule,
    pub default_projectile_config_id: String,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            rest_speed_threshold: 0.1,
            pickup_speed: 4.0,
            fall_safe_speed: 5.0,
            fall_damage_per_unit_speed: 1.0,
            out_of_world_floor_y: -64.0,
            out_of_world_damage_per_tick: 4.0,
            drowning_depletion_per_second: 1.0,
            drowning_regeneration_per_second: 2.0,
            drowning_damage_per_second: 2.0,
            fully_submerged_threshold: 0.9,
            item_loss: ItemLossRule::DropAll,
            default_projectile_config_id: "default_projectile".to_string(),
        }
    }
}

/// Registers every per-tick gameplay system this crate ships with into
/// `scheduler`. Called once from [`crate::world::World::new`]; the
/// death/respawn `RefChange` chain is registered separately (see
/// `engine_damage::register_death_and_respawn_chains`) since it reacts to
/// structural changes rather than running every tick.
#[allow(clippy::too_many_arguments)]
pub fn register_default_systems(
    scheduler: &mut Scheduler,
    assets: Arc<AssetRegistry>,
    physics: PhysicsCollaborators,
    outbox: Arc<dyn PacketOutbox>,
    viewer: Arc<dyn EntityViewer>,
    connections: Arc<dyn ConnectionDirectory>,
    desync: &DesyncFlag,
    tuning: TuningConfig,
) -> Result<(), SchedulerError> {
    // GatherDamage
    scheduler.register(RegisteredSystem::new(
        "FallDamage",
        SystemGroup::GatherDamage,
        QueryDescriptor::new()
            .read(ComponentTypeId::of::<Velocity>())
            .write(ComponentTypeId::of::<FallState>())
            .write(ComponentTypeId::of::<Damage>()),
        Arc::new(FallDamageSystem {
            safe_speed: tuning.fall_safe_speed,
            damage_per_unit_speed: tuning.fall_damage_per_unit_speed,
        }),
    ))?;
    scheduler.register(RegisteredSystem::new(
        "OutOfWorldDamage",
        SystemGroup::GatherDamage,
        QueryDescriptor::new()
            .read(ComponentTypeId::of::<Transform3D>())
            .write(ComponentTypeId::of::<Damage>()),
        Arc::new(OutOfWorldDamageSystem {
            floor_y: tuning.out_of_world_floor_y,
            damage_per_tick: tuning.out_of_world_damage_per_tick,
        }),
    ))?;
    scheduler.register(RegisteredSystem::new(
        "DotDamage",
        SystemGroup::GatherDamage,
        QueryDescriptor::new()
            .write(ComponentTypeId::of::<DotEffect>())
            .write(ComponentTypeId::of::<Damage>()),
        Arc::new(DotDamageSystem),
    ))?;
    scheduler.register(RegisteredSystem::new(
        "DrowningDamage",
        SystemGroup::GatherDamage,
        QueryDescriptor::new()
            .write(ComponentTypeId::of::<Breath>())
            .read(ComponentTypeId::of::<Swimming>())
            .write(ComponentTypeId::of::<Damage>()),
        Arc::new(DrowningDamageSystem {
            depletion_per_second: tuning.drowning_depletion_per_second,
            regeneration_per_second: tuning.drowning_regeneration_per_second,
            damage_per_second: tuning.drowning_damage_per_second,
        }),
    ))?;

    // FilterDamage — all three share a `Damage` write, so the scheduler
    // serializes them into stages in this registration order, which is also
    // the order armor, invulnerability, and the unkillable filter should
    // logically apply in.
    scheduler.register(RegisteredSystem::new(
        "ArmorReduction",
        SystemGroup::FilterDamage,
        QueryDescriptor::new()
            .read(ComponentTypeId::of::<Armor>())
            .write(ComponentTypeId::of::<Damage>()),
        Arc::new(ArmorReductionSystem),
    ))?;
    scheduler.register(RegisteredSystem::new(
        "InvulnerabilityFilter",
        SystemGroup::FilterDamage,
        QueryDescriptor::new()
            .read(ComponentTypeId::of::<Invulnerable>())
            .write(ComponentTypeId::of::<Damage>()),
        Arc::new(InvulnerabilityFilterSystem),
    ))?;
    scheduler.register(RegisteredSystem::new(
        "FilterUnkillable",
        SystemGroup::FilterDamage,
        QueryDescriptor::new()
            .read(ComponentTypeId::of::<Unkillable>())
            .write(ComponentTypeId::of::<Damage>()),
        Arc::new(FilterUnkillableSystem { desync: desync.clone() }),
    ))?;

    // ApplyDamage
    scheduler.register(RegisteredSystem::new(
        "ApplyDamage",
        SystemGroup::ApplyDamage,
        QueryDescriptor::new()
            .read(ComponentTypeId::of::<Damage>())
            .write(ComponentTypeId::of::<Health>())
            .write(ComponentTypeId::of::<DeathComponent>()),
        Arc::new(ApplyDamageSystem { item_loss: tuning.item_loss }),
    ))?;

    // InspectDamage — cleanup must observe every other inspector's read, so
    // it depends on the indicator system to guarantee it runs last.
    scheduler.register(RegisteredSystem::new(
        "DamageIndicator",
        SystemGroup::InspectDamage,
        QueryDescriptor::new().read(ComponentTypeId::of::<Damage>()),
        Arc::new(DamageIndicatorSystem {
            outbox: outbox.clone(),
            viewer: viewer.clone(),
            connections: connections.all_connections(),
        }),
    ))?;
    scheduler.register(
        RegisteredSystem::new(
            "DamageCleanup",
            SystemGroup::InspectDamage,
            QueryDescriptor::new().write(ComponentTypeId::of::<Damage>()),
            Arc::new(DamageCleanupSystem),
        )
        .depends_on("DamageIndicator"),
    )?;

    // PrePhysics
    scheduler.register(RegisteredSystem::new(
        "Unstick",
        SystemGroup::PrePhysics,
        QueryDescriptor::new()
            .read(ComponentTypeId::of::<ItemComponent>())
            .write(ComponentTypeId::of::<Transform3D>()),
        Arc::new(UnstickSystem {
            collision: physics.collision.clone(),
        }),
    ))?;
    scheduler.register(RegisteredSystem::new(
        "FluidSubmersion",
        SystemGroup::PrePhysics,
        QueryDescriptor::new()
            .read(ComponentTypeId::of::<Transform3D>())
            .read(ComponentTypeId::of::<BoundingBox>())
            .write(ComponentTypeId::of::<Swimming>()),
        Arc::new(FluidSubmersionSystem {
            fluid: physics.fluid.clone(),
            fully_submerged_threshold: tuning.fully_submerged_threshold,
        }),
    ))?;

    // Physics — registration order doubles as execution order since each of
    // these shares a `Transform3D`/`Velocity` write with the last, which the
    // scheduler's conflict-based stage assignment serializes accordingly.
    scheduler.register(RegisteredSystem::new(
        "GravityIntegration",
        SystemGroup::Physics,
        QueryDescriptor::new()
            .read(ComponentTypeId::of::<PhysicsValues>())
            .write(ComponentTypeId::of::<Velocity>())
            .write(ComponentTypeId::of::<Transform3D>()),
        Arc::new(GravityIntegrationSystem { gravity: tuning.gravity }),
    ))?;
    scheduler.register(RegisteredSystem::new(
        "CollisionResolution",
        SystemGroup::Physics,
        QueryDescriptor::new()
            .read(ComponentTypeId::of::<BoundingBox>())
            .write(ComponentTypeId::of::<Transform3D>())
            .write(ComponentTypeId::of::<Velocity>())
            .write(ComponentTypeId::of::<PhysicsValues>()),
        Arc::new(CollisionResolutionSystem {
            collision: physics.collision.clone(),
            rest_speed_threshold: tuning.rest_speed_threshold,
        }),
    ))?;
    scheduler.register(RegisteredSystem::new(
        "ItemMerge",
        SystemGroup::Physics,
        QueryDescriptor::new()
            .read(ComponentTypeId::of::<Transform3D>())
            .write(ComponentTypeId::of::<ItemComponent>()),
        Arc::new(ItemMergeSystem {
            spatial: physics.spatial.clone(),
            assets: assets.clone(),
        }),
    ))?;
    scheduler.register(RegisteredSystem::new(
        "ProjectileIntegration",
        SystemGroup::Physics,
        QueryDescriptor::new()
            .write(ComponentTypeId::of::<Transform3D>())
            .write(ComponentTypeId::of::<Velocity>())
            .write(ComponentTypeId::of::<PredictedProjectile>()),
        Arc::new(ProjectileIntegrationSystem {
            collision: physics.collision.clone(),
            gravity: tuning.gravity,
            assets: assets.clone(),
            default_config_id: tuning.default_projectile_config_id,
        }),
    ))?;

    // PostPhysics
    scheduler.register(RegisteredSystem::new(
        "PickupInterpolation",
        SystemGroup::PostPhysics,
        QueryDescriptor::new()
            .write(ComponentTypeId::of::<Transform3D>())
            .write(ComponentTypeId::of::<PickupItemComponent>()),
        Arc::new(PickupInterpolationSystem { speed: tuning.pickup_speed }),
    ))?;
    scheduler.register(RegisteredSystem::new(
        "DeferredCorpseRemoval",
        SystemGroup::PostPhysics,
        QueryDescriptor::new().write(ComponentTypeId::of::<DeferredCorpseRemoval>()),
        Arc::new(engine_damage::DeferredCorpseRemovalSystem),
    ))?;

    // TrackerQueueUpdate
    scheduler.register(RegisteredSystem::new(
        "EntityTrackerUpdate",
        SystemGroup::TrackerQueueUpdate,
        QueryDescriptor::new().read(ComponentTypeId::of::<PredictedProjectile>()),
        Arc::new(EntityTrackerUpdateSystem::new(outbox, viewer, connections)),
    ))?;

    Ok(())
}
