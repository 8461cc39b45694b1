//! Concrete physics `System` implementations.
//!
//! Each system here only ever reads through `store` and records its intent
//! into the per-worker `CommandBuffer`; none of them mutate the store
//! directly, so systems with disjoint writes can share a parallel stage
//! (see `engine_system::Scheduler`).

use std::sync::Arc;

use engine_assets::{AssetRegistry, ItemDescriptor, ProjectileConfig};
use engine_component::{CommandBuffer, Component, ComponentTypeId, Ref, Store};
use engine_math::{Transform3D, Velocity};
use engine_system::System;
use glam::Vec3;

use crate::bounding_box::BoundingBox;
use crate::collision::{BounceConsumer as _, CollisionModule, ImpactConsumer as _, SpatialResource};
use crate::item::{Interactable, ItemComponent, PickupItemComponent, PreventItemMerging, PreventPickup};
use crate::physics_values::{clamp_velocity, PhysicsValues, MAX_LINEAR_SPEED};
use crate::projectile::{BounceConsumer, ImpactConsumer, NullConsumer, PredictedProjectile, StandardPhysicsProvider};

/// Nudges item entities clear of solid geometry they've ended up embedded
/// in (spawned inside a wall, a block placed on top of a dropped item) by
/// the smallest displacement the `CollisionModule` reports. Runs in
/// `PrePhysics`, before gravity integration moves the entity further.
pub struct UnstickSystem {
    pub collision: Arc<dyn CollisionModule>,
}

impl System for UnstickSystem {
    fn name(&self) -> &str {
        "Unstick"
    }

    fn run(&self, store: &Store, buffer: &mut CommandBuffer, _dt: f64) {
        for entity in entities_with2::<ItemComponent, Transform3D>(store) {
            let Some(bounds) = store.get_component::<BoundingBox>(entity) else {
                continue;
            };
            let transform = *store.get_component::<Transform3D>(entity).unwrap();
            if let Some(displacement) = self.collision.resolve_overlap(bounds, transform.position) {
                buffer.set_component(
                    entity,
                    Transform3D {
                        position: transform.position + displacement,
                        ..transform
                    },
                );
            }
        }
    }
}

/// Integrates gravity and drag for every entity with a `Transform3D`,
/// `Velocity`, and `PhysicsValues` that isn't `resting`.
pub struct GravityIntegrationSystem {
    pub gravity: Vec3,
}

impl System for GravityIntegrationSystem {
    fn name(&self) -> &str {
        "GravityIntegration"
    }

    fn run(&self, store: &Store, buffer: &mut CommandBuffer, dt: f64) {
        let dt = dt as f32;
        for entity in entities_with3::<Transform3D, Velocity, PhysicsValues>(store) {
            let values = store.get_component::<PhysicsValues>(entity).unwrap();
            if values.resting {
                continue;
            }
            let velocity = *store.get_component::<Velocity>(entity).unwrap();
            let accel = self.gravity * values.gravity_scale;
            let drag = 1.0 - values.drag.clamp(0.0, 1.0);
            let new_linear = (velocity.linear + accel * dt) * drag;
            let new_linear = clamp_velocity(new_linear, MAX_LINEAR_SPEED, entity, "GravityIntegration");
            buffer.set_component(entity, Velocity::linear(new_linear));

            let transform = *store.get_component::<Transform3D>(entity).unwrap();
            buffer.set_component(
                entity,
                Transform3D {
                    position: transform.position + new_linear * dt,
                    ..transform
                },
            );
        }
    }
}

/// Sweeps moving bodies against world geometry, stopping them at the hit
/// point and marking entities that come to rest as `resting`.
pub struct CollisionResolutionSystem {
    pub collision: Arc<dyn CollisionModule>,
    pub rest_speed_threshold: f32,
}

impl System for CollisionResolutionSystem {
    fn name(&self) -> &str {
        "CollisionResolution"
    }

    fn run(&self, store: &Store, buffer: &mut CommandBuffer, _dt: f64) {
        for entity in entities_with4::<Transform3D, Velocity, PhysicsValues, BoundingBox>(store) {
            let values = *store.get_component::<PhysicsValues>(entity).unwrap();
            if values.resting {
                continue;
            }
            let transform = *store.get_component::<Transform3D>(entity).unwrap();
            let velocity = *store.get_component::<Velocity>(entity).unwrap();
            let bounds = *store.get_component::<BoundingBox>(entity).unwrap();

            let from = transform.position;
            let to = from + velocity.linear;
            if let Some(hit) = self.collision.sweep(entity, &bounds, from, to) {
                let hit_position = from + (to - from) * hit.t;
                let slide = velocity.linear - velocity.linear.dot(hit.normal) * hit.normal;
                let retained = slide * values.restitution;
                buffer.set_component(
                    entity,
                    Transform3D {
                        position: hit_position,
                        ..transform
                    },
                );
                if retained.length() < self.rest_speed_threshold {
                    buffer.set_component(entity, Velocity::ZERO);
                    buffer.set_component(
                        entity,
                        PhysicsValues {
                            resting: true,
                            ..values
                        },
                    );
                } else {
                    buffer.set_component(entity, Velocity::linear(retained));
                }
            }
        }
    }
}

/// Merges same-kind item stacks that drift within merge radius of each
/// other, respecting `ItemDescriptor::merge_radius` and `PreventItemMerging`.
pub struct ItemMergeSystem {
    pub spatial: Arc<dyn SpatialResource>,
    pub assets: Arc<AssetRegistry>,
}

impl System for ItemMergeSystem {
    fn name(&self) -> &str {
        "ItemMerge"
    }

    fn run(&self, store: &Store, buffer: &mut CommandBuffer, _dt: f64) {
        let merge_exclude = ComponentTypeId::of::<PreventItemMerging>();
        let interactable = ComponentTypeId::of::<Interactable>();
        for entity in entities_with2::<Transform3D, ItemComponent>(store) {
            if store.get_component_raw(entity, merge_exclude).is_some()
                || store.get_component_raw(entity, interactable).is_some()
            {
                continue;
            }
            let item = store.get_component::<ItemComponent>(entity).unwrap().clone();
            let Some(descriptor) = self.assets.get::<ItemDescriptor>(&item.item_id) else {
                continue;
            };
            let transform = *store.get_component::<Transform3D>(entity).unwrap();

            for other in self.spatial.nearby(transform.position, descriptor.merge_radius) {
                if other == entity || !store.is_alive(other) {
                    continue;
                }
                if store.get_component_raw(other, merge_exclude).is_some()
                    || store.get_component_raw(other, interactable).is_some()
                {
                    continue;
                }
                let Some(other_item) = store.get_component::<ItemComponent>(other) else {
                    continue;
                };
                if other_item.item_id != item.item_id {
                    continue;
                }
                if item.quantity + other_item.quantity > descriptor.max_stack_size {
                    continue;
                }
                // Lower-indexed entity absorbs the higher one, so two
                // workers scanning the same pair converge on one winner.
                if entity.index() < other.index() {
                    buffer.set_component(
                        entity,
                        ItemComponent {
                            quantity: item.quantity + other_item.quantity,
                            ..item.clone()
                        },
                    );
                    buffer.destroy_entity(other);
                }
            }
        }
    }
}

/// Advances entities mid-flight toward a picking-up holder, handing the
/// stack off once interpolation completes.
pub struct PickupInterpolationSystem {
    /// Units of progress per second.
    pub speed: f32,
}

impl System for PickupInterpolationSystem {
    fn name(&self) -> &str {
        "PickupInterpolation"
    }

    fn run(&self, store: &Store, buffer: &mut CommandBuffer, dt: f64) {
        let dt = dt as f32;
        let prevent_pickup = ComponentTypeId::of::<PreventPickup>();
        for entity in entities_with2::<Transform3D, PickupItemComponent>(store) {
            if store.get_component_raw(entity, prevent_pickup).is_some() {
                continue;
            }
            let pickup = *store.get_component::<PickupItemComponent>(entity).unwrap();
            if !store.is_alive(pickup.holder) {
                buffer.remove_component(entity, ComponentTypeId::of::<PickupItemComponent>());
                continue;
            }
            let Some(holder_transform) = store.get_component::<Transform3D>(pickup.holder) else {
                continue;
            };
            let transform = *store.get_component::<Transform3D>(entity).unwrap();
            let progress = (pickup.progress + dt * self.speed).min(1.0);
            let position = transform.position.lerp(holder_transform.position, progress);
            buffer.set_component(entity, Transform3D { position, ..transform });

            if progress >= 1.0 {
                buffer.remove_component(entity, ComponentTypeId::of::<PickupItemComponent>());
            } else {
                buffer.set_component(entity, PickupItemComponent { progress, ..pickup });
            }
        }
    }
}

/// Wires a projectile's bounce/impact notifications into its owning
/// system's `CommandBuffer` for this tick.
struct RecordingConsumer<'a> {
    buffer: std::cell::RefCell<&'a mut CommandBuffer>,
}

impl<'a> BounceConsumer for RecordingConsumer<'a> {
    fn on_bounce(&self, _entity: Ref, _hit: &crate::collision::SweepHit) {}
}

impl<'a> ImpactConsumer for RecordingConsumer<'a> {
    fn on_impact(&self, entity: Ref, _hit: &crate::collision::SweepHit) {
        self.buffer.borrow_mut().remove_component(entity, ComponentTypeId::of::<PredictedProjectile>());
    }
}

/// Integrates `PredictedProjectile` ballistics each tick via
/// [`StandardPhysicsProvider`].
pub struct ProjectileIntegrationSystem {
    pub collision: Arc<dyn CollisionModule>,
    pub gravity: Vec3,
    pub assets: Arc<AssetRegistry>,
    pub default_config_id: String,
}

impl System for ProjectileIntegrationSystem {
    fn name(&self) -> &str {
        "ProjectileIntegration"
    }

    fn run(&self, store: &Store, buffer: &mut CommandBuffer, dt: f64) {
        let provider = StandardPhysicsProvider {
            collision: self.collision.as_ref(),
            gravity: self.gravity,
        };
        let config = self
            .assets
            .get::<ProjectileConfig>(&self.default_config_id)
            .unwrap_or(ProjectileConfig {
                launch_speed: 0.0,
                gravity_scale: 1.0,
                bounce_restitution: 0.4,
                max_bounces: 0,
                rotation_mode: engine_assets::RotationMode::Preserve,
                vertical_center_shot: 0.0,
                depth_shot: 0.0,
            });

        for entity in entities_with3::<Transform3D, Velocity, PredictedProjectile>(store) {
            let transform = *store.get_component::<Transform3D>(entity).unwrap();
            let velocity = *store.get_component::<Velocity>(entity).unwrap();
            let mut projectile = *store.get_component::<PredictedProjectile>(entity).unwrap();

            let consumer = RecordingConsumer {
                buffer: std::cell::RefCell::new(buffer),
            };
            let (new_transform, new_velocity) = provider.step(
                entity,
                transform,
                velocity,
                &config,
                &mut projectile,
                dt as f32,
                &consumer,
                &consumer,
            );
            drop(consumer);
            buffer.set_component(entity, new_transform);
            buffer.set_component(entity, new_velocity);
            buffer.set_component(entity, projectile);
        }
    }
}

fn entities_with2<A: Component, B: Component>(store: &Store) -> Vec<Ref> {
    let query = engine_component::QueryDescriptor::new()
        .read(ComponentTypeId::of::<A>())
        .read(ComponentTypeId::of::<B>());
    collect_matching(store, &query)
}

fn entities_with3<A: Component, B: Component, C: Component>(store: &Store) -> Vec<Ref> {
    let query = engine_component::QueryDescriptor::new()
        .read(ComponentTypeId::of::<A>())
        .read(ComponentTypeId::of::<B>())
        .read(ComponentTypeId::of::<C>());
    collect_matching(store, &query)
}

fn entities_with4<A: Component, B: Component, C: Component, D: Component>(store: &Store) -> Vec<Ref> {
    let query = engine_component::QueryDescriptor::new()
        .read(ComponentTypeId::of::<A>())
        .read(ComponentTypeId::of::<B>())
        .read(ComponentTypeId::of::<C>())
        .read(ComponentTypeId::of::<D>());
    collect_matching(store, &query)
}

fn collect_matching(store: &Store, query: &engine_component::QueryDescriptor) -> Vec<Ref> {
    store
        .archetypes_matching(query)
        .flat_map(|table| table.chunks.iter().flat_map(|chunk| chunk.entities.iter().copied()))
        .collect()
}

#[cfg(test)]
mod tests {
    use engine_component::RawComponent;

    use super::*;
    use crate::collision::NoCollisionModule;

    #[test]
    fn test_gravity_integration_moves_non_resting_entity() {
        let mut store = Store::new();
        let entity = store.spawn(vec![
            RawComponent::of(Transform3D::IDENTITY),
            RawComponent::of(Velocity::ZERO),
            RawComponent::of(PhysicsValues::new(1.0)),
        ]);
        let system = GravityIntegrationSystem {
            gravity: Vec3::new(0.0, -10.0, 0.0),
        };
        let mut buffer = CommandBuffer::new();
        system.run(&store, &mut buffer, 0.1);
        let mut buffers = [buffer];
        store.apply_commands(&mut buffers);
        let velocity = store.get_component::<Velocity>(entity).unwrap();
        assert!(velocity.linear.y < 0.0);
    }

    #[test]
    fn test_resting_entity_is_skipped() {
        let mut store = Store::new();
        let mut values = PhysicsValues::new(1.0);
        values.resting = true;
        let entity = store.spawn(vec![
            RawComponent::of(Transform3D::IDENTITY),
            RawComponent::of(Velocity::ZERO),
            RawComponent::of(values),
        ]);
        let system = GravityIntegrationSystem {
            gravity: Vec3::new(0.0, -10.0, 0.0),
        };
        let mut buffer = CommandBuffer::new();
        system.run(&store, &mut buffer, 0.1);
        assert!(buffer.is_empty());
        let _ = entity;
    }

    #[test]
    fn test_unstick_nudges_embedded_item() {
        let mut store = Store::new();
        let entity = store.spawn(vec![
            RawComponent::of(ItemComponent::new("dirt", 1)),
            RawComponent::of(Transform3D::IDENTITY),
            RawComponent::of(BoundingBox::cube(0.5)),
        ]);
        struct AlwaysOverlapping;
        impl CollisionModule for AlwaysOverlapping {
            fn sweep(&self, _m: Ref, _b: &BoundingBox, _from: Vec3, _to: Vec3) -> Option<crate::collision::SweepHit> {
                None
            }
            fn resolve_overlap(&self, _bounds: &BoundingBox, _position: Vec3) -> Option<Vec3> {
                Some(Vec3::new(0.0, 1.0, 0.0))
            }
        }
        let system = UnstickSystem { collision: Arc::new(AlwaysOverlapping) };
        let mut buffer = CommandBuffer::new();
        system.run(&store, &mut buffer, 0.1);
        let mut buffers = [buffer];
        store.apply_commands(&mut buffers);
        assert_eq!(store.get_component::<Transform3D>(entity).unwrap().position, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_unstick_leaves_clear_item_untouched() {
        let mut store = Store::new();
        let entity = store.spawn(vec![
            RawComponent::of(ItemComponent::new("dirt", 1)),
            RawComponent::of(Transform3D::IDENTITY),
            RawComponent::of(BoundingBox::cube(0.5)),
        ]);
        let system = UnstickSystem { collision: Arc::new(NoCollisionModule) };
        let mut buffer = CommandBuffer::new();
        system.run(&store, &mut buffer, 0.1);
        assert!(buffer.is_empty());
        let _ = entity;
    }

    #[test]
    fn test_pickup_interpolation_completes_and_drops_component() {
        let mut store = Store::new();
        let holder = store.spawn(vec![RawComponent::of(Transform3D::from_position(Vec3::new(10.0, 0.0, 0.0)))]);
        let item = store.spawn(vec![
            RawComponent::of(Transform3D::IDENTITY),
            RawComponent::of(PickupItemComponent { holder, progress: 0.95 }),
        ]);
        let system = PickupInterpolationSystem { speed: 10.0 };
        let mut buffer = CommandBuffer::new();
        system.run(&store, &mut buffer, 0.1);
        let mut buffers = [buffer];
        store.apply_commands(&mut buffers);
        assert!(store.get_component::<PickupItemComponent>(item).is_none());
    }

    #[test]
    fn test_collision_resolution_zeroes_velocity_below_threshold() {
        let mut store = Store::new();
        let entity = store.spawn(vec![
            RawComponent::of(Transform3D::IDENTITY),
            RawComponent::of(Velocity::linear(Vec3::new(0.0, -0.01, 0.0))),
            RawComponent::of(PhysicsValues::new(1.0)),
            RawComponent::of(BoundingBox::cube(0.5)),
        ]);
        struct AlwaysHit;
        impl CollisionModule for AlwaysHit {
            fn sweep(&self, _m: Ref, _b: &BoundingBox, from: Vec3, to: Vec3) -> Option<crate::collision::SweepHit> {
                Some(crate::collision::SweepHit { t: 0.0, normal: Vec3::Y, entity: None, hit_zone: None })
            }
        }
        let system = CollisionResolutionSystem {
            collision: Arc::new(AlwaysHit),
            rest_speed_threshold: 0.1,
        };
        let mut buffer = CommandBuffer::new();
        system.run(&store, &mut buffer, 0.1);
        let mut buffers = [buffer];
        store.apply_commands(&mut buffers);
        assert!(store.get_component::<PhysicsValues>(entity).unwrap().resting);
    }

    #[test]
    fn test_no_collision_never_marks_resting() {
        let collision = NoCollisionModule;
        assert!(collision.sweep(Ref::from_parts(0, 0), &BoundingBox::cube(1.0), Vec3::ZERO, Vec3::ONE).is_none());
    }

    struct AllSpatial(std::sync::Mutex<Vec<Ref>>);
    impl SpatialResource for AllSpatial {
        fn nearby(&self, _center: Vec3, _radius: f32) -> Vec<Ref> {
            self.0.lock().unwrap().clone()
        }
    }

    #[test]
    fn test_interactable_item_is_excluded_from_merge() {
        let mut store = Store::new();
        let assets = Arc::new(AssetRegistry::new());
        assets.register(
            "wood_plank",
            ItemDescriptor {
                max_stack_size: 64,
                merge_radius: 1.0,
                pickup_delay_seconds: 0.0,
            },
        );
        let claimed = store.spawn(vec![
            RawComponent::of(Transform3D::IDENTITY),
            RawComponent::of(ItemComponent::new("wood_plank", 1)),
            RawComponent::of(Interactable),
        ]);
        let free = store.spawn(vec![
            RawComponent::of(Transform3D::IDENTITY),
            RawComponent::of(ItemComponent::new("wood_plank", 1)),
        ]);
        let spatial = Arc::new(AllSpatial(std::sync::Mutex::new(vec![claimed, free])));
        let system = ItemMergeSystem { spatial, assets };
        let mut buffer = CommandBuffer::new();
        system.run(&store, &mut buffer, 0.1);
        assert!(buffer.is_empty(), "an Interactable item must never be absorbed or absorb another stack");
    }
}
