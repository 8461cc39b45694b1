//! Fluid submersion tracking for general (non-projectile) bodies.
//!
//! `StandardPhysicsProvider` computes submersion for projectiles inline;
//! this module gives the same treatment to any entity with a
//! `BoundingBox` — chiefly players, whose `Swimming` flag the drowning
//! damage system (`engine_damage::gather::DrowningDamageSystem`) reads.

use engine_component::{Component, CommandBuffer, ComponentTypeId, Ref, Store};
use engine_math::Transform3D;
use engine_system::System;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::bounding_box::BoundingBox;
use crate::collision::{submerged_fraction, FluidVolume};

/// Present on an entity whose bounding box is submerged past
/// [`FluidSubmersionSystem::fully_submerged_threshold`]. Removed once the
/// entity surfaces.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Swimming {
    pub submerged_fraction: f32,
}

impl Component for Swimming {
    fn type_name() -> &'static str {
        "Swimming"
    }
}

/// Computes submersion fraction from world fluid geometry and adds/removes
/// [`Swimming`] accordingly. Runs in `PrePhysics`, before gravity/collision
/// and before `GatherDamage`'s drowning check reads the flag.
pub struct FluidSubmersionSystem {
    pub fluid: Arc<dyn FluidVolume>,
    /// Fraction at or above which an entity counts as fully submerged.
    pub fully_submerged_threshold: f32,
}

impl System for FluidSubmersionSystem {
    fn name(&self) -> &str {
        "FluidSubmersion"
    }

    fn run(&self, store: &Store, buffer: &mut CommandBuffer, _dt: f64) {
        let query = engine_component::QueryDescriptor::new()
            .read(ComponentTypeId::of::<Transform3D>())
            .read(ComponentTypeId::of::<BoundingBox>());
        let entities: Vec<Ref> = store
            .archetypes_matching(&query)
            .flat_map(|table| table.chunks.iter().flat_map(|chunk| chunk.entities.iter().copied()))
            .collect();

        for entity in entities {
            let transform = store.get_component::<Transform3D>(entity).unwrap();
            let bounds = store.get_component::<BoundingBox>(entity).unwrap();
            let fraction = self
                .fluid
                .surface_level(transform.position)
                .map_or(0.0, |level| submerged_fraction(bounds, transform.position, level));

            let swimming_type = ComponentTypeId::of::<Swimming>();
            if fraction >= self.fully_submerged_threshold {
                buffer.set_component(entity, Swimming { submerged_fraction: fraction });
            } else if store.get_component_raw(entity, swimming_type).is_some() {
                buffer.remove_component(entity, swimming_type);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use engine_component::RawComponent;
    use glam::Vec3;

    use super::*;
    use crate::collision::NoFluidVolume;

    struct FixedSurface(f32);
    impl FluidVolume for FixedSurface {
        fn surface_level(&self, _position: Vec3) -> Option<f32> {
            Some(self.0)
        }
    }

    #[test]
    fn test_fully_submerged_entity_gains_swimming() {
        let mut store = Store::new();
        let entity = store.spawn(vec![
            RawComponent::of(Transform3D::from_position(Vec3::new(0.0, -5.0, 0.0))),
            RawComponent::of(BoundingBox::cube(0.5)),
        ]);
        let system = FluidSubmersionSystem {
            fluid: Arc::new(FixedSurface(0.0)),
            fully_submerged_threshold: 0.9,
        };
        let mut buffer = CommandBuffer::new();
        system.run(&store, &mut buffer, 0.05);
        let mut buffers = [buffer];
        store.apply_commands(&mut buffers);
        assert!(store.get_component::<Swimming>(entity).is_some());
    }

    #[test]
    fn test_dry_entity_has_no_swimming() {
        let mut store = Store::new();
        let entity = store.spawn(vec![
            RawComponent::of(Transform3D::from_position(Vec3::new(0.0, 50.0, 0.0))),
            RawComponent::of(BoundingBox::cube(0.5)),
        ]);
        let system = FluidSubmersionSystem {
            fluid: Arc::new(NoFluidVolume),
            fully_submerged_threshold: 0.9,
        };
        let mut buffer = CommandBuffer::new();
        system.run(&store, &mut buffer, 0.05);
        let mut buffers = [buffer];
        store.apply_commands(&mut buffers);
        assert!(store.get_component::<Swimming>(entity).is_none());
    }

    #[test]
    fn test_surfacing_removes_swimming() {
        let mut store = Store::new();
        let entity = store.spawn(vec![
            RawComponent::of(Transform3D::from_position(Vec3::new(0.0, 50.0, 0.0))),
            RawComponent::of(BoundingBox::cube(0.5)),
            RawComponent::of(Swimming { submerged_fraction: 1.0 }),
        ]);
        let system = FluidSubmersionSystem {
            fluid: Arc::new(NoFluidVolume),
            fully_submerged_threshold: 0.9,
        };
        let mut buffer = CommandBuffer::new();
        system.run(&store, &mut buffer, 0.05);
        let mut buffers = [buffer];
        store.apply_commands(&mut buffers);
        assert!(store.get_component::<Swimming>(entity).is_none());
    }
}
