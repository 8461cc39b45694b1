//! Axis-aligned bounding box component.

use engine_component::Component;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// An axis-aligned box centered on the entity's `Transform3D` position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub half_extents: Vec3,
}

impl BoundingBox {
    #[must_use]
    pub fn cube(half_extent: f32) -> Self {
        Self {
            half_extents: Vec3::splat(half_extent),
        }
    }

    /// Returns `true` if this box, centered at `a`, overlaps `other`,
    /// centered at `b`.
    #[must_use]
    pub fn overlaps(&self, a: Vec3, other: &BoundingBox, b: Vec3) -> bool {
        let delta = (a - b).abs();
        let combined = self.half_extents + other.half_extents;
        delta.x <= combined.x && delta.y <= combined.y && delta.z <= combined.z
    }

    /// Distance between the two centers, ignoring box extents — used for
    /// merge-radius checks where the radius already accounts for size.
    #[must_use]
    pub fn center_distance(a: Vec3, b: Vec3) -> f32 {
        a.distance(b)
    }
}

impl Component for BoundingBox {
    fn type_name() -> &'static str {
        "BoundingBox"
    }
}
