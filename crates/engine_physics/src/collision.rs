//! Collision and spatial-query collaborator seams.
//!
//! The actual broadphase/narrowphase (voxel grid raycasts, chunk geometry)
//! lives outside this crate entirely — these traits are the interface
//! physics systems call through, with the real implementation supplied by
//! whatever owns world geometry.

use engine_component::Ref;
use glam::Vec3;

use crate::bounding_box::BoundingBox;

/// The result of sweeping a bounding box from one point to another.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepHit {
    /// Fraction of the `from..to` movement at which the hit occurred, in `[0, 1]`.
    pub t: f32,
    /// Surface normal at the hit point.
    pub normal: Vec3,
    /// The entity that was hit, or `None` for static world geometry.
    pub entity: Option<Ref>,
    /// The named hit region on `entity` (e.g. `"head"`), if the collision
    /// module tracks sub-entity zones. Always `None` for world geometry.
    pub hit_zone: Option<String>,
}

/// Resolves collisions for moving bounded volumes against world geometry
/// and other entities.
pub trait CollisionModule: Send + Sync {
    /// Sweep `bounds` from `from` to `to`, returning the first hit (if any).
    fn sweep(&self, mover: Ref, bounds: &BoundingBox, from: Vec3, to: Vec3) -> Option<SweepHit>;

    /// If `bounds` centered at `position` overlaps solid world geometry,
    /// the smallest-magnitude displacement that would move it clear of the
    /// overlap. `None` if `position` is already clear.
    ///
    /// Default implementation reports no overlap — only a collision module
    /// backed by real voxel geometry can answer this precisely.
    fn resolve_overlap(&self, _bounds: &BoundingBox, _position: Vec3) -> Option<Vec3> {
        None
    }
}

/// Answers spatial proximity queries (used for item merging, explosion
/// radius, etc.) independent of collision resolution.
pub trait SpatialResource: Send + Sync {
    /// Entities within `radius` of `center`, excluding none by default.
    fn nearby(&self, center: Vec3, radius: f32) -> Vec<Ref>;
}

/// A collision module that never reports a hit. Useful for tests and for
/// entities that should pass through world geometry (ghost items, debug
/// spawns).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCollisionModule;

impl CollisionModule for NoCollisionModule {
    fn sweep(&self, _mover: Ref, _bounds: &BoundingBox, _from: Vec3, _to: Vec3) -> Option<SweepHit> {
        None
    }
}

/// A spatial resource that never reports neighbors. Placeholder until a
/// real spatial index is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptySpatialResource;

impl SpatialResource for EmptySpatialResource {
    fn nearby(&self, _center: Vec3, _radius: f32) -> Vec<Ref> {
        Vec::new()
    }
}

/// Answers fluid-surface queries for buoyancy and submersion checks. The
/// actual fluid volumes (a lake's surface, a cauldron) live in world
/// geometry outside this crate; this is the seam physics systems call
/// through to find out whether, and how deep, a position is submerged.
pub trait FluidVolume: Send + Sync {
    /// The world-space Y coordinate of the fluid surface at `(x, z)`
    /// projected from `position`, or `None` if `position` is not over any
    /// fluid body.
    fn surface_level(&self, position: Vec3) -> Option<f32>;
}

/// A fluid volume with no fluid anywhere. Placeholder until a real
/// world-geometry fluid index is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFluidVolume;

impl FluidVolume for NoFluidVolume {
    fn surface_level(&self, _position: Vec3) -> Option<f32> {
        None
    }
}

/// Fraction of `bounds` (centered at `position`) that lies below
/// `surface_level`, clamped to `[0, 1]`. `0` means dry; `1` means fully
/// submerged.
#[must_use]
pub fn submerged_fraction(bounds: &BoundingBox, position: Vec3, surface_level: f32) -> f32 {
    let bottom = position.y - bounds.half_extents.y;
    let top = position.y + bounds.half_extents.y;
    let height = top - bottom;
    if height <= 0.0 {
        return if bottom <= surface_level { 1.0 } else { 0.0 };
    }
    let submerged = (surface_level - bottom).clamp(0.0, height);
    submerged / height
}
