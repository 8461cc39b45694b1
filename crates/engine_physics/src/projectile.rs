//! Predictive ballistic projectile simulation.
//!
//! A projectile is launched client-side as a prediction (see
//! `engine_interaction`'s `ProjectileInteraction`) and re-simulated
//! server-side under the same deterministic integration so the two agree.
//! [`StandardPhysicsProvider::step`] is that integration: one tick of
//! gravity, a collision sweep, and a bounce-or-impact decision.

use engine_assets::{ProjectileConfig, RotationMode};
use engine_component::{Component, CommandBuffer, Ref};
use engine_math::{Quat, Transform3D, Velocity};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bounding_box::BoundingBox;
use crate::collision::{CollisionModule, SweepHit};
use crate::physics_values::{clamp_velocity, MAX_LINEAR_SPEED};

/// A server-side ballistic projectile tracked against a client prediction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PredictedProjectile {
    /// Correlates this server entity with the client's locally-simulated
    /// prediction of the same shot, so the client can reconcile or discard
    /// its prediction once the server's result arrives.
    pub prediction_id: Uuid,
    pub bounces_remaining: u32,
    pub elapsed_seconds: f32,
}

impl PredictedProjectile {
    #[must_use]
    pub fn new(prediction_id: Uuid, config: &ProjectileConfig) -> Self {
        Self {
            prediction_id,
            bounces_remaining: config.max_bounces,
            elapsed_seconds: 0.0,
        }
    }
}

impl Component for PredictedProjectile {
    fn type_name() -> &'static str {
        "PredictedProjectile"
    }
}

/// Reacts to a projectile bouncing off a surface instead of coming to rest.
/// `buffer` is the projectile's own per-tick `CommandBuffer` — the consumer
/// records any further mutation (spawning an impact decal entity, say)
/// through it rather than touching the store directly.
pub trait BounceConsumer: Send + Sync {
    fn on_bounce(&self, entity: Ref, contact_point: Vec3, buffer: &mut CommandBuffer);
}

/// Reacts to a projectile's final impact (out of bounces, or the first hit
/// for projectiles that never bounce). `hit_entity`/`hit_zone` are populated
/// only for entity contact; both are `None` for a block/world-geometry hit.
/// The consumer decides whether the projectile is destroyed, by recording
/// (or not) a `destroy_entity` into `buffer`.
pub trait ImpactConsumer: Send + Sync {
    fn on_impact(
        &self,
        entity: Ref,
        contact_point: Vec3,
        hit_entity: Option<Ref>,
        hit_zone: Option<&str>,
        buffer: &mut CommandBuffer,
    );
}

/// No-op consumers, used where a caller doesn't care about bounce/impact
/// notifications (tests, projectiles with no gameplay side effects).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullConsumer;
impl BounceConsumer for NullConsumer {
    fn on_bounce(&self, _entity: Ref, _contact_point: Vec3, _buffer: &mut CommandBuffer) {}
}
impl ImpactConsumer for NullConsumer {
    fn on_impact(&self, _entity: Ref, _contact_point: Vec3, _hit_entity: Option<Ref>, _hit_zone: Option<&str>, _buffer: &mut CommandBuffer) {}
}

fn reflect(v: Vec3, normal: Vec3) -> Vec3 {
    v - 2.0 * v.dot(normal) * normal
}

fn rotation_for(mode: RotationMode, velocity: Vec3, fallback: Quat) -> Quat {
    match mode {
        RotationMode::Preserve => fallback,
        RotationMode::AlignToVelocity => {
            if velocity.length_squared() < 1e-8 {
                fallback
            } else {
                Quat::from_rotation_arc(Vec3::Z, velocity.normalize())
            }
        }
    }
}

/// One tick of ballistic integration: gravity, a collision sweep, and
/// bounce/impact resolution.
pub struct StandardPhysicsProvider<'a> {
    pub collision: &'a dyn CollisionModule,
    /// World gravity acceleration (already signed, e.g. `(0, -9.81, 0)`).
    pub gravity: Vec3,
}

impl<'a> StandardPhysicsProvider<'a> {
    /// Advance one tick. Returns the projectile's new transform and
    /// velocity; the caller writes these back through its own
    /// `CommandBuffer`.
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &self,
        entity: Ref,
        transform: Transform3D,
        velocity: Velocity,
        config: &ProjectileConfig,
        projectile: &mut PredictedProjectile,
        dt: f32,
        buffer: &mut CommandBuffer,
        bounce_consumer: &dyn BounceConsumer,
        impact_consumer: &dyn ImpactConsumer,
    ) -> (Transform3D, Velocity) {
        projectile.elapsed_seconds += dt;
        let accel = self.gravity * config.gravity_scale;
        let new_linear = velocity.linear + accel * dt;
        let new_linear = clamp_velocity(new_linear, MAX_LINEAR_SPEED, entity, "ProjectileIntegration");
        let from = transform.position;
        let to = from + new_linear * dt;
        let bounds = BoundingBox::cube(0.05);

        match self.collision.sweep(entity, &bounds, from, to) {
            None => {
                let rotation = rotation_for(config.rotation_mode, new_linear, transform.rotation);
                (
                    Transform3D {
                        position: to,
                        rotation,
                        ..transform
                    },
                    Velocity::linear(new_linear),
                )
            }
            Some(hit) => {
                let hit_position = from + (to - from) * hit.t;
                if projectile.bounces_remaining == 0 {
                    impact_consumer.on_impact(entity, hit_position, hit.entity, hit.hit_zone.as_deref(), buffer);
                    (
                        Transform3D {
                            position: hit_position,
                            ..transform
                        },
                        Velocity::ZERO,
                    )
                } else {
                    projectile.bounces_remaining -= 1;
                    bounce_consumer.on_bounce(entity, hit_position, buffer);
                    let reflected = reflect(new_linear, hit.normal) * config.bounce_restitution;
                    let reflected = clamp_velocity(reflected, MAX_LINEAR_SPEED, entity, "ProjectileBounce");
                    let rotation = rotation_for(config.rotation_mode, reflected, transform.rotation);
                    (
                        Transform3D {
                            position: hit_position,
                            rotation,
                            ..transform
                        },
                        Velocity::linear(reflected),
                    )
                }
            }
        }
    }
}
