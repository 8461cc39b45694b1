//! [`ProjectileInteraction`] — the canonical client-authoritative firing
//! action. Buffers the client's aim until it arrives (see
//! [`crate::interaction::WaitForData::Client`]), then resolves a
//! `ProjectileConfig` by string id and spawns the ballistic entity
//! `engine_physics::projectile` simulates from there on.

use engine_assets::{AssetRegistry, ProjectileConfig};
use engine_component::CommandBuffer;
use engine_math::{Transform3D, Velocity};
use engine_physics::{BoundingBox, PhysicsValues, PredictedProjectile};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tracing::warn;

use crate::error::InteractionError;
use crate::interaction::{Interaction, WaitForData};

/// Client-supplied aim state a `ProjectileInteraction` needs before it can
/// fire: the shooter's position and facing at launch time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ClientAimData {
    pub position: Vec3,
    pub rotation: Quat,
}

/// Returned to the dispatcher's outbound sync block so the client can
/// reconcile its local prediction against the server's authoritative shot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ProjectileSyncData {
    pub shooter_transform: Transform3D,
    pub prediction_id: Uuid,
}

/// Fires a ballistic projectile in response to client-supplied aim data.
/// `config_id` names the `ProjectileConfig` to resolve from the
/// `AssetRegistry`, e.g. `"hytale:arrow_standard"`.
pub struct ProjectileInteraction {
    pub config_id: String,
}

impl ProjectileInteraction {
    #[must_use]
    pub fn new(config_id: impl Into<String>) -> Self {
        Self { config_id: config_id.into() }
    }

    /// Resolve the projectile config, compute the muzzle offset and launch
    /// velocity from the client's aim, and emit the projectile's
    /// `createEntity` command.
    ///
    /// Returns the prediction id the caller folds into
    /// [`ProjectileInteraction::simulate_first_run`]'s sync-data reply.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::AssetNotResolved`] if `config_id` is not
    /// registered. The dispatcher must drop the action on this error: no
    /// projectile spawned, no cooldown consumed.
    pub fn first_run(
        &self,
        assets: &AssetRegistry,
        aim: &ClientAimData,
        buffer: &mut CommandBuffer,
    ) -> Result<Uuid, InteractionError> {
        let config = assets.get::<ProjectileConfig>(&self.config_id).ok_or_else(|| {
            warn!(config_id = self.config_id.as_str(), "projectile config not resolved, dropping interaction");
            InteractionError::AssetNotResolved(self.config_id.clone())
        })?;

        let forward = aim.rotation * Vec3::Z;
        let muzzle =
            aim.position + Vec3::Y * config.vertical_center_shot + forward * config.depth_shot;
        let velocity = forward * config.launch_speed;
        let prediction_id = Uuid::new_v4();

        let pending = buffer.create_entity();
        buffer.add_component(pending, Transform3D::from_position_rotation(muzzle, aim.rotation));
        buffer.add_component(pending, Velocity::linear(velocity));
        buffer.add_component(pending, BoundingBox::cube(0.05));
        buffer.add_component(pending, PhysicsValues::new(config.gravity_scale));
        buffer.add_component(pending, PredictedProjectile::new(prediction_id, &config));
        Ok(prediction_id)
    }

    /// Fill the outbound sync-data block: the server's view of the
    /// shooter's transform at launch time, plus the prediction id from
    /// `first_run`. Does not touch world state.
    #[must_use]
    pub fn simulate_first_run(shooter_transform: Transform3D, prediction_id: Uuid) -> ProjectileSyncData {
        ProjectileSyncData { shooter_transform, prediction_id }
    }
}

impl Interaction for ProjectileInteraction {
    fn name(&self) -> &str {
        "ProjectileInteraction"
    }

    fn wait_for_data_from(&self) -> WaitForData {
        WaitForData::Client
    }
}
