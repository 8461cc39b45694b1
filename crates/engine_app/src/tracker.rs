//! `TrackerQueueUpdate` group: the projectile prediction signal.
//!
//! Purely a networking hook — detects each viewer→projectile pair that
//! becomes newly visible and tells that client to start reconciling its
//! local prediction against the server's copy. Never touches the store.

use std::sync::Arc;

use dashmap::DashSet;
use engine_component::{ComponentTypeId, Ref, Store};
use engine_damage::collaborators::ConnectionDirectory;
use engine_net::{EntityViewer, Packet, PacketOutbox};
use engine_physics::PredictedProjectile;
use engine_system::System;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BeginPredictionMessage {
    projectile: Ref,
    prediction_id: Uuid,
}

/// Tracks which (viewer, projectile) pairs have already been told to begin
/// prediction, so the packet fires once per pair rather than every tick the
/// projectile stays visible.
pub struct EntityTrackerUpdateSystem {
    pub outbox: Arc<dyn PacketOutbox>,
    pub viewer: Arc<dyn EntityViewer>,
    pub connections: Arc<dyn ConnectionDirectory>,
    seen: DashSet<(Ref, Ref)>,
}

impl EntityTrackerUpdateSystem {
    #[must_use]
    pub fn new(outbox: Arc<dyn PacketOutbox>, viewer: Arc<dyn EntityViewer>, connections: Arc<dyn ConnectionDirectory>) -> Self {
        Self {
            outbox,
            viewer,
            connections,
            seen: DashSet::new(),
        }
    }
}

impl System for EntityTrackerUpdateSystem {
    fn name(&self) -> &str {
        "EntityTrackerUpdate"
    }

    fn run(&self, store: &Store, _buffer: &mut engine_component::CommandBuffer, _dt: f64) {
        let query = engine_component::QueryDescriptor::new().read(ComponentTypeId::of::<PredictedProjectile>());
        let projectiles: Vec<Ref> = store
            .archetypes_matching(&query)
            .flat_map(|table| table.chunks.iter().flat_map(|chunk| chunk.entities.iter().copied()))
            .collect();

        self.seen.retain(|(_, projectile)| store.is_alive(*projectile));

        let connections = self.connections.all_connections();
        for projectile in projectiles {
            let prediction = store.get_component::<PredictedProjectile>(projectile).unwrap();
            for &conn in &connections {
                if !self.viewer.is_visible(conn, projectile) {
                    continue;
                }
                if !self.seen.insert((conn, projectile)) {
                    continue;
                }
                if let Ok(packet) = Packet::encode(
                    "begin_prediction",
                    &BeginPredictionMessage {
                        projectile,
                        prediction_id: prediction.prediction_id,
                    },
                ) {
                    self.outbox.send(conn, packet);
                }
            }
        }
    }
}
