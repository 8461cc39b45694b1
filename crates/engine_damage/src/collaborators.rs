//! Collaborator traits the death/respawn chain invokes but does not itself
//! implement — interactions, broken-item checks, connection fan-out, and
//! the respawn placement decision all live outside this crate. Each trait
//! ships a trivial reference implementation so the chain is runnable and
//! testable standalone.

use engine_assets::DamageCause;
use engine_component::{CommandBuffer, Ref, Store};

/// Cancels any interaction(s) in progress for an entity. Implemented by the
/// interaction dispatcher; `ClearInteractions` calls this on death and
/// respawn alike.
pub trait InteractionCanceller: Send + Sync {
    fn cancel_interactions(&self, entity: Ref, buffer: &mut CommandBuffer);
}

/// Runs whatever interactions are configured to fire on an entity's death
/// (explosion triggers, scripted events).
pub trait DeathInteractionRunner: Send + Sync {
    fn run_death_interactions(&self, entity: Ref, cause: DamageCause, store: &Store, buffer: &mut CommandBuffer);
}

/// One item stack to drop at the death position.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDrop {
    pub item_id: String,
    pub quantity: u32,
}

/// Computes what a dying entity drops. Split from the system that spawns
/// the dropped item entities per §4.6's "config first computes what drops,
/// drop system spawns item entities" ordering.
pub trait DeathDropConfig: Send + Sync {
    fn compute_drops(&self, entity: Ref, store: &Store) -> Vec<ItemDrop>;
}

/// Checks whether any of an entity's items were marked broken by death and
/// should be removed rather than restored on respawn.
pub trait BrokenItemChecker: Send + Sync {
    fn clear_broken_items(&self, entity: Ref, store: &Store, buffer: &mut CommandBuffer);
}

/// Relocates and re-enables a player entity on respawn. The final step of
/// the respawn chain, invoked after every other handler has reset state.
pub trait RespawnController: Send + Sync {
    fn respawn(&self, entity: Ref, store: &Store, buffer: &mut CommandBuffer);
}

/// Directory of currently-connected entities, for broadcast-style handlers
/// (kill feed) that need the full connection list rather than a single
/// target.
pub trait ConnectionDirectory: Send + Sync {
    fn all_connections(&self) -> Vec<Ref>;
}

/// No interactions to cancel, run, or compute drops for. Used by tests and
/// as the default before the interaction/inventory crates are wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCollaborators;

impl InteractionCanceller for NullCollaborators {
    fn cancel_interactions(&self, _entity: Ref, _buffer: &mut CommandBuffer) {}
}

impl DeathInteractionRunner for NullCollaborators {
    fn run_death_interactions(&self, _entity: Ref, _cause: DamageCause, _store: &Store, _buffer: &mut CommandBuffer) {}
}

impl DeathDropConfig for NullCollaborators {
    fn compute_drops(&self, _entity: Ref, _store: &Store) -> Vec<ItemDrop> {
        Vec::new()
    }
}

impl BrokenItemChecker for NullCollaborators {
    fn clear_broken_items(&self, _entity: Ref, _store: &Store, _buffer: &mut CommandBuffer) {}
}

impl ConnectionDirectory for NullCollaborators {
    fn all_connections(&self) -> Vec<Ref> {
        Vec::new()
    }
}

/// Respawns the entity in place, at whatever position it already occupies.
/// A real deployment resolves a spawn point (bed, world spawn, team base);
/// this is the identity placeholder until that collaborator exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct InPlaceRespawnController;

impl RespawnController for InPlaceRespawnController {
    fn respawn(&self, _entity: Ref, _store: &Store, _buffer: &mut CommandBuffer) {}
}
