//! Buffers client-supplied data for interactions whose `first_run` can't
//! execute until it arrives (see
//! [`crate::interaction::WaitForData::Client`]), and expires buffered
//! requests that sit unanswered past a bounded window instead of holding
//! them forever.

use std::collections::HashMap;
use std::sync::Mutex;

use engine_component::{CommandBuffer, Ref};
use engine_damage::collaborators::InteractionCanceller;

use crate::error::InteractionError;
use crate::projectile::ClientAimData;

/// A pending interaction request, keyed by entity and waiting for the
/// client packet that carries its `ClientAimData`.
struct Pending {
    ticks_waited: u32,
}

#[derive(Default)]
struct State {
    pending: HashMap<Ref, Pending>,
    arrived: HashMap<Ref, ClientAimData>,
}

/// Tracks in-flight client-data requests across ticks and expires any that
/// go unanswered past `max_wait_ticks`.
///
/// One `InteractionDispatcher` is shared across all `Interaction`
/// registrations that declare `wait_for_data_from() == WaitForData::Client`
/// — the buffering behavior is the same regardless of which interaction is
/// waiting, so it is not duplicated per interaction type. Interior
/// mutability behind a `Mutex` (mirroring `engine_net::RecordingOutbox`)
/// lets it double as an `Arc<dyn InteractionCanceller>` collaborator for the
/// death/respawn chain's `ClearInteractions` step, which only has `&self`.
pub struct InteractionDispatcher {
    max_wait_ticks: u32,
    state: Mutex<State>,
}

impl InteractionDispatcher {
    #[must_use]
    pub fn new(max_wait_ticks: u32) -> Self {
        Self {
            max_wait_ticks,
            state: Mutex::new(State::default()),
        }
    }

    /// Register that `entity` is waiting on client data for a
    /// `WaitForData::Client` interaction. Idempotent: re-requesting an
    /// already-pending entity does not reset its wait clock.
    pub fn await_client_data(&self, entity: Ref) {
        self.state.lock().unwrap().pending.entry(entity).or_insert(Pending { ticks_waited: 0 });
    }

    /// Feed in a client packet's aim data, satisfying a pending request for
    /// `entity` if one exists. A reply for an entity with no pending
    /// request is ignored — the client spoke too late, too early, or about
    /// something the dispatcher never asked for.
    pub fn receive_client_data(&self, entity: Ref, data: ClientAimData) {
        let mut state = self.state.lock().unwrap();
        if state.pending.remove(&entity).is_some() {
            state.arrived.insert(entity, data);
        }
    }

    /// Take the arrived data for `entity`, if any, clearing it from the
    /// buffer. Call this once per tick from the system that drives
    /// `first_run`.
    pub fn take_arrived(&self, entity: Ref) -> Option<ClientAimData> {
        self.state.lock().unwrap().arrived.remove(&entity)
    }

    /// Returns `Ok(())` if `entity` has neither an open request nor expired
    /// data, `Err(AwaitingClientData)` while still within the wait window,
    /// or `Err(ClientDataExpired)` once the window has elapsed. Advances
    /// every still-pending entry's wait clock by one tick as a side effect,
    /// so call this at most once per entity per tick.
    pub fn poll(&self, entity: Ref) -> Result<(), InteractionError> {
        let mut state = self.state.lock().unwrap();
        let Some(slot) = state.pending.get_mut(&entity) else {
            return Ok(());
        };
        if slot.ticks_waited >= self.max_wait_ticks {
            state.pending.remove(&entity);
            return Err(InteractionError::ClientDataExpired);
        }
        slot.ticks_waited += 1;
        Err(InteractionError::AwaitingClientData)
    }

    /// Number of entities currently waiting on client data.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.state.lock().unwrap().pending.len()
    }
}

impl InteractionCanceller for InteractionDispatcher {
    /// Drops any client-data wait and any arrived-but-unconsumed data for
    /// `entity`. Called by the death chain's `ClearInteractions` step and
    /// the respawn chain's matching step; neither needs the `buffer`, since
    /// cancelling a wait is pure dispatcher bookkeeping, not a store mutation.
    fn cancel_interactions(&self, entity: Ref, _buffer: &mut CommandBuffer) {
        let mut state = self.state.lock().unwrap();
        state.pending.remove(&entity);
        state.arrived.remove(&entity);
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};

    use super::*;

    fn aim() -> ClientAimData {
        ClientAimData { position: Vec3::ZERO, rotation: Quat::IDENTITY }
    }

    #[test]
    fn test_await_then_receive_then_take() {
        let entity = Ref::from_parts(1, 0);
        let dispatcher = InteractionDispatcher::new(5);
        dispatcher.await_client_data(entity);
        assert_eq!(dispatcher.pending_count(), 1);
        dispatcher.receive_client_data(entity, aim());
        assert_eq!(dispatcher.pending_count(), 0);
        assert_eq!(dispatcher.take_arrived(entity), Some(aim()));
        assert_eq!(dispatcher.take_arrived(entity), None);
    }

    #[test]
    fn test_unrequested_client_data_is_ignored() {
        let entity = Ref::from_parts(1, 0);
        let dispatcher = InteractionDispatcher::new(5);
        dispatcher.receive_client_data(entity, aim());
        assert_eq!(dispatcher.take_arrived(entity), None);
    }

    #[test]
    fn test_poll_returns_awaiting_within_window() {
        let entity = Ref::from_parts(1, 0);
        let dispatcher = InteractionDispatcher::new(2);
        dispatcher.await_client_data(entity);
        assert_eq!(dispatcher.poll(entity), Err(InteractionError::AwaitingClientData));
        assert_eq!(dispatcher.poll(entity), Err(InteractionError::AwaitingClientData));
    }

    #[test]
    fn test_poll_expires_past_window() {
        let entity = Ref::from_parts(1, 0);
        let dispatcher = InteractionDispatcher::new(1);
        dispatcher.await_client_data(entity);
        assert_eq!(dispatcher.poll(entity), Err(InteractionError::AwaitingClientData));
        assert_eq!(dispatcher.poll(entity), Err(InteractionError::ClientDataExpired));
        assert_eq!(dispatcher.pending_count(), 0);
    }

    #[test]
    fn test_poll_on_unrequested_entity_is_ok() {
        let entity = Ref::from_parts(1, 0);
        let dispatcher = InteractionDispatcher::new(5);
        assert_eq!(dispatcher.poll(entity), Ok(()));
    }

    #[test]
    fn test_cancel_interactions_clears_pending_and_arrived() {
        let entity = Ref::from_parts(1, 0);
        let dispatcher = InteractionDispatcher::new(5);
        dispatcher.await_client_data(entity);
        let mut buffer = CommandBuffer::new();
        dispatcher.cancel_interactions(entity, &mut buffer);
        assert_eq!(dispatcher.pending_count(), 0);
        assert_eq!(dispatcher.poll(entity), Ok(()));
    }
}
