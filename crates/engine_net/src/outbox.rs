//! Outbound packet dispatch.
//!
//! A [`PacketOutbox`] is the seam between game systems and whatever owns
//! client connections (session management, the real transport) — systems
//! call `send`/`broadcast`, never touch a socket.

use std::sync::Mutex;

use engine_component::Ref;

use crate::packet::Packet;
use crate::viewer::EntityViewer;

/// Sends packets to connected clients, filtered by entity visibility.
pub trait PacketOutbox: Send + Sync {
    /// Send `packet` to the single connection behind `target`, if known.
    fn send(&self, target: Ref, packet: Packet);

    /// Send `packet` to every connection for which `viewer.is_visible(conn,
    /// subject)` holds.
    fn broadcast_to_viewers(&self, subject: Ref, packet: Packet, viewer: &dyn EntityViewer, connections: &[Ref]) {
        for &conn in connections {
            if viewer.is_visible(conn, subject) {
                self.send(conn, packet.clone());
            }
        }
    }
}

/// An in-memory outbox that records every send instead of transmitting it.
/// Used by tests and as the default before a real connection layer is wired
/// in.
#[derive(Default)]
pub struct RecordingOutbox {
    sent: Mutex<Vec<(Ref, Packet)>>,
}

impl RecordingOutbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn drain(&self) -> Vec<(Ref, Packet)> {
        std::mem::take(&mut self.sent.lock().unwrap())
    }
}

impl PacketOutbox for RecordingOutbox {
    fn send(&self, target: Ref, packet: Packet) {
        self.sent.lock().unwrap().push((target, packet));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::OmniscientViewer;

    #[test]
    fn test_recording_outbox_records_sends() {
        let outbox = RecordingOutbox::new();
        let packet = Packet::encode("ping", &7u32).unwrap();
        outbox.send(Ref::from_parts(1, 0), packet);
        let sent = outbox.drain();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, Ref::from_parts(1, 0));
    }

    #[test]
    fn test_broadcast_to_viewers_respects_visibility() {
        struct NoneVisible;
        impl EntityViewer for NoneVisible {
            fn is_visible(&self, _viewer: Ref, _subject: Ref) -> bool {
                false
            }
        }

        let outbox = RecordingOutbox::new();
        let packet = Packet::encode("ping", &7u32).unwrap();
        let connections = vec![Ref::from_parts(1, 0), Ref::from_parts(2, 0)];

        outbox.broadcast_to_viewers(Ref::from_parts(9, 0), packet.clone(), &NoneVisible, &connections);
        assert!(outbox.drain().is_empty());

        outbox.broadcast_to_viewers(Ref::from_parts(9, 0), packet, &OmniscientViewer, &connections);
        assert_eq!(outbox.drain().len(), 2);
    }
}
