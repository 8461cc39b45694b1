//! # engine_net
//!
//! The client-facing boundary: packet encoding, interest filtering, and
//! outbound dispatch. Connection bring-up, session management, and wire
//! framing live outside this crate — this is the seam game systems call
//! through, not a transport implementation.
//!
//! This crate provides:
//!
//! - [`codec`] — MessagePack serialisation/deserialisation helpers.
//! - [`packet`] — [`Packet`], an opaque already-encoded outbound payload.
//! - [`viewer`] — [`EntityViewer`], interest/visibility filtering.
//! - [`outbox`] — [`PacketOutbox`], the send/broadcast seam.
//! - [`error`] — boundary error types.

pub mod codec;
pub mod error;
pub mod outbox;
pub mod packet;
pub mod viewer;

pub use codec::{decode, encode};
pub use error::NetError;
pub use outbox::{PacketOutbox, RecordingOutbox};
pub use packet::{EntityPacket, Packet};
pub use viewer::{EntityViewer, OmniscientViewer};
