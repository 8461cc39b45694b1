//! Opaque outbound packets.
//!
//! Wire-format framing (field tables, delta encoding, compression) is a
//! client/transport concern this crate does not define — `Packet` only
//! carries an already-encoded payload plus the routing metadata the server
//! side needs to decide *who* receives it.

use engine_component::Ref;
use serde::{Deserialize, Serialize};

use crate::error::NetError;

/// A single outbound message, already encoded for transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Packet {
    /// A tag identifying the payload's shape to the receiving client. Opaque
    /// to the server beyond routing/logging — not interpreted here.
    pub kind: String,
    /// MessagePack-encoded payload bytes.
    pub payload: Vec<u8>,
}

impl Packet {
    /// Encode `value` as a named-MessagePack payload tagged with `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Encode`] if serialisation fails.
    pub fn encode<T: Serialize>(kind: impl Into<String>, value: &T) -> Result<Self, NetError> {
        Ok(Self {
            kind: kind.into(),
            payload: crate::codec::encode(value)?,
        })
    }

    /// Decode the payload as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Decode`] if deserialisation fails.
    pub fn decode<'a, T: Deserialize<'a>>(&'a self) -> Result<T, NetError> {
        crate::codec::decode(&self.payload)
    }
}

/// A packet plus the entity it concerns, for interest-filtered fan-out
/// (see [`crate::viewer::EntityViewer`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityPacket {
    /// The entity this packet's content is about (e.g. the entity whose
    /// component changed), used to test viewer visibility before sending.
    pub subject: Ref,
    pub packet: Packet,
}
