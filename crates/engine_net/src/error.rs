//! Network-boundary error types.

/// Errors that can occur while encoding, decoding, or dispatching packets at
/// the client-facing boundary.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// Failed to encode a value to MessagePack.
    #[error("failed to encode packet: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Failed to decode a value from MessagePack.
    #[error("failed to decode packet: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// The target of a send is not known to the outbox (e.g. already
    /// disconnected or never registered).
    #[error("unknown packet target: {0:?}")]
    UnknownTarget(engine_component::Ref),
}
