//! Errors an interaction can raise back to the dispatcher.
//!
//! None of these unwind the tick. A failed interaction is reported through
//! the usual structured-log channel and the dispatcher drops the action —
//! no world mutation, no cooldown consumed (see §7 of the pipeline design:
//! "asset not resolved" is surfaced, not swallowed, but never tick-abort).

use thiserror::Error;

/// Why an interaction could not run to completion.
#[derive(Debug, Error, PartialEq)]
pub enum InteractionError {
    /// `AssetRegistry` does not have the named config registered.
    #[error("interaction config {0:?} not resolved in asset registry")]
    AssetNotResolved(String),
    /// `wait_for_data_from` names a source whose data has not arrived yet.
    #[error("interaction is still awaiting client-supplied data")]
    AwaitingClientData,
    /// The buffered client data expired before it arrived.
    #[error("client data window expired without a reply")]
    ClientDataExpired,
}
