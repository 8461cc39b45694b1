//! The [`Interaction`] contract and the dispatch verdict shape that
//! replaces mutable, cancellable event objects (see the crate's design
//! notes on `ICancellable`-style sources): handlers never mutate a shared
//! event in place, they return their verdict and dispatch short-circuits
//! on anything but `Continue`.

use engine_component::Ref;

/// Where an interaction's `first_run` data must come from before it can
/// execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitForData {
    /// No external data needed; `first_run` can execute immediately.
    None,
    /// Must wait for a client packet carrying the data (e.g. aim position
    /// and rotation) before `first_run` can execute.
    Client,
}

/// What a single listener in a dispatch chain decided.
///
/// `Continue` lets the next listener run; `Cancel` and `Redirect`
/// short-circuit the chain. This is the immutable alternative to a listener
/// flipping a shared `cancelled` flag on a mutable event object.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerResult {
    Continue,
    Cancel { reason: String },
    Redirect { target: Ref },
}

impl HandlerResult {
    #[must_use]
    pub fn is_continue(&self) -> bool {
        matches!(self, HandlerResult::Continue)
    }
}

/// Run `handlers` in priority order, stopping at the first non-`Continue`
/// result. Returns that result, or `Continue` if every handler continued.
#[must_use]
pub fn dispatch_chain(handlers: &[HandlerResult]) -> HandlerResult {
    for result in handlers {
        if !result.is_continue() {
            return result.clone();
        }
    }
    HandlerResult::Continue
}

/// A reusable, data-defined action a client can trigger.
///
/// Interactions carry no mutable state of their own — per-invocation state
/// (cooldowns, buffered client data) lives in whatever the dispatcher keeps
/// alongside the registration, not on the `Interaction` value itself, so one
/// `Interaction` instance is shared across every entity that can perform it.
pub trait Interaction: Send + Sync {
    fn name(&self) -> &str;

    /// Whether `first_run` needs externally-supplied data before it can
    /// execute. Defaults to none.
    fn wait_for_data_from(&self) -> WaitForData {
        WaitForData::None
    }
}
