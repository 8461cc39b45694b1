//! Entity reference type.
//!
//! A [`Ref`] is a lightweight `(index, generation)` handle with no inherent
//! data. Refs are allocated by a [`crate::store::Store`], which is the sole
//! source of truth for entity identity and liveness.

use serde::{Deserialize, Serialize};

/// A stable entity handle: an index into the store's slot table plus the
/// generation of that slot at allocation time.
///
/// A `Ref` is valid iff its `generation` matches the store's current
/// generation for `index`. Destroying an entity bumps the slot's generation,
/// so any `Ref` copies made before the destruction become permanently stale
/// — they compare unequal to a freshly allocated ref at the same index, and
/// every store accessor returns a none-equivalent for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ref {
    index: u32,
    generation: u32,
}

impl Ref {
    /// The null / invalid ref sentinel. Never returned by [`crate::store::Store::spawn`].
    pub const INVALID: Ref = Ref {
        index: u32::MAX,
        generation: 0,
    };

    /// Construct a ref from raw parts. Only [`crate::store::Store`] should call
    /// this in normal operation; exposed for serialisation round-trips and tests.
    #[must_use]
    pub const fn from_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The slot index this ref points at.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// The generation recorded at allocation time.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Returns `true` if this is not the [`Ref::INVALID`] sentinel.
    ///
    /// This only checks the sentinel value — it cannot tell a stale ref from
    /// a live one on its own. Use [`crate::store::Store::is_alive`] for that.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.index != u32::MAX
    }
}

impl std::fmt::Display for Ref {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ref({}#{})", self.index, self.generation)
    }
}

impl Default for Ref {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Generation value reserved to mark a [`Ref`] as a command-buffer-local
/// reservation rather than a real store slot. `Store` generations never
/// reach this value in practice (it would require `u32::MAX` destructions
/// of a single slot), so it is safe to use as a tag.
pub(crate) const PENDING_GENERATION: u32 = u32::MAX;

impl Ref {
    /// Construct a pending ref: a placeholder for an entity that a
    /// [`crate::command_buffer::CommandBuffer`] has recorded a `createEntity`
    /// for, but that does not yet have a real store slot. Resolved to a real
    /// `Ref` during the sync phase.
    pub(crate) const fn pending(local_index: u32) -> Self {
        Self {
            index: local_index,
            generation: PENDING_GENERATION,
        }
    }

    /// Returns `true` if this ref is a buffer-local pending reservation
    /// rather than a real store slot.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        self.generation == PENDING_GENERATION
    }
}
