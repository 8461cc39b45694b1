//! The transaction algebra: immutable value objects describing what a
//! container operation actually did.
//!
//! Nothing in this module is ever constructed by a caller — the engine
//! ([`crate::container::ItemContainer`]) is the only producer. Callers
//! inspect the result and must never write `succeeded = false` sub-states
//! to clients, since the invariant is that the container's real state is as
//! if the operation never happened.

use serde::{Deserialize, Serialize};

use crate::item_stack::ItemStack;
use crate::quantity::{Action, MaterialQuantity, ResourceQuantity};

/// The outcome of an operation targeting exactly one slot.
///
/// `before`/`after` always reflect the slot's real pre- and post-state at
/// the moment of the operation — even when `succeeded` is `false`, in which
/// case `before == after` and callers must not read anything else from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTransaction {
    pub slot: usize,
    pub before: Option<ItemStack>,
    pub after: Option<ItemStack>,
    pub succeeded: bool,
}

impl SlotTransaction {
    #[must_use]
    pub fn unchanged(slot: usize, stack: Option<ItemStack>) -> Self {
        Self {
            slot,
            before: stack.clone(),
            after: stack,
            succeeded: false,
        }
    }

    /// The canonical failed-add instance: no slot was ever touched because
    /// none could accept the stack. Every caller site constructs its own
    /// value (this is a plain value type, not a shared singleton handle),
    /// but they all agree on this shape.
    #[must_use]
    pub fn failed_add() -> Self {
        Self {
            slot: usize::MAX,
            before: None,
            after: None,
            succeeded: false,
        }
    }

    #[must_use]
    pub fn was_modified(&self) -> bool {
        self.before != self.after
    }
}

/// `was_slot_modified(slot)`: true iff some part of this transaction
/// targeted `slot` and actually changed its contents.
pub trait SlotModified {
    fn was_slot_modified(&self, slot: usize) -> bool;
}

impl SlotModified for SlotTransaction {
    fn was_slot_modified(&self, slot: usize) -> bool {
        self.slot == slot && self.was_modified()
    }
}

/// Translates slot indices between a nested container's local coordinate
/// space and its parent's. Implementations are pure: they return a new,
/// independent transaction value or `None` if the translation touches no
/// slot this transaction targets.
pub trait SlotRemap: Sized {
    fn remap_slot(&self, translate: &dyn Fn(usize) -> Option<usize>) -> Option<Self>;
}

impl SlotRemap for SlotTransaction {
    fn remap_slot(&self, translate: &dyn Fn(usize) -> Option<usize>) -> Option<Self> {
        let slot = translate(self.slot)?;
        Some(Self { slot, ..self.clone() })
    }
}

/// Translate `tx`'s slot indices from a child container's local coordinate
/// space (`[child_slot_start, child_slot_start + child_slot_count)`) into
/// its parent's, anchored at `parent_slot_start`. Returns `None` if `tx`
/// addresses no slot inside that range.
#[must_use]
pub fn to_parent<T: SlotRemap>(
    tx: &T,
    child_slot_start: usize,
    child_slot_count: usize,
    parent_slot_start: usize,
) -> Option<T> {
    tx.remap_slot(&|slot| {
        if slot >= child_slot_start && slot < child_slot_start + child_slot_count {
            Some(parent_slot_start + (slot - child_slot_start))
        } else {
            None
        }
    })
}

/// The inverse of [`to_parent`]: translate `tx`'s slot indices from the
/// parent's coordinate space back into a nested child's.
#[must_use]
pub fn from_parent<T: SlotRemap>(
    tx: &T,
    parent_slot_start: usize,
    parent_slot_count: usize,
    child_slot_start: usize,
) -> Option<T> {
    tx.remap_slot(&|slot| {
        if slot >= parent_slot_start && slot < parent_slot_start + parent_slot_count {
            Some(child_slot_start + (slot - parent_slot_start))
        } else {
            None
        }
    })
}

/// A single-slot material add/remove, wrapping the [`SlotTransaction`] it
/// produced alongside the query that drove it and whatever couldn't be
/// placed or removed in that one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialSlotTransaction {
    pub inner: SlotTransaction,
    pub query: MaterialQuantity,
    pub remainder: u32,
}

impl SlotModified for MaterialSlotTransaction {
    fn was_slot_modified(&self, slot: usize) -> bool {
        self.inner.was_slot_modified(slot)
    }
}

impl SlotRemap for MaterialSlotTransaction {
    fn remap_slot(&self, translate: &dyn Fn(usize) -> Option<usize>) -> Option<Self> {
        Some(Self {
            inner: self.inner.remap_slot(translate)?,
            query: self.query.clone(),
            remainder: self.remainder,
        })
    }
}

/// One slot's contribution to a multi-slot [`ResourceTransaction`]: how much
/// of the abstract resource query was satisfied at this particular slot,
/// and how much of the original request remained outstanding afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSlotTransaction {
    pub inner: SlotTransaction,
    pub query: ResourceQuantity,
    pub consumed: u32,
    pub remainder: u32,
}

impl SlotModified for ResourceSlotTransaction {
    fn was_slot_modified(&self, slot: usize) -> bool {
        self.inner.was_slot_modified(slot)
    }
}

impl SlotRemap for ResourceSlotTransaction {
    fn remap_slot(&self, translate: &dyn Fn(usize) -> Option<usize>) -> Option<Self> {
        Some(Self {
            inner: self.inner.remap_slot(translate)?,
            query: self.query.clone(),
            consumed: self.consumed,
            remainder: self.remainder,
        })
    }
}

/// One slot's contribution to a multi-slot [`TagTransaction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSlotTransaction {
    pub inner: SlotTransaction,
    pub query: i32,
    pub remainder: u32,
}

impl SlotModified for TagSlotTransaction {
    fn was_slot_modified(&self, slot: usize) -> bool {
        self.inner.was_slot_modified(slot)
    }
}

impl SlotRemap for TagSlotTransaction {
    fn remap_slot(&self, translate: &dyn Fn(usize) -> Option<usize>) -> Option<Self> {
        Some(Self {
            inner: self.inner.remap_slot(translate)?,
            query: self.query,
            remainder: self.remainder,
        })
    }
}

/// A composite of independent sub-transactions. `succeeded` is an
/// operator-asserted outcome for the composite as a whole — per §9's open
/// question, this spec treats it as independent of any reduction over
/// `sub`, so callers must not derive one from the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListTransaction<T> {
    pub succeeded: bool,
    pub sub: Vec<T>,
}

impl<T: SlotModified> SlotModified for ListTransaction<T> {
    fn was_slot_modified(&self, slot: usize) -> bool {
        self.sub.iter().any(|t| t.was_slot_modified(slot))
    }
}

impl<T: SlotRemap + Clone> SlotRemap for ListTransaction<T> {
    fn remap_slot(&self, translate: &dyn Fn(usize) -> Option<usize>) -> Option<Self> {
        let mapped: Vec<T> = self.sub.iter().filter_map(|t| t.remap_slot(translate)).collect();
        if mapped.is_empty() {
            return None;
        }
        Some(Self {
            succeeded: self.succeeded,
            sub: mapped,
        })
    }
}

/// Which side of a `moveFrom` call this container was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveType {
    /// This container received the moved stack.
    MoveToSelf,
    /// This container was the source the stack was moved out of.
    MoveFromSelf,
}

/// The outcome of moving a quantity of one stack from one container's slot
/// into another's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveTransaction<T> {
    pub succeeded: bool,
    pub remove: SlotTransaction,
    pub add: T,
    pub move_type: MoveType,
    /// Opaque identifier of the other container involved, for client-side
    /// bookkeeping. `0` when the caller never tagged its containers.
    pub other_container: u64,
}

/// Specialization of [`ListTransaction`] for [`crate::quantity::ResourceQuantity`]
/// operations: carries the action, the original query, and aggregate
/// totals across every slot touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTransaction {
    pub succeeded: bool,
    pub sub: Vec<ResourceSlotTransaction>,
    pub action: Action,
    pub query: ResourceQuantity,
    pub consumed: u32,
    pub remainder: u32,
}

/// Specialization of [`ListTransaction`] for tag-index operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagTransaction {
    pub succeeded: bool,
    pub sub: Vec<TagSlotTransaction>,
    pub action: Action,
    pub query: i32,
    pub consumed: u32,
    pub remainder: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(qty: u16) -> Option<ItemStack> {
        Some(ItemStack::new("stone", qty))
    }

    #[test]
    fn test_was_modified_detects_quantity_change() {
        let tx = SlotTransaction {
            slot: 0,
            before: stack(4),
            after: stack(8),
            succeeded: true,
        };
        assert!(tx.was_modified());
        assert!(tx.was_slot_modified(0));
        assert!(!tx.was_slot_modified(1));
    }

    #[test]
    fn test_unchanged_slot_transaction_is_not_modified() {
        let tx = SlotTransaction::unchanged(2, stack(4));
        assert!(!tx.was_modified());
        assert!(!tx.was_slot_modified(2));
    }

    #[test]
    fn test_to_parent_translates_slot_inside_range() {
        let tx = SlotTransaction {
            slot: 1,
            before: stack(4),
            after: stack(8),
            succeeded: true,
        };
        let mapped = to_parent(&tx, 0, 4, 10).unwrap();
        assert_eq!(mapped.slot, 11);
    }

    #[test]
    fn test_to_parent_returns_none_outside_range() {
        let tx = SlotTransaction {
            slot: 9,
            before: stack(4),
            after: stack(8),
            succeeded: true,
        };
        assert!(to_parent(&tx, 0, 4, 10).is_none());
    }

    #[test]
    fn test_round_trip_to_parent_then_from_parent() {
        let tx = SlotTransaction {
            slot: 2,
            before: stack(4),
            after: stack(8),
            succeeded: true,
        };
        let parent = to_parent(&tx, 0, 4, 10).unwrap();
        let back = from_parent(&parent, 10, 4, 0).unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn test_list_transaction_was_slot_modified_checks_every_sub() {
        let list = ListTransaction {
            succeeded: true,
            sub: vec![
                SlotTransaction { slot: 0, before: stack(4), after: stack(4), succeeded: true },
                SlotTransaction { slot: 1, before: stack(4), after: stack(8), succeeded: true },
            ],
        };
        assert!(!list.was_slot_modified(0));
        assert!(list.was_slot_modified(1));
    }

    #[test]
    fn test_list_transaction_remap_drops_non_overlapping_sub_entries() {
        let list = ListTransaction {
            succeeded: true,
            sub: vec![
                SlotTransaction { slot: 0, before: stack(4), after: stack(8), succeeded: true },
                SlotTransaction { slot: 5, before: stack(4), after: stack(8), succeeded: true },
            ],
        };
        let mapped = to_parent(&list, 0, 2, 100).unwrap();
        assert_eq!(mapped.sub.len(), 1);
        assert_eq!(mapped.sub[0].slot, 100);
    }
}
