//! The container itself: a fixed-size array of slots plus the transactional
//! operations that mutate it.
//!
//! Every mutating method returns a value describing exactly what happened,
//! and on failure leaves every slot exactly as it found it — no partial
//! writes ever escape a failed call.

use std::sync::Arc;

use engine_assets::{AssetRegistry, ItemDescriptor};

use crate::collaborators::{ResourceResolver, TagResolver};
use crate::item_stack::ItemStack;
use crate::quantity::{Action, MaterialQuantity, ResourceQuantity};
use crate::transaction::{
    MaterialSlotTransaction, MoveTransaction, MoveType, ResourceSlotTransaction,
    ResourceTransaction, SlotTransaction, TagSlotTransaction, TagTransaction,
};

/// A fixed-slot item container: a chest, a player's backpack, an equipment
/// belt. Slot count is fixed at construction; nothing in this crate resizes
/// a container after it exists.
pub struct ItemContainer {
    id: u64,
    slots: Vec<Option<ItemStack>>,
    assets: Arc<AssetRegistry>,
}

impl ItemContainer {
    #[must_use]
    pub fn new(slot_count: usize, assets: Arc<AssetRegistry>) -> Self {
        Self::new_with_id(0, slot_count, assets)
    }

    #[must_use]
    pub fn new_with_id(id: u64, slot_count: usize, assets: Arc<AssetRegistry>) -> Self {
        Self {
            id,
            slots: vec![None; slot_count],
            assets,
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&ItemStack> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    fn max_stack_size(&self, descriptor_id: &str) -> u32 {
        self.assets
            .get::<ItemDescriptor>(descriptor_id)
            .map_or(u32::MAX, |descriptor| descriptor.max_stack_size)
    }

    /// Add up to `query.amount` of `query.descriptor_id` into `slot`, merging
    /// into what's already there when stackable. Whatever doesn't fit is
    /// reported as `remainder` and never placed anywhere else.
    pub fn add_material(&mut self, slot: usize, query: &MaterialQuantity) -> MaterialSlotTransaction {
        let before = self.slots[slot].clone();
        let cap = self.max_stack_size(&query.descriptor_id);

        let (after, placed) = match &before {
            None => {
                let placed = query.amount.min(cap).min(u32::from(u16::MAX));
                if placed == 0 {
                    (before.clone(), 0)
                } else {
                    (Some(ItemStack::new(query.descriptor_id.clone(), placed as u16)), placed)
                }
            }
            Some(existing) if existing.descriptor_id == query.descriptor_id => {
                let room = cap.saturating_sub(u32::from(existing.quantity));
                let placed = query.amount.min(room);
                if placed == 0 {
                    (before.clone(), 0)
                } else {
                    let mut updated = existing.clone();
                    updated.quantity += placed as u16;
                    (Some(updated), placed)
                }
            }
            Some(_) => (before.clone(), 0),
        };

        let remainder = query.amount - placed;
        let succeeded = placed > 0;
        self.slots[slot] = after.clone();
        MaterialSlotTransaction {
            inner: SlotTransaction { slot, before, after, succeeded },
            query: query.clone(),
            remainder,
        }
    }

    /// Remove up to `query.amount` of `query.descriptor_id` from `slot`.
    /// Removing the last unit of a stack empties the slot.
    pub fn remove_material(&mut self, slot: usize, query: &MaterialQuantity) -> MaterialSlotTransaction {
        let before = self.slots[slot].clone();

        let (after, removed) = match &before {
            Some(existing) if existing.descriptor_id == query.descriptor_id => {
                let removed = query.amount.min(u32::from(existing.quantity));
                let remaining = u32::from(existing.quantity) - removed;
                if remaining == 0 {
                    (None, removed)
                } else {
                    let mut updated = existing.clone();
                    updated.quantity = remaining as u16;
                    (Some(updated), removed)
                }
            }
            _ => (before.clone(), 0),
        };

        let remainder = query.amount - removed;
        let succeeded = removed > 0;
        self.slots[slot] = after.clone();
        MaterialSlotTransaction {
            inner: SlotTransaction { slot, before, after, succeeded },
            query: query.clone(),
            remainder,
        }
    }

    /// Add `query.amount` of an abstract resource, spreading across every
    /// slot `resolver` says matches — first topping up existing compatible
    /// stacks, then filling empty slots. Never partially applies: if the
    /// whole amount can't be placed, the call still reports how much was,
    /// slot by slot, since the goal is resource economy, not atomicity.
    pub fn add_resource(
        &mut self,
        query: &ResourceQuantity,
        resolver: &dyn ResourceResolver,
    ) -> ResourceTransaction {
        let mut remaining = query.amount;
        let mut sub = Vec::new();

        for slot in 0..self.slots.len() {
            if remaining == 0 {
                break;
            }
            let Some(existing) = &self.slots[slot] else { continue };
            if !resolver.matches(&existing.descriptor_id, &query.resource_id) {
                continue;
            }
            let descriptor_id = existing.descriptor_id.clone();
            let before = self.slots[slot].clone();
            let mat_tx = self.add_material(slot, &MaterialQuantity::new(descriptor_id, remaining));
            let consumed = remaining - mat_tx.remainder;
            remaining -= consumed;
            sub.push(ResourceSlotTransaction {
                inner: SlotTransaction {
                    slot,
                    before,
                    after: self.slots[slot].clone(),
                    succeeded: consumed > 0,
                },
                query: query.clone(),
                consumed,
                remainder: remaining,
            });
        }

        if remaining > 0 {
            if let Some(descriptor_id) = resolver_default_descriptor(resolver, &query.resource_id) {
                for slot in 0..self.slots.len() {
                    if remaining == 0 {
                        break;
                    }
                    if self.slots[slot].is_some() {
                        continue;
                    }
                    let before = self.slots[slot].clone();
                    let mat_tx =
                        self.add_material(slot, &MaterialQuantity::new(descriptor_id.clone(), remaining));
                    let consumed = remaining - mat_tx.remainder;
                    remaining -= consumed;
                    sub.push(ResourceSlotTransaction {
                        inner: SlotTransaction {
                            slot,
                            before,
                            after: self.slots[slot].clone(),
                            succeeded: consumed > 0,
                        },
                        query: query.clone(),
                        consumed,
                        remainder: remaining,
                    });
                }
            }
        }

        let consumed = query.amount - remaining;
        ResourceTransaction {
            succeeded: consumed > 0,
            sub,
            action: Action::Add,
            query: query.clone(),
            consumed,
            remainder: remaining,
        }
    }

    /// Remove `query.amount` of an abstract resource, draining matching
    /// slots in order until satisfied or exhausted.
    pub fn remove_resource(
        &mut self,
        query: &ResourceQuantity,
        resolver: &dyn ResourceResolver,
    ) -> ResourceTransaction {
        let mut remaining = query.amount;
        let mut sub = Vec::new();

        for slot in 0..self.slots.len() {
            if remaining == 0 {
                break;
            }
            let Some(existing) = &self.slots[slot] else { continue };
            if !resolver.matches(&existing.descriptor_id, &query.resource_id) {
                continue;
            }
            let descriptor_id = existing.descriptor_id.clone();
            let before = self.slots[slot].clone();
            let mat_tx = self.remove_material(slot, &MaterialQuantity::new(descriptor_id, remaining));
            let consumed = remaining - mat_tx.remainder;
            remaining -= consumed;
            sub.push(ResourceSlotTransaction {
                inner: SlotTransaction {
                    slot,
                    before,
                    after: self.slots[slot].clone(),
                    succeeded: consumed > 0,
                },
                query: query.clone(),
                consumed,
                remainder: remaining,
            });
        }

        let consumed = query.amount - remaining;
        ResourceTransaction {
            succeeded: consumed > 0,
            sub,
            action: Action::Remove,
            query: query.clone(),
            consumed,
            remainder: remaining,
        }
    }

    /// Add `amount` of whatever `resolver` names as `tag_index`'s first
    /// member, spanning slots the same way [`Self::add_resource`] does.
    /// When `all_or_nothing` is set and the full amount can't be placed,
    /// every slot touched by this call is rolled back to its pre-call state.
    pub fn add_by_tag(
        &mut self,
        tag_index: i32,
        amount: u32,
        all_or_nothing: bool,
        resolver: &dyn TagResolver,
    ) -> TagTransaction {
        let members = resolver.members(tag_index);
        let Some(descriptor_id) = members.first().cloned() else {
            return TagTransaction {
                succeeded: false,
                sub: Vec::new(),
                action: Action::Add,
                query: tag_index,
                consumed: 0,
                remainder: amount,
            };
        };

        let snapshot = self.slots.clone();
        let mut remaining = amount;
        let mut sub = Vec::new();

        for slot in 0..self.slots.len() {
            if remaining == 0 {
                break;
            }
            let accepts_here = match &self.slots[slot] {
                None => true,
                Some(existing) => existing.descriptor_id == descriptor_id,
            };
            if !accepts_here {
                continue;
            }
            let before = self.slots[slot].clone();
            let mat_tx = self.add_material(slot, &MaterialQuantity::new(descriptor_id.clone(), remaining));
            let consumed = remaining - mat_tx.remainder;
            remaining -= consumed;
            if consumed > 0 {
                sub.push(TagSlotTransaction {
                    inner: SlotTransaction {
                        slot,
                        before,
                        after: self.slots[slot].clone(),
                        succeeded: true,
                    },
                    query: tag_index,
                    remainder: remaining,
                });
            }
        }

        let consumed = amount - remaining;
        if all_or_nothing && remaining > 0 {
            self.slots = snapshot;
            return TagTransaction {
                succeeded: false,
                sub: Vec::new(),
                action: Action::Add,
                query: tag_index,
                consumed: 0,
                remainder: amount,
            };
        }

        TagTransaction {
            succeeded: consumed > 0,
            sub,
            action: Action::Add,
            query: tag_index,
            consumed,
            remainder: remaining,
        }
    }

    /// Move up to `amount` units from `source`'s `source_slot` into the
    /// first compatible or empty slot of `self`. Atomic across both
    /// containers: the amount actually moved is `min(removable, placeable)`,
    /// never a partial remove with nothing placed or vice versa.
    pub fn move_from(
        &mut self,
        source: &mut ItemContainer,
        source_slot: usize,
        amount: u32,
    ) -> MoveTransaction<SlotTransaction> {
        let Some(stack) = source.slots[source_slot].clone() else {
            return MoveTransaction {
                succeeded: false,
                remove: SlotTransaction::unchanged(source_slot, None),
                add: SlotTransaction::failed_add(),
                move_type: MoveType::MoveToSelf,
                other_container: source.id,
            };
        };

        let removable = amount.min(u32::from(stack.quantity));
        let descriptor_id = stack.descriptor_id.clone();

        let dest_slot = self.slots.iter().position(|s| match s {
            None => true,
            Some(existing) => existing.descriptor_id == descriptor_id,
        });

        let Some(dest_slot) = dest_slot else {
            return MoveTransaction {
                succeeded: false,
                remove: SlotTransaction::unchanged(source_slot, Some(stack)),
                add: SlotTransaction::failed_add(),
                move_type: MoveType::MoveToSelf,
                other_container: source.id,
            };
        };

        let cap = self.max_stack_size(&descriptor_id);
        let room = match &self.slots[dest_slot] {
            Some(existing) => cap.saturating_sub(u32::from(existing.quantity)),
            None => cap,
        };
        let move_amount = removable.min(room);

        if move_amount == 0 {
            return MoveTransaction {
                succeeded: false,
                remove: SlotTransaction::unchanged(source_slot, Some(stack)),
                add: SlotTransaction::failed_add(),
                move_type: MoveType::MoveToSelf,
                other_container: source.id,
            };
        }

        let remove_tx =
            source.remove_material(source_slot, &MaterialQuantity::new(descriptor_id.clone(), move_amount));
        let add_tx = self.add_material(dest_slot, &MaterialQuantity::new(descriptor_id, move_amount));

        MoveTransaction {
            succeeded: true,
            remove: remove_tx.inner,
            add: add_tx.inner,
            move_type: MoveType::MoveToSelf,
            other_container: source.id,
        }
    }

    /// Exchange the contents of two slots within this container.
    pub fn swap(&mut self, slot_a: usize, slot_b: usize) -> (SlotTransaction, SlotTransaction) {
        if slot_a == slot_b {
            let stack = self.slots[slot_a].clone();
            return (
                SlotTransaction::unchanged(slot_a, stack.clone()),
                SlotTransaction::unchanged(slot_b, stack),
            );
        }

        let before_a = self.slots[slot_a].clone();
        let before_b = self.slots[slot_b].clone();
        self.slots.swap(slot_a, slot_b);

        (
            SlotTransaction {
                slot: slot_a,
                before: before_a,
                after: self.slots[slot_a].clone(),
                succeeded: true,
            },
            SlotTransaction {
                slot: slot_b,
                before: before_b,
                after: self.slots[slot_b].clone(),
                succeeded: true,
            },
        )
    }
}

fn resolver_default_descriptor(_resolver: &dyn ResourceResolver, resource_id: &str) -> Option<String> {
    Some(resource_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{EmptyTagResolver, ExactResourceResolver};

    fn registry_with(descriptor_id: &str, max_stack_size: u32) -> Arc<AssetRegistry> {
        let registry = AssetRegistry::new();
        registry.register(
            descriptor_id,
            ItemDescriptor { max_stack_size, merge_radius: 0.0, pickup_delay_seconds: 0.0 },
        );
        Arc::new(registry)
    }

    #[test]
    fn test_add_material_into_empty_slot() {
        let assets = registry_with("stone", 64);
        let mut container = ItemContainer::new(3, assets);
        let tx = container.add_material(0, &MaterialQuantity::new("stone", 10));
        assert!(tx.inner.succeeded);
        assert_eq!(tx.remainder, 0);
        assert_eq!(container.slot(0).unwrap().quantity, 10);
    }

    #[test]
    fn test_add_material_caps_at_max_stack_size() {
        let assets = registry_with("stone", 64);
        let mut container = ItemContainer::new(1, assets);
        container.add_material(0, &MaterialQuantity::new("stone", 60));
        let tx = container.add_material(0, &MaterialQuantity::new("stone", 20));
        assert_eq!(tx.remainder, 16);
        assert_eq!(container.slot(0).unwrap().quantity, 64);
    }

    #[test]
    fn test_remove_material_empties_slot_when_fully_consumed() {
        let assets = registry_with("stone", 64);
        let mut container = ItemContainer::new(1, assets);
        container.add_material(0, &MaterialQuantity::new("stone", 10));
        let tx = container.remove_material(0, &MaterialQuantity::new("stone", 10));
        assert!(tx.inner.succeeded);
        assert!(container.slot(0).is_none());
    }

    #[test]
    fn test_add_resource_spans_three_slots_matching_spec_scenario() {
        let assets = registry_with("stone", 64);
        let mut container = ItemContainer::new(3, assets);
        container.add_material(0, &MaterialQuantity::new("stone", 60));
        container.add_material(1, &MaterialQuantity::new("stone", 60));
        container.add_material(2, &MaterialQuantity::new("stone", 60));

        let tx = container.add_resource(&ResourceQuantity::new("stone", 30), &ExactResourceResolver);
        assert_eq!(tx.consumed, 12);
        assert_eq!(tx.remainder, 18);
        assert!(container.slot(0).unwrap().quantity == 64);
        assert!(container.slot(1).unwrap().quantity == 64);
        assert!(container.slot(2).unwrap().quantity == 64);
    }

    #[test]
    fn test_add_by_tag_with_no_members_fails_without_touching_slots() {
        let assets = registry_with("stone", 64);
        let mut container = ItemContainer::new(1, assets);
        let tx = container.add_by_tag(0, 10, false, &EmptyTagResolver);
        assert!(!tx.succeeded);
        assert!(container.slot(0).is_none());
    }

    #[test]
    fn test_move_from_transfers_atomically() {
        let assets = registry_with("stone", 64);
        let mut dest = ItemContainer::new_with_id(1, 1, Arc::clone(&assets));
        let mut src = ItemContainer::new_with_id(2, 1, assets);
        src.add_material(0, &MaterialQuantity::new("stone", 20));

        let tx = dest.move_from(&mut src, 0, 5);
        assert!(tx.succeeded);
        assert_eq!(dest.slot(0).unwrap().quantity, 5);
        assert_eq!(src.slot(0).unwrap().quantity, 15);
        assert_eq!(tx.other_container, 2);
    }

    #[test]
    fn test_move_from_empty_source_slot_fails() {
        let assets = registry_with("stone", 64);
        let mut dest = ItemContainer::new(1, Arc::clone(&assets));
        let mut src = ItemContainer::new(1, assets);
        let tx = dest.move_from(&mut src, 0, 5);
        assert!(!tx.succeeded);
    }

    #[test]
    fn test_swap_exchanges_two_slots() {
        let assets = registry_with("stone", 64);
        let mut container = ItemContainer::new(2, assets);
        container.add_material(0, &MaterialQuantity::new("stone", 5));
        let (tx_a, tx_b) = container.swap(0, 1);
        assert!(tx_a.succeeded);
        assert!(tx_b.succeeded);
        assert!(container.slot(0).is_none());
        assert_eq!(container.slot(1).unwrap().quantity, 5);
    }
}
