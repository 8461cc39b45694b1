//! Physical item-entity components.

use engine_component::{Component, Ref};
use serde::{Deserialize, Serialize};

/// A dropped, physically-simulated stack of an item kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemComponent {
    /// The asset id of the item kind (looked up in the asset registry for
    /// stack size, merge radius, etc.).
    pub item_id: String,
    pub quantity: u32,
    /// Seconds since this entity was dropped/spawned. Compared against
    /// `ItemDescriptor::pickup_delay_seconds` before it becomes pickable.
    pub age_seconds: f32,
}

impl ItemComponent {
    #[must_use]
    pub fn new(item_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
            age_seconds: 0.0,
        }
    }
}

impl Component for ItemComponent {
    fn type_name() -> &'static str {
        "ItemComponent"
    }
}

/// Marker excluding an item entity from automatic merging with same-kind
/// stacks (e.g. a stack someone is actively throwing).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreventItemMerging;

impl Component for PreventItemMerging {
    fn type_name() -> &'static str {
        "PreventItemMerging"
    }
}

/// Marker present on an item entity that has been claimed by an active
/// interaction (e.g. mid-throw, mid-use). `ItemMergeSystem` treats this the
/// same as `PreventItemMerging`: an interactable item never merges.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Interactable;

impl Component for Interactable {
    fn type_name() -> &'static str {
        "Interactable"
    }
}

/// Marker excluding an item entity from pickup (e.g. quest-placed decor).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreventPickup;

impl Component for PreventPickup {
    fn type_name() -> &'static str {
        "PreventPickup"
    }
}

/// Attached to an item entity mid-flight toward a picking-up holder. The
/// item keeps its own transform, interpolating toward the holder, until the
/// interpolation completes and the item is handed to the inventory system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PickupItemComponent {
    pub holder: Ref,
    /// 0.0 at pickup start, 1.0 when the item reaches the holder.
    pub progress: f32,
}

impl Component for PickupItemComponent {
    fn type_name() -> &'static str {
        "PickupItemComponent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_component_new() {
        let item = ItemComponent::new("wood_plank", 16);
        assert_eq!(item.quantity, 16);
        assert_eq!(item.age_seconds, 0.0);
    }
}
