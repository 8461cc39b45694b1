//! A descriptor-identified, quantified item stack.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A stack of one item kind sitting in a single container slot.
///
/// `max_stack_size` is intentionally not carried here — it is a property of
/// the *descriptor* (looked up through [`engine_assets::AssetRegistry`] by
/// `descriptor_id`), shared by every stack of that kind, not a per-stack
/// field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemStack {
    pub descriptor_id: String,
    pub quantity: u16,
    pub durability: u32,
    /// Opaque per-stack data (enchantments, custom names, ...) — two stacks
    /// are only stackable if this compares equal.
    pub metadata: Option<BTreeMap<String, String>>,
}

impl ItemStack {
    #[must_use]
    pub fn new(descriptor_id: impl Into<String>, quantity: u16) -> Self {
        Self {
            descriptor_id: descriptor_id.into(),
            quantity,
            durability: 0,
            metadata: None,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Two stacks are stackable iff their descriptor and metadata are equal.
    /// Whether the *sum* fits under `max_stack_size` is a separate check the
    /// caller makes with the cap it looked up.
    #[must_use]
    pub fn stackable_with(&self, other: &ItemStack) -> bool {
        self.descriptor_id == other.descriptor_id && self.metadata == other.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stacks_with_equal_descriptor_and_metadata_stack() {
        let a = ItemStack::new("stone", 8);
        let b = ItemStack::new("stone", 16);
        assert!(a.stackable_with(&b));
    }

    #[test]
    fn test_stacks_with_different_descriptor_do_not_stack() {
        let a = ItemStack::new("stone", 8);
        let b = ItemStack::new("dirt", 8);
        assert!(!a.stackable_with(&b));
    }

    #[test]
    fn test_stacks_with_different_metadata_do_not_stack() {
        let mut meta = BTreeMap::new();
        meta.insert("enchant".to_string(), "sharpness".to_string());
        let a = ItemStack::new("sword", 1).with_metadata(meta);
        let b = ItemStack::new("sword", 1);
        assert!(!a.stackable_with(&b));
    }
}
