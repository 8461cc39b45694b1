//! Query types describing how much of something an inventory operation
//! wants to add or remove.

use serde::{Deserialize, Serialize};

/// Which direction a composite list-transaction operation ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Add,
    Remove,
}

/// Requests a change of a single, exactly-named item descriptor. Targets
/// one slot at a time ([`crate::container::ItemContainer::add_material`] /
/// `remove_material`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialQuantity {
    pub descriptor_id: String,
    pub amount: u32,
}

impl MaterialQuantity {
    #[must_use]
    pub fn new(descriptor_id: impl Into<String>, amount: u32) -> Self {
        Self {
            descriptor_id: descriptor_id.into(),
            amount,
        }
    }
}

/// Requests a change of an abstract resource, which a
/// [`crate::collaborators::ResourceResolver`] maps onto one or more
/// concrete descriptor ids. Spans every matching slot in the container
/// ([`crate::container::ItemContainer::add_resource`] / `remove_resource`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceQuantity {
    pub resource_id: String,
    pub amount: u32,
}

impl ResourceQuantity {
    #[must_use]
    pub fn new(resource_id: impl Into<String>, amount: u32) -> Self {
        Self {
            resource_id: resource_id.into(),
            amount,
        }
    }
}
