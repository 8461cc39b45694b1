//! # engine_inventory
//!
//! The transactional item container model: fixed-slot inventories whose
//! mutating operations return a description of exactly what changed instead
//! of mutating silently. Every operation either fully succeeds or leaves the
//! container exactly as it found it — there is no partially-applied state
//! for a caller to reconcile.
//!
//! Composite operations ([`container::ItemContainer::add_resource`],
//! [`container::ItemContainer::add_by_tag`]) delegate resolving an abstract
//! resource or tag to a concrete descriptor id to the
//! [`collaborators::ResourceResolver`] / [`collaborators::TagResolver`]
//! traits — the real catalog backing those lookups lives outside this
//! crate.

pub mod collaborators;
pub mod container;
pub mod item_stack;
pub mod quantity;
pub mod transaction;

pub use collaborators::{EmptyTagResolver, ExactResourceResolver, ResourceResolver, TagResolver};
pub use container::ItemContainer;
pub use item_stack::ItemStack;
pub use quantity::{Action, MaterialQuantity, ResourceQuantity};
pub use transaction::{
    from_parent, to_parent, ListTransaction, MaterialSlotTransaction, MoveTransaction, MoveType,
    ResourceSlotTransaction, ResourceTransaction, SlotModified, SlotRemap, SlotTransaction,
    TagSlotTransaction, TagTransaction,
};
