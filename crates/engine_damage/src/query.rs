//! Small query-collection helpers shared by this crate's systems.
//!
//! Mirrors `engine_physics::systems`'s `entities_with*` helpers — each crate
//! keeps its own copy rather than promoting them to `engine_component`,
//! since the set of arities needed differs per crate.

use engine_component::{Component, ComponentTypeId, QueryDescriptor, Ref, Store};

pub fn entities_with1<A: Component>(store: &Store) -> Vec<Ref> {
    let query = QueryDescriptor::new().read(ComponentTypeId::of::<A>());
    collect_matching(store, &query)
}

pub fn entities_with2<A: Component, B: Component>(store: &Store) -> Vec<Ref> {
    let query = QueryDescriptor::new()
        .read(ComponentTypeId::of::<A>())
        .read(ComponentTypeId::of::<B>());
    collect_matching(store, &query)
}

pub fn entities_with3<A: Component, B: Component, C: Component>(store: &Store) -> Vec<Ref> {
    let query = QueryDescriptor::new()
        .read(ComponentTypeId::of::<A>())
        .read(ComponentTypeId::of::<B>())
        .read(ComponentTypeId::of::<C>());
    collect_matching(store, &query)
}

pub fn collect_matching(store: &Store, query: &QueryDescriptor) -> Vec<Ref> {
    store
        .archetypes_matching(query)
        .flat_map(|table| table.chunks.iter().flat_map(|chunk| chunk.entities.iter().copied()))
        .collect()
}
