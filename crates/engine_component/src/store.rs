//! The authoritative entity store.
//!
//! `Store` owns every archetype table, the generation-tagged slot array that
//! backs [`Ref`] validity, and the free list recycling destroyed slots. It is
//! the only type that hands out refs or applies deferred commands; systems
//! only ever see it through read-only queries during the parallel phase and
//! through [`CommandBuffer`] draining during the single-threaded sync phase.

use std::collections::{BTreeSet, HashMap};

use crate::archetype::{ArchetypeId, ArchetypeTable, RowLocation};
use crate::command_buffer::{Command, CommandBuffer, RawComponent};
use crate::component::{Component, ComponentTypeId};
use crate::entity::Ref;
use crate::query::QueryDescriptor;

struct Slot {
    generation: u32,
    location: Option<(ArchetypeId, RowLocation)>,
}

/// The kind of structural change a [`RefChangeEvent`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefChangeKind {
    /// The entity was created this sync.
    Created,
    /// The entity was destroyed this sync.
    Destroyed,
    /// A component was attached to the entity this sync.
    ComponentAdded,
    /// A component was detached from the entity this sync.
    ComponentRemoved,
}

/// A structural change to an entity observed while applying a sync phase.
///
/// Systems that react to a component's presence rather than polling for it
/// every tick (e.g. the death/respawn pipeline reacting to `DeathComponent`)
/// subscribe to these instead of re-running a query every tick.
#[derive(Debug, Clone, Copy)]
pub struct RefChangeEvent {
    pub entity: Ref,
    /// The component type involved, for `ComponentAdded`/`ComponentRemoved`.
    /// `None` for `Created`/`Destroyed`.
    pub type_id: Option<ComponentTypeId>,
    pub kind: RefChangeKind,
}

/// Owns all entities and components. See the module docs for the
/// consistency model.
#[derive(Default)]
pub struct Store {
    archetypes: HashMap<ArchetypeId, ArchetypeTable>,
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    type_sizes: HashMap<ComponentTypeId, usize>,
}

impl Store {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` iff `entity` refers to a live slot: not pending, not
    /// the invalid sentinel, and its recorded generation matches the slot's
    /// current generation.
    #[must_use]
    pub fn is_alive(&self, entity: Ref) -> bool {
        if entity.is_pending() || !entity.is_valid() {
            return false;
        }
        self.slots
            .get(entity.index() as usize)
            .is_some_and(|slot| slot.generation == entity.generation() && slot.location.is_some())
    }

    /// Number of live entities across all archetypes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.archetypes.values().map(ArchetypeTable::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn allocate_slot(&mut self) -> Ref {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            Ref::from_parts(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                location: None,
            });
            Ref::from_parts(index, 0)
        }
    }

    fn get_or_create_archetype(&mut self, type_set: BTreeSet<ComponentTypeId>) -> ArchetypeId {
        let id = ArchetypeId::from_component_types(&type_set);
        if !self.archetypes.contains_key(&id) {
            let item_sizes: Vec<usize> = type_set
                .iter()
                .map(|ty| {
                    *self
                        .type_sizes
                        .get(ty)
                        .expect("component type seen before archetype creation")
                })
                .collect();
            self.archetypes
                .insert(id, ArchetypeTable::new(type_set, &item_sizes));
        }
        id
    }

    fn insert_row(
        &mut self,
        archetype_id: ArchetypeId,
        entity: Ref,
        components: Vec<RawComponent>,
    ) -> RowLocation {
        let table = self.archetypes.get_mut(&archetype_id).expect("archetype exists");
        let location = table.push_entity(entity);
        for component in components {
            let col = table
                .column_index(component.type_id)
                .expect("component belongs to this archetype");
            table.chunks[location.chunk].columns[col].push_raw(&component.bytes);
        }
        location
    }

    /// Copy every component of the row at `location` in `archetype_id` out as
    /// owned [`RawComponent`]s, leaving the row untouched.
    fn snapshot_row(&self, archetype_id: ArchetypeId, location: RowLocation) -> Vec<RawComponent> {
        let table = &self.archetypes[&archetype_id];
        let chunk = &table.chunks[location.chunk];
        table
            .component_types
            .iter()
            .zip(&chunk.columns)
            .map(|(&type_id, col)| RawComponent {
                type_id,
                item_size: col.item_size,
                bytes: col.get_raw(location.row).expect("row exists").to_vec(),
            })
            .collect()
    }

    /// Remove the row at `location`, updating the slot of whichever entity
    /// got swapped into its place.
    fn remove_row(&mut self, archetype_id: ArchetypeId, location: RowLocation) {
        let table = self.archetypes.get_mut(&archetype_id).expect("archetype exists");
        if let Some(moved_entity) = table.remove_row(location) {
            self.slots[moved_entity.index() as usize].location = Some((archetype_id, location));
        }
    }

    fn register_size(&mut self, component: &RawComponent) {
        self.type_sizes
            .entry(component.type_id)
            .or_insert(component.item_size);
    }

    /// Spawn a new entity with the given initial component set (possibly
    /// empty — an entity with no components belongs to the empty archetype).
    pub fn spawn(&mut self, components: Vec<RawComponent>) -> Ref {
        for c in &components {
            self.register_size(c);
        }
        let type_set: BTreeSet<ComponentTypeId> = components.iter().map(|c| c.type_id).collect();
        let entity = self.allocate_slot();
        let archetype_id = self.get_or_create_archetype(type_set);
        let location = self.insert_row(archetype_id, entity, components);
        self.slots[entity.index() as usize].location = Some((archetype_id, location));
        entity
    }

    /// Destroy a live entity. Returns `false` (no-op) if the entity is
    /// already dead.
    pub fn destroy(&mut self, entity: Ref) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let (archetype_id, location) = self.slots[entity.index() as usize].location.unwrap();
        self.remove_row(archetype_id, location);
        let slot = &mut self.slots[entity.index() as usize];
        slot.location = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(entity.index());
        true
    }

    fn location_of(&self, entity: Ref) -> Option<(ArchetypeId, RowLocation)> {
        if !self.is_alive(entity) {
            return None;
        }
        self.slots[entity.index() as usize].location
    }

    /// Read a component's raw bytes.
    #[must_use]
    pub fn get_component_raw(&self, entity: Ref, type_id: ComponentTypeId) -> Option<&[u8]> {
        let (archetype_id, location) = self.location_of(entity)?;
        let table = &self.archetypes[&archetype_id];
        let col = table.column_index(type_id)?;
        table.chunks[location.chunk].columns[col].get_raw(location.row)
    }

    /// Mutably access a component's raw bytes, for in-place field updates
    /// that do not change the component set (archetype-preserving writes).
    #[must_use]
    pub fn get_component_raw_mut(
        &mut self,
        entity: Ref,
        type_id: ComponentTypeId,
    ) -> Option<&mut [u8]> {
        let (archetype_id, location) = self.location_of(entity)?;
        let table = self.archetypes.get_mut(&archetype_id)?;
        let col = table.column_index(type_id)?;
        table.chunks[location.chunk].columns[col].get_raw_mut(location.row)
    }

    /// Typed component read.
    #[must_use]
    pub fn get_component<T: Component>(&self, entity: Ref) -> Option<&T> {
        let bytes = self.get_component_raw(entity, T::component_type_id())?;
        // SAFETY: bytes were written by a push of exactly `T` for this type id.
        Some(unsafe { &*(bytes.as_ptr().cast::<T>()) })
    }

    /// Typed component mutation, archetype-preserving.
    #[must_use]
    pub fn get_component_mut<T: Component>(&mut self, entity: Ref) -> Option<&mut T> {
        let bytes = self.get_component_raw_mut(entity, T::component_type_id())?;
        // SAFETY: bytes were written by a push of exactly `T` for this type id.
        Some(unsafe { &mut *(bytes.as_mut_ptr().cast::<T>()) })
    }

    /// Attach `component` to `entity`, moving it to the archetype with that
    /// type added (replacing it in place if already present). No-op if the
    /// entity is dead.
    pub fn add_component(&mut self, entity: Ref, component: RawComponent) -> bool {
        let Some((old_archetype_id, old_location)) = self.location_of(entity) else {
            return false;
        };
        self.register_size(&component);
        let mut row = self.snapshot_row(old_archetype_id, old_location);
        row.retain(|c| c.type_id != component.type_id);
        let new_type_id = component.type_id;
        row.push(component);
        let new_type_set: BTreeSet<ComponentTypeId> = row.iter().map(|c| c.type_id).collect();
        debug_assert!(new_type_set.contains(&new_type_id));

        self.remove_row(old_archetype_id, old_location);
        let new_archetype_id = self.get_or_create_archetype(new_type_set);
        let new_location = self.insert_row(new_archetype_id, entity, row);
        self.slots[entity.index() as usize].location = Some((new_archetype_id, new_location));
        true
    }

    /// Detach the component of type `type_id` from `entity`, moving it to
    /// the archetype with that type removed. No-op if the entity is dead or
    /// does not have the component.
    pub fn remove_component(&mut self, entity: Ref, type_id: ComponentTypeId) -> bool {
        let Some((old_archetype_id, old_location)) = self.location_of(entity) else {
            return false;
        };
        if !self.archetypes[&old_archetype_id].has_component(type_id) {
            return false;
        }
        let mut row = self.snapshot_row(old_archetype_id, old_location);
        row.retain(|c| c.type_id != type_id);
        let new_type_set: BTreeSet<ComponentTypeId> = row.iter().map(|c| c.type_id).collect();

        self.remove_row(old_archetype_id, old_location);
        let new_archetype_id = self.get_or_create_archetype(new_type_set);
        let new_location = self.insert_row(new_archetype_id, entity, row);
        self.slots[entity.index() as usize].location = Some((new_archetype_id, new_location));
        true
    }

    /// Overwrite an already-present component in place, without an
    /// archetype move. No-op if the entity is dead or does not have the
    /// component — use [`Store::add_component`] for that.
    pub fn set_component(&mut self, entity: Ref, component: RawComponent) -> bool {
        let Some((archetype_id, location)) = self.location_of(entity) else {
            return false;
        };
        let table = self.archetypes.get_mut(&archetype_id).expect("archetype exists");
        let Some(col) = table.column_index(component.type_id) else {
            return false;
        };
        table.chunks[location.chunk].columns[col].set_raw(location.row, &component.bytes);
        true
    }

    /// Apply every buffer's recorded commands, in the order the buffers are
    /// given, each buffer's own commands in recorded order. Callers
    /// (the scheduler) are responsible for ordering the buffer list by
    /// system group, system id, and worker id before calling this.
    ///
    /// Returns the structural changes observed, in application order, for
    /// ref-change-driven systems to react to.
    pub fn apply_commands(&mut self, buffers: &mut [CommandBuffer]) -> Vec<RefChangeEvent> {
        let mut events = Vec::new();
        for buffer in buffers.iter_mut() {
            let mut pending_map: HashMap<Ref, Ref> = HashMap::new();
            for command in buffer.drain() {
                match command {
                    Command::CreateEntity {
                        pending,
                        components,
                    } => {
                        let real = self.spawn(components);
                        pending_map.insert(pending, real);
                        events.push(RefChangeEvent {
                            entity: real,
                            type_id: None,
                            kind: RefChangeKind::Created,
                        });
                    }
                    Command::DestroyEntity { entity } => {
                        if let Some(resolved) = resolve(&pending_map, entity)
                            && self.destroy(resolved)
                        {
                            events.push(RefChangeEvent {
                                entity: resolved,
                                type_id: None,
                                kind: RefChangeKind::Destroyed,
                            });
                        }
                    }
                    Command::AddComponent { entity, component } => {
                        if let Some(resolved) = resolve(&pending_map, entity) {
                            let type_id = component.type_id;
                            if self.add_component(resolved, component) {
                                events.push(RefChangeEvent {
                                    entity: resolved,
                                    type_id: Some(type_id),
                                    kind: RefChangeKind::ComponentAdded,
                                });
                            }
                        }
                    }
                    Command::RemoveComponent { entity, type_id } => {
                        if let Some(resolved) = resolve(&pending_map, entity)
                            && self.remove_component(resolved, type_id)
                        {
                            events.push(RefChangeEvent {
                                entity: resolved,
                                type_id: Some(type_id),
                                kind: RefChangeKind::ComponentRemoved,
                            });
                        }
                    }
                    Command::SetComponent { entity, component } => {
                        if let Some(resolved) = resolve(&pending_map, entity) {
                            self.set_component(resolved, component);
                        }
                    }
                }
            }
        }
        events
    }

    /// Iterate the archetype tables matching `query`'s structural
    /// requirements (ignores [`crate::query::QueryFilter`]s, which are
    /// applied by the caller at the row level).
    pub fn archetypes_matching<'a>(
        &'a self,
        query: &'a QueryDescriptor,
    ) -> impl Iterator<Item = &'a ArchetypeTable> + 'a {
        self.archetypes
            .values()
            .filter(move |table| query.matches(&table.component_types))
    }
}

/// Resolve a ref recorded in a command: pending refs look themselves up in
/// this buffer's local map (populated by prior `CreateEntity` commands in
/// the same buffer); real refs are returned as-is, unresolved only if
/// already destroyed by this point in the apply order — which silently
/// drops the command, the same way a duplicate destroy silently no-ops.
fn resolve(pending_map: &HashMap<Ref, Ref>, entity: Ref) -> Option<Ref> {
    if entity.is_pending() {
        pending_map.get(&entity).copied()
    } else {
        Some(entity)
    }
}
