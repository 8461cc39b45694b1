//! Deferred mutation recording.
//!
//! Systems never mutate the store directly — they record intent into a
//! per-worker [`CommandBuffer`], which is drained by the [`crate::store::Store`]
//! during the single-threaded sync phase at the end of a tick. This keeps
//! archetype moves and entity destruction out of the parallel phase, where
//! they would otherwise race with queries running on other workers.

use crate::component::{Component, ComponentMeta, ComponentTypeId};
use crate::entity::Ref;

/// Type-erased, owned bytes for a single component value, paired with the
/// metadata needed to place it into a column.
///
/// Mirrors the byte-blob representation [`crate::archetype::Column`] already
/// uses: components are moved in as raw bytes and never dropped in place by
/// this type. A component with drop glue (e.g. holding a `Vec` or `String`)
/// that never makes it into a column — because its destination entity was
/// concurrently destroyed — leaks its heap allocation. This is the same
/// trade-off the archetype storage already makes and is not addressed here.
pub struct RawComponent {
    pub(crate) type_id: ComponentTypeId,
    pub(crate) item_size: usize,
    pub(crate) bytes: Vec<u8>,
}

impl RawComponent {
    /// Move a typed component value into its raw-byte representation.
    pub fn of<T: Component>(value: T) -> Self {
        let item_size = std::mem::size_of::<T>();
        let mut bytes = vec![0u8; item_size];
        // SAFETY: `bytes` is sized exactly for `T` and freshly allocated.
        unsafe {
            std::ptr::write(bytes.as_mut_ptr().cast::<T>(), value);
        }
        Self {
            type_id: T::component_type_id(),
            item_size,
            bytes,
        }
    }

    #[must_use]
    pub fn meta_matches(&self, meta: &ComponentMeta) -> bool {
        self.type_id == meta.type_id && self.item_size == meta.layout.size()
    }
}

/// A single deferred mutation recorded by a system.
pub enum Command {
    /// Create a new entity. `pending` is the buffer-local placeholder ref
    /// handed back to the recording system, resolved to a real [`Ref`] during
    /// sync. `components` are attached atomically with creation.
    CreateEntity {
        pending: Ref,
        components: Vec<RawComponent>,
    },
    /// Destroy an entity. No-op if the entity is already gone by the time
    /// this command is applied.
    DestroyEntity { entity: Ref },
    /// Attach a component to an entity, moving it to a new archetype. No-op
    /// if the entity is gone.
    AddComponent { entity: Ref, component: RawComponent },
    /// Detach a component from an entity, moving it to a new archetype.
    /// No-op if the entity is gone or does not have the component.
    RemoveComponent {
        entity: Ref,
        type_id: ComponentTypeId,
    },
    /// Overwrite a component already present on the entity in place, without
    /// an archetype move. No-op if the entity is gone or does not have the
    /// component (use `AddComponent` for that case).
    SetComponent { entity: Ref, component: RawComponent },
}

/// A per-worker log of deferred ECS mutations.
///
/// Commands recorded on a single buffer always apply in the order they were
/// recorded. Ordering *across* buffers from different systems/workers in the
/// same sync phase is the scheduler's responsibility (see
/// `engine_system::Scheduler`), not this type's.
#[derive(Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
    next_pending_index: u32,
}

impl CommandBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no commands have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of recorded commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Record creation of a new entity with no components. Returns a
    /// buffer-local pending [`Ref`] that can be passed to subsequent calls on
    /// this same buffer (e.g. `add_component`) before the real entity exists.
    pub fn create_entity(&mut self) -> Ref {
        let pending = Ref::pending(self.next_pending_index);
        self.next_pending_index += 1;
        self.commands.push(Command::CreateEntity {
            pending,
            components: Vec::new(),
        });
        pending
    }

    /// Record creation of a new entity with an initial set of components
    /// attached atomically.
    pub fn create_entity_with(&mut self, components: Vec<RawComponent>) -> Ref {
        let pending = Ref::pending(self.next_pending_index);
        self.next_pending_index += 1;
        self.commands.push(Command::CreateEntity {
            pending,
            components,
        });
        pending
    }

    /// Record destruction of an entity.
    pub fn destroy_entity(&mut self, entity: Ref) {
        self.commands.push(Command::DestroyEntity { entity });
    }

    /// Record attaching a component, triggering an archetype move at sync.
    pub fn add_component<T: Component>(&mut self, entity: Ref, value: T) {
        self.commands.push(Command::AddComponent {
            entity,
            component: RawComponent::of(value),
        });
    }

    /// Record detaching a component, triggering an archetype move at sync.
    pub fn remove_component(&mut self, entity: Ref, type_id: ComponentTypeId) {
        self.commands
            .push(Command::RemoveComponent { entity, type_id });
    }

    /// Record an in-place overwrite of an already-present component.
    pub fn set_component<T: Component>(&mut self, entity: Ref, value: T) {
        self.commands.push(Command::SetComponent {
            entity,
            component: RawComponent::of(value),
        });
    }

    /// Drain the recorded commands in order, consuming the buffer. Used by
    /// the store during the sync phase.
    pub fn drain(&mut self) -> Vec<Command> {
        self.next_pending_index = 0;
        std::mem::take(&mut self.commands)
    }
}
