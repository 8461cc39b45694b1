//! Archetype definitions and chunked storage.
//!
//! An archetype is a unique combination of component types. Entities sharing
//! the same set of components are grouped into the same archetype and
//! partitioned into fixed-capacity [`ArchetypeChunk`]s of structure-of-arrays
//! columns, one column per component type, for cache-friendly iteration.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::component::ComponentTypeId;
use crate::entity::Ref;

/// Recommended chunk capacity: bounds per-chunk cache footprint and keeps
/// iteration SIMD-friendly.
pub const CHUNK_CAPACITY: usize = 512;

/// A unique identifier for an archetype, computed from its sorted set of
/// [`ComponentTypeId`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArchetypeId(pub u64);

impl ArchetypeId {
    /// Compute the archetype ID from a set of component type IDs.
    ///
    /// The result is deterministic: the same set of types always produces the
    /// same archetype ID regardless of insertion order.
    #[must_use]
    pub fn from_component_types(types: &BTreeSet<ComponentTypeId>) -> Self {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        for ty in types {
            ty.hash(&mut hasher);
        }
        Self(hasher.finish())
    }
}

/// A column in a chunk, storing components of a single type.
///
/// Components are stored as raw bytes for type-erased access. Each element is
/// `item_size` bytes, laid out contiguously.
#[derive(Debug, Clone)]
pub struct Column {
    /// The component type stored in this column.
    pub type_id: ComponentTypeId,
    /// Size of a single component instance in bytes.
    pub item_size: usize,
    /// Raw byte storage. Length is always `item_size * row_count`.
    pub data: Vec<u8>,
}

impl Column {
    /// Create a new empty column for the given component type.
    #[must_use]
    pub fn new(type_id: ComponentTypeId, item_size: usize) -> Self {
        Self {
            type_id,
            item_size,
            data: Vec::new(),
        }
    }

    /// Returns the number of component instances stored.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.item_size == 0 {
            return 0;
        }
        self.data.len() / self.item_size
    }

    /// Returns `true` if this column contains no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Push a component's raw bytes into the column.
    pub fn push_raw(&mut self, bytes: &[u8]) {
        assert_eq!(
            bytes.len(),
            self.item_size,
            "byte slice size mismatch: expected {}, got {}",
            self.item_size,
            bytes.len()
        );
        self.data.extend_from_slice(bytes);
    }

    /// Get a reference to the raw bytes of the component at `index`.
    #[must_use]
    pub fn get_raw(&self, index: usize) -> Option<&[u8]> {
        let start = index * self.item_size;
        let end = start + self.item_size;
        if end > self.data.len() {
            return None;
        }
        Some(&self.data[start..end])
    }

    /// Get a mutable reference to the raw bytes of the component at `index`.
    #[must_use]
    pub fn get_raw_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        let start = index * self.item_size;
        let end = start + self.item_size;
        if end > self.data.len() {
            return None;
        }
        Some(&mut self.data[start..end])
    }

    /// Overwrite the bytes at `index` with `bytes` (same size). Used for
    /// idempotent last-writer-wins component replacement.
    pub fn set_raw(&mut self, index: usize, bytes: &[u8]) {
        if let Some(dst) = self.get_raw_mut(index) {
            dst.copy_from_slice(bytes);
        }
    }

    /// Remove the component at `index` by swapping in the last element,
    /// truncating the column by one. Mirrors the caller's swap-remove on the
    /// parallel entity vector.
    pub fn swap_remove_raw(&mut self, index: usize) {
        let len = self.len();
        if len == 0 || self.item_size == 0 {
            return;
        }
        let last = len - 1;
        if index != last {
            let item_size = self.item_size;
            let (head, tail) = self.data.split_at_mut(last * item_size);
            head[index * item_size..index * item_size + item_size].copy_from_slice(tail);
        }
        self.data.truncate(last * self.item_size);
    }

    /// Push a typed component value into the column.
    ///
    /// # Safety
    ///
    /// The caller must ensure `T` matches the component type stored in this
    /// column (same size and alignment).
    pub unsafe fn push<T: Sized>(&mut self, value: T) {
        assert_eq!(std::mem::size_of::<T>(), self.item_size);
        let bytes =
            // SAFETY: We read `size_of::<T>()` bytes from a valid `T` value.
            unsafe { std::slice::from_raw_parts(&value as *const T as *const u8, self.item_size) };
        self.data.extend_from_slice(bytes);
        std::mem::forget(value);
    }

    /// Get a typed reference to the component at `index`.
    ///
    /// # Safety
    ///
    /// The caller must ensure `T` matches the component type stored in this
    /// column.
    #[must_use]
    pub unsafe fn get<T: Sized>(&self, index: usize) -> Option<&T> {
        let bytes = self.get_raw(index)?;
        // SAFETY: Caller guarantees type match.
        Some(unsafe { &*(bytes.as_ptr() as *const T) })
    }

    /// Get a typed mutable reference to the component at `index`.
    ///
    /// # Safety
    ///
    /// The caller must ensure `T` matches the component type stored in this
    /// column.
    #[must_use]
    pub unsafe fn get_mut<T: Sized>(&mut self, index: usize) -> Option<&mut T> {
        let bytes = self.get_raw_mut(index)?;
        // SAFETY: Caller guarantees type match.
        Some(unsafe { &mut *(bytes.as_mut_ptr() as *mut T) })
    }
}

/// A fixed-capacity block of structure-of-arrays storage for one archetype.
///
/// Chunks are kept dense: removing a row swaps in the last row of the same
/// chunk rather than leaving a hole.
#[derive(Debug, Clone)]
pub struct ArchetypeChunk {
    /// Entities in this chunk. `entities[i]` corresponds to row `i` in every
    /// column.
    pub entities: Vec<Ref>,
    /// One column per component type, in the archetype's declared order.
    pub columns: Vec<Column>,
}

impl ArchetypeChunk {
    fn new(component_types: &BTreeSet<ComponentTypeId>, item_sizes: &[usize]) -> Self {
        let columns = component_types
            .iter()
            .zip(item_sizes.iter())
            .map(|(&type_id, &size)| Column::new(type_id, size))
            .collect();
        Self {
            entities: Vec::with_capacity(CHUNK_CAPACITY),
            columns,
        }
    }

    /// Number of live rows in this chunk.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if the chunk holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns `true` if the chunk has reached [`CHUNK_CAPACITY`].
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.entities.len() >= CHUNK_CAPACITY
    }

    /// Find the row index for a given entity within this chunk.
    #[must_use]
    pub fn entity_row(&self, entity: Ref) -> Option<usize> {
        self.entities.iter().position(|&e| e == entity)
    }

    /// Swap-remove row `index`. Returns the entity that now occupies `index`
    /// after the swap (the entity that used to be last), or `None` if the
    /// removed row was already last (no swap occurred) or the chunk is now
    /// empty.
    fn swap_remove(&mut self, index: usize) -> Option<Ref> {
        let last = self.entities.len() - 1;
        let moved = if index != last {
            Some(self.entities[last])
        } else {
            None
        };
        self.entities.swap_remove(index);
        for col in &mut self.columns {
            col.swap_remove_raw(index);
        }
        moved
    }
}

/// A table of entities sharing the same archetype (set of component types).
///
/// Storage is partitioned into fixed-capacity [`ArchetypeChunk`]s. The table
/// keeps its chunk list append-only; a new chunk is only created once the
/// last chunk is full, and destruction never leaves an empty chunk in the
/// middle of the list (a chunk is only removed when compaction empties it
/// and it is not the sole/last chunk kept around for reuse).
#[derive(Debug, Clone)]
pub struct ArchetypeTable {
    /// The archetype identifier.
    pub id: ArchetypeId,
    /// Sorted set of component type IDs that define this archetype.
    pub component_types: BTreeSet<ComponentTypeId>,
    /// Per-type item sizes, parallel to the sorted `component_types`.
    item_sizes: Vec<usize>,
    /// Ordered list of chunks.
    pub chunks: Vec<ArchetypeChunk>,
}

/// The location of one row inside an [`ArchetypeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLocation {
    pub chunk: usize,
    pub row: usize,
}

impl ArchetypeTable {
    /// Create a new, empty archetype table.
    #[must_use]
    pub fn new(component_types: BTreeSet<ComponentTypeId>, item_sizes: &[usize]) -> Self {
        let id = ArchetypeId::from_component_types(&component_types);
        Self {
            id,
            component_types,
            item_sizes: item_sizes.to_vec(),
            chunks: Vec::new(),
        }
    }

    /// Returns the number of entities in this archetype table, across all chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.iter().map(ArchetypeChunk::len).sum()
    }

    /// Returns `true` if this table has no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.iter().all(ArchetypeChunk::is_empty)
    }

    /// Returns `true` if this archetype contains the given component type.
    #[must_use]
    pub fn has_component(&self, type_id: ComponentTypeId) -> bool {
        self.component_types.contains(&type_id)
    }

    /// Returns the column index for the given component type, if present.
    /// This index is the same across every chunk in the table.
    #[must_use]
    pub fn column_index(&self, type_id: ComponentTypeId) -> Option<usize> {
        self.component_types.iter().position(|&tid| tid == type_id)
    }

    /// Append an entity to the last non-full chunk, spawning a new chunk if
    /// needed. Returns the new row's location. Caller must push matching
    /// component bytes into each column at the same row afterwards.
    pub fn push_entity(&mut self, entity: Ref) -> RowLocation {
        if self.chunks.last().is_none_or(ArchetypeChunk::is_full) {
            self.chunks
                .push(ArchetypeChunk::new(&self.component_types, &self.item_sizes));
        }
        let chunk_index = self.chunks.len() - 1;
        let chunk = &mut self.chunks[chunk_index];
        chunk.entities.push(entity);
        RowLocation {
            chunk: chunk_index,
            row: chunk.entities.len() - 1,
        }
    }

    /// Find the location of a given entity by linear scan of chunks.
    /// Callers holding a cached [`RowLocation`] should prefer that; this is
    /// for cold paths only (tests, debug tooling).
    #[must_use]
    pub fn find_entity(&self, entity: Ref) -> Option<RowLocation> {
        for (chunk_index, chunk) in self.chunks.iter().enumerate() {
            if let Some(row) = chunk.entity_row(entity) {
                return Some(RowLocation {
                    chunk: chunk_index,
                    row,
                });
            }
        }
        None
    }

    /// Remove the row at `location`, keeping the chunk dense. Returns the
    /// entity that was moved into the vacated row (if any), so the caller
    /// (the [`crate::store::Store`]) can update its index-to-location map.
    pub fn remove_row(&mut self, location: RowLocation) -> Option<Ref> {
        self.chunks[location.chunk].swap_remove(location.row)
    }
}
