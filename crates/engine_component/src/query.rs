//! Query descriptors for system data access declarations.
//!
//! A [`QueryDescriptor`] declares which component types a system reads,
//! writes, requires, excludes, and treats as optional. The scheduler uses
//! this information to match archetypes, detect read/write conflicts
//! between systems, and plan execution stages.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::component::ComponentTypeId;

/// Describes the data access requirements of a system.
///
/// Systems declare their queries at registration time. The scheduler uses
/// this information to:
///
/// 1. Select matching archetypes — those containing every `requires`/`reads`/
///    `writes` type and none of the `excludes` types.
/// 2. Detect read/write conflicts between systems for stage scheduling.
/// 3. Determine which component columns a system is allowed to touch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryDescriptor {
    /// Component types the system reads immutably.
    pub reads: Vec<ComponentTypeId>,
    /// Component types the system writes (mutable access).
    pub writes: Vec<ComponentTypeId>,
    /// Component types that are optional — the system can handle entities
    /// that do or do not have these components.
    pub optionals: Vec<ComponentTypeId>,
    /// Component types that must be absent from a matching archetype.
    pub excludes: Vec<ComponentTypeId>,
    /// Filters applied to the query (e.g. `Changed<T>`), orthogonal to the
    /// structural requires/excludes/optional split above.
    pub filters: Vec<QueryFilter>,
}

impl QueryDescriptor {
    /// Create a new empty query descriptor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reads: Vec::new(),
            writes: Vec::new(),
            optionals: Vec::new(),
            excludes: Vec::new(),
            filters: Vec::new(),
        }
    }

    /// Add a read-only component requirement.
    #[must_use]
    pub fn read(mut self, type_id: ComponentTypeId) -> Self {
        self.reads.push(type_id);
        self
    }

    /// Add a mutable component requirement.
    #[must_use]
    pub fn write(mut self, type_id: ComponentTypeId) -> Self {
        self.writes.push(type_id);
        self
    }

    /// Add an optional component.
    #[must_use]
    pub fn optional(mut self, type_id: ComponentTypeId) -> Self {
        self.optionals.push(type_id);
        self
    }

    /// Require that matching archetypes do NOT contain this component type.
    #[must_use]
    pub fn exclude(mut self, type_id: ComponentTypeId) -> Self {
        self.excludes.push(type_id);
        self
    }

    /// Add a query filter.
    #[must_use]
    pub fn filter(mut self, f: QueryFilter) -> Self {
        self.filters.push(f);
        self
    }

    /// Returns all component types that this query accesses (reads + writes + optionals).
    #[must_use]
    pub fn all_accessed_types(&self) -> Vec<ComponentTypeId> {
        let mut types = Vec::new();
        types.extend_from_slice(&self.reads);
        types.extend_from_slice(&self.writes);
        types.extend_from_slice(&self.optionals);
        types
    }

    /// Returns the set of required component types (reads + writes, excluding optionals).
    #[must_use]
    pub fn required_types(&self) -> Vec<ComponentTypeId> {
        let mut types = Vec::new();
        types.extend_from_slice(&self.reads);
        types.extend_from_slice(&self.writes);
        types
    }

    /// Returns `true` if an archetype with the given component types matches
    /// this query: every required type is present, and every excluded type
    /// is absent.
    #[must_use]
    pub fn matches(&self, archetype_types: &BTreeSet<ComponentTypeId>) -> bool {
        self.required_types()
            .iter()
            .all(|ty| archetype_types.contains(ty))
            && self.excludes.iter().all(|ty| !archetype_types.contains(ty))
    }

    /// Checks whether this query conflicts with another.
    ///
    /// Two queries conflict when one writes a component type that the other
    /// reads or writes:
    ///
    /// ```text
    /// A.writes ∩ (B.reads ∪ B.writes) ≠ ∅  OR
    /// B.writes ∩ (A.reads ∪ A.writes) ≠ ∅
    /// ```
    #[must_use]
    pub fn conflicts_with(&self, other: &QueryDescriptor) -> bool {
        // Check if any of our writes overlap with their reads or writes.
        for w in &self.writes {
            if other.reads.contains(w) || other.writes.contains(w) {
                return true;
            }
        }
        // Check if any of their writes overlap with our reads or writes.
        for w in &other.writes {
            if self.reads.contains(w) || self.writes.contains(w) {
                return true;
            }
        }
        false
    }
}

impl Default for QueryDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

/// A filter that narrows the set of entities matched by a query, orthogonal
/// to the structural requires/excludes/optional split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum QueryFilter {
    /// Only match entities that have this component.
    With(ComponentTypeId),
    /// Only match entities that do NOT have this component.
    Without(ComponentTypeId),
    /// Only match entities where this component has changed since the last tick.
    Changed(ComponentTypeId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_conflict_both_read() {
        let transform = ComponentTypeId(1);

        let q1 = QueryDescriptor::new().read(transform);
        let q2 = QueryDescriptor::new().read(transform);

        assert!(!q1.conflicts_with(&q2));
    }

    #[test]
    fn test_conflict_read_vs_write() {
        let transform = ComponentTypeId(1);

        let q1 = QueryDescriptor::new().read(transform);
        let q2 = QueryDescriptor::new().write(transform);

        assert!(q1.conflicts_with(&q2));
    }

    #[test]
    fn test_conflict_write_vs_write() {
        let velocity = ComponentTypeId(2);

        let q1 = QueryDescriptor::new().write(velocity);
        let q2 = QueryDescriptor::new().write(velocity);

        assert!(q1.conflicts_with(&q2));
    }

    #[test]
    fn test_no_conflict_different_types() {
        let velocity = ComponentTypeId(2);
        let ai_state = ComponentTypeId(3);
        let transform = ComponentTypeId(1);

        let physics = QueryDescriptor::new().read(transform).write(velocity);
        let ai = QueryDescriptor::new().read(transform).write(ai_state);

        assert!(!physics.conflicts_with(&ai));
    }

    #[test]
    fn test_conflict_movement_vs_physics() {
        let transform = ComponentTypeId(1);
        let velocity = ComponentTypeId(2);

        let physics = QueryDescriptor::new().read(transform).write(velocity);
        let movement = QueryDescriptor::new().read(velocity).write(transform);

        assert!(physics.conflicts_with(&movement));
    }

    #[test]
    fn test_required_types() {
        let a = ComponentTypeId(1);
        let b = ComponentTypeId(2);
        let c = ComponentTypeId(3);

        let q = QueryDescriptor::new().read(a).write(b).optional(c);

        let required = q.required_types();
        assert!(required.contains(&a));
        assert!(required.contains(&b));
        assert!(!required.contains(&c));
    }

    #[test]
    fn test_matches_respects_excludes() {
        let item = ComponentTypeId(1);
        let prevent_pickup = ComponentTypeId(2);

        let q = QueryDescriptor::new().read(item).exclude(prevent_pickup);

        let mut with_only_item = BTreeSet::new();
        with_only_item.insert(item);
        assert!(q.matches(&with_only_item));

        let mut with_both = BTreeSet::new();
        with_both.insert(item);
        with_both.insert(prevent_pickup);
        assert!(!q.matches(&with_both));
    }

    #[test]
    fn test_matches_requires_all_required_types() {
        let a = ComponentTypeId(1);
        let b = ComponentTypeId(2);
        let q = QueryDescriptor::new().read(a).write(b);

        let mut only_a = BTreeSet::new();
        only_a.insert(a);
        assert!(!q.matches(&only_a));
    }
}
