//! Concurrent, read-heavy asset/config lookup.
//!
//! Loading and hot-reloading the underlying asset data (from disk, from a
//! package format, over the network) is out of scope here — this crate only
//! owns the in-memory lookup table that game systems read from by string id.
//! Whatever owns loading calls [`AssetRegistry::register`] to populate or
//! replace an entry; readers never block on it.

use std::any::Any;
use std::sync::Arc;

use dashmap::DashMap;

/// A concurrent table of named, type-erased config/asset values.
///
/// Entries are looked up by a string id and a static type — `get::<T>(id)`
/// returns `None` both when the id is absent and when it holds a value of a
/// different type, since callers typically can't tell those apart anyway
/// (a renamed or re-typed asset should fail the same way a missing one does).
#[derive(Default)]
pub struct AssetRegistry {
    entries: DashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl AssetRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the value stored under `id`.
    pub fn register<T: Send + Sync + 'static>(&self, id: impl Into<String>, value: T) {
        self.entries.insert(id.into(), Arc::new(value));
    }

    /// Remove the value stored under `id`, if any.
    pub fn unregister(&self, id: &str) {
        self.entries.remove(id);
    }

    /// Look up the value stored under `id`, cloning it out.
    #[must_use]
    pub fn get<T: Send + Sync + Clone + 'static>(&self, id: &str) -> Option<T> {
        self.entries
            .get(id)
            .and_then(|entry| entry.value().downcast_ref::<T>().cloned())
    }

    /// Returns `true` if some value (of any type) is registered under `id`.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
