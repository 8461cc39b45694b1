//! Collaborator traits the container calls through but does not itself
//! implement — resolving an abstract resource or tag index to the concrete
//! descriptor ids it covers lives in the catalog layer, out of scope here.
//! Each trait ships a trivial reference implementation so the container is
//! runnable and testable standalone.

/// Decides whether a concrete item descriptor satisfies an abstract
/// resource query (e.g. `"wood_log"` and `"oak_log"` both satisfying a
/// `"wood"` resource request).
pub trait ResourceResolver: Send + Sync {
    fn matches(&self, descriptor_id: &str, resource_id: &str) -> bool;
}

/// Resolves a tag index to the ordered set of descriptor ids it covers. The
/// first member is used as the descriptor for any newly created stack when
/// a tag-based add has to fill an empty slot.
pub trait TagResolver: Send + Sync {
    fn members(&self, tag_index: i32) -> Vec<String>;
}

/// Matches a resource query only against the identically-named descriptor.
/// The default until a real catalog-backed resolver (grouping multiple
/// descriptors under one resource id) is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactResourceResolver;

impl ResourceResolver for ExactResourceResolver {
    fn matches(&self, descriptor_id: &str, resource_id: &str) -> bool {
        descriptor_id == resource_id
    }
}

/// A tag resolver with no members for any tag. Every `add_by_tag` call
/// against it fails to place anything; used by tests and as the default
/// before a real tag catalog is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyTagResolver;

impl TagResolver for EmptyTagResolver {
    fn members(&self, _tag_index: i32) -> Vec<String> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_resolver_matches_identical_id_only() {
        let resolver = ExactResourceResolver;
        assert!(resolver.matches("stone", "stone"));
        assert!(!resolver.matches("stone", "dirt"));
    }

    #[test]
    fn test_empty_tag_resolver_has_no_members() {
        assert!(EmptyTagResolver.members(0).is_empty());
    }
}
