//! Interest/visibility filtering for outbound packets.
//!
//! The server never pushes every entity's state to every connection — an
//! [`EntityViewer`] decides which connections currently care about which
//! entities (proximity, line of sight, team). The concrete visibility
//! algorithm (spatial hashing, frustum checks, ...) lives outside this crate;
//! this trait is the seam game systems dispatch through.

use engine_component::Ref;

/// Decides whether `viewer` should currently receive updates about `subject`.
pub trait EntityViewer: Send + Sync {
    fn is_visible(&self, viewer: Ref, subject: Ref) -> bool;
}

/// A viewer that can see every entity. Useful for single-connection tools,
/// tests, and as a placeholder before a real interest-management system is
/// wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct OmniscientViewer;

impl EntityViewer for OmniscientViewer {
    fn is_visible(&self, _viewer: Ref, _subject: Ref) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_omniscient_viewer_sees_everything() {
        let viewer = OmniscientViewer;
        assert!(viewer.is_visible(Ref::from_parts(1, 0), Ref::from_parts(2, 0)));
    }
}
