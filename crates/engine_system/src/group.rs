//! Ordered system groups.
//!
//! A tick runs every group in [`SystemGroup::ORDER`], in order, with a full
//! sync phase between groups. Systems within the same group may run in
//! parallel stages (see [`crate::scheduler::Scheduler`]); systems in
//! different groups never do.

use serde::{Deserialize, Serialize};

/// A named phase of a tick. Groups run strictly in [`SystemGroup::ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemGroup {
    /// Collect `Damage` records produced this tick (hit detection, DoT ticks, fall damage, ...).
    GatherDamage,
    /// Discard or reduce gathered damage (invulnerability, armor, shields).
    FilterDamage,
    /// Apply the surviving damage to `Health`, attaching `DeathComponent` on lethal hits.
    ApplyDamage,
    /// Read-only observers of this tick's applied damage (analytics, kill feed staging).
    InspectDamage,
    /// Physics setup that must see last tick's final transforms (un-stick, sleep/wake).
    PrePhysics,
    /// Integrate gravity, collision, sliding/resting, fluid buoyancy, item merging.
    Physics,
    /// Physics consumers that need this tick's resolved transforms (pickup interpolation).
    PostPhysics,
    /// Flush spatial/interest trackers after all structural changes have synced.
    TrackerQueueUpdate,
}

impl SystemGroup {
    /// The fixed order groups execute in during a tick.
    pub const ORDER: [SystemGroup; 8] = [
        SystemGroup::GatherDamage,
        SystemGroup::FilterDamage,
        SystemGroup::ApplyDamage,
        SystemGroup::InspectDamage,
        SystemGroup::PrePhysics,
        SystemGroup::Physics,
        SystemGroup::PostPhysics,
        SystemGroup::TrackerQueueUpdate,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for g in SystemGroup::ORDER {
            assert!(seen.insert(g));
        }
    }

    #[test]
    fn test_damage_groups_precede_physics_groups() {
        let idx = |g: SystemGroup| SystemGroup::ORDER.iter().position(|&x| x == g).unwrap();
        assert!(idx(SystemGroup::ApplyDamage) < idx(SystemGroup::PrePhysics));
        assert!(idx(SystemGroup::PrePhysics) < idx(SystemGroup::Physics));
        assert!(idx(SystemGroup::Physics) < idx(SystemGroup::PostPhysics));
        assert!(idx(SystemGroup::PostPhysics) < idx(SystemGroup::TrackerQueueUpdate));
    }
}
