//! The ephemeral per-tick `Damage` record and the `Health` stat it is
//! applied against.
//!
//! `Damage` is attached to a target entity as a plain component for exactly
//! one tick: `GatherDamage` systems `add_component` it, `FilterDamage`
//! systems adjust it in place via `set_component`, `ApplyDamage` consumes it,
//! and `InspectDamage`'s cleanup step removes it so it never leaks into the
//! next tick. A second `GatherDamage` system targeting the same entity in the
//! same tick simply replaces the first's record — the same last-writer-wins
//! rule the store already applies to any duplicate component add.

use engine_assets::DamageCause;
use engine_component::{Component, Ref};
use serde::{Deserialize, Serialize};

/// One instance of damage in flight against a target entity this tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Damage {
    pub source: Option<Ref>,
    pub cause: DamageCause,
    pub amount: f32,
    pub zone: Option<String>,
    pub cancelled: bool,
}

impl Damage {
    #[must_use]
    pub fn new(cause: DamageCause, amount: f32) -> Self {
        Self {
            source: None,
            cause,
            amount,
            zone: None,
            cancelled: false,
        }
    }

    #[must_use]
    pub fn from_source(source: Ref, cause: DamageCause, amount: f32) -> Self {
        Self {
            source: Some(source),
            cause,
            amount,
            zone: None,
            cancelled: false,
        }
    }

    #[must_use]
    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }
}

impl Component for Damage {
    fn type_name() -> &'static str {
        "Damage"
    }
}

/// A simple current/max health stat. Real deployments may back this with a
/// richer stat-map component; the pipeline only ever reads/writes `current`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    #[must_use]
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }
}

impl Component for Health {
    fn type_name() -> &'static str {
        "Health"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_is_dead_at_zero() {
        let mut health = Health::new(10.0);
        health.current = 0.0;
        assert!(health.is_dead());
    }

    #[test]
    fn test_health_not_dead_above_zero() {
        let health = Health::new(10.0);
        assert!(!health.is_dead());
    }

    #[test]
    fn test_damage_builder_sets_zone() {
        let d = Damage::new(DamageCause::Fall, 5.0).with_zone("leg");
        assert_eq!(d.zone.as_deref(), Some("leg"));
        assert!(!d.cancelled);
    }
}
