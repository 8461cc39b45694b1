//! Linear and angular velocity component.

use engine_component::Component;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Linear and angular velocity, in world units/second and radians/second.
///
/// Shared by every system that moves entities over time: item physics,
/// projectile ballistics, and any future locomotion system all read and
/// write this same component rather than each keeping their own copy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Velocity {
    pub linear: Vec3,
    pub angular: Vec3,
}

impl Velocity {
    pub const ZERO: Self = Self {
        linear: Vec3::ZERO,
        angular: Vec3::ZERO,
    };

    #[must_use]
    pub fn linear(linear: Vec3) -> Self {
        Self {
            linear,
            ..Self::ZERO
        }
    }

    #[must_use]
    pub fn speed(&self) -> f32 {
        self.linear.length()
    }
}

impl Default for Velocity {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Component for Velocity {
    fn type_name() -> &'static str {
        "Velocity"
    }
}
