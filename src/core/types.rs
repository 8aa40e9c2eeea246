use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_LEVEL_HALF_EXTENTS;

/// Axis-aligned level rectangle in the XY plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Default for LevelBounds {
    fn default() -> Self {
        Self::from_half_extents(Vec2::from_array(DEFAULT_LEVEL_HALF_EXTENTS))
    }
}

impl LevelBounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Rectangle centred on the origin.
    pub fn from_half_extents(half_extents: Vec2) -> Self {
        Self {
            min: -half_extents,
            max: half_extents,
        }
    }

    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// Only the floor is enforced; particles may leave through the sides or top.
    pub fn is_below_floor(&self, position: Vec3) -> bool {
        position.y < self.min.y
    }

    pub fn contains(&self, position: Vec3) -> bool {
        position.x >= self.min.x
            && position.x <= self.max.x
            && position.y >= self.min.y
            && position.y <= self.max.y
    }
}
