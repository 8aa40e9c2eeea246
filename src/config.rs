//! Default constants and construction parameters for the particle world.

use glam::Vec2;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::core::types::LevelBounds;

/// Default gravity vector (Y-up).
pub const DEFAULT_GRAVITY: [f32; 3] = [0.0, -10.0, 0.0];

/// Default per-second velocity retention.
pub const DEFAULT_DAMPING: f32 = 0.99;

/// Default world-space collision radius of a freshly spawned particle.
pub const DEFAULT_PARTICLE_RADIUS: f32 = 1.0;

/// Restitution of the simple ground plane.
pub const DEFAULT_GROUND_RESTITUTION: f32 = 0.2;

/// Number of particles pre-allocated in the pool.
pub const DEFAULT_POOL_SIZE: usize = 5000;

/// Capacity of the per-frame contact buffer.
pub const DEFAULT_MAX_CONTACTS: usize = 50_000;

/// Half extents of the default level (matches a 1280x720 view).
pub const DEFAULT_LEVEL_HALF_EXTENTS: [f32; 2] = [640.0, 360.0];

/// Zero requests `2 × contacts` resolver iterations every frame.
pub const AUTO_RESOLVER_ITERATIONS: u32 = 0;

/// Construction parameters of a [`crate::world::ParticleWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub pool_size: usize,
    pub max_contacts: usize,
    pub level_bounds: LevelBounds,
    /// Fixed resolver budget, or [`AUTO_RESOLVER_ITERATIONS`].
    pub resolver_iterations: u32,
    pub parallel: bool,
    /// Steps slower than this are reported with `warn!`.
    pub frame_budget_ms: Option<f32>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            max_contacts: DEFAULT_MAX_CONTACTS,
            level_bounds: LevelBounds::from_half_extents(Vec2::from_array(
                DEFAULT_LEVEL_HALF_EXTENTS,
            )),
            resolver_iterations: AUTO_RESOLVER_ITERATIONS,
            parallel: false,
            frame_budget_ms: None,
        }
    }
}

impl WorldConfig {
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_max_contacts(mut self, max_contacts: usize) -> Self {
        self.max_contacts = max_contacts;
        self
    }

    pub fn with_level_bounds(mut self, level_bounds: LevelBounds) -> Self {
        self.level_bounds = level_bounds;
        self
    }

    pub fn with_resolver_iterations(mut self, iterations: u32) -> Self {
        self.resolver_iterations = iterations;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_frame_budget_ms(mut self, budget_ms: f32) -> Self {
        self.frame_budget_ms = Some(budget_ms);
        self
    }

    /// Resolver budget derives from the contact count each frame.
    pub fn auto_iterations(&self) -> bool {
        self.resolver_iterations == AUTO_RESOLVER_ITERATIONS
    }

    /// Returns a copy with unusable values corrected, logging each correction.
    pub fn sanitized(mut self) -> Self {
        if self.pool_size == 0 {
            warn!("pool_size of 0 requested, using 1");
            self.pool_size = 1;
        }
        if self.max_contacts == 0 {
            warn!("max_contacts of 0 requested, using 1");
            self.max_contacts = 1;
        }
        let bounds = self.level_bounds;
        if bounds.min.x > bounds.max.x || bounds.min.y > bounds.max.y {
            warn!("inverted level bounds {bounds:?}, reordering corners");
            self.level_bounds = LevelBounds::new(bounds.min.min(bounds.max), bounds.min.max(bounds.max));
        }
        if let Some(budget) = self.frame_budget_ms {
            if budget.is_nan() || budget <= 0.0 {
                warn!("frame budget of {budget} ms ignored");
                self.frame_budget_ms = None;
            }
        }
        self
    }
}
