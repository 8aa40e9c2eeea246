//! Utility helpers: particle pool, math extensions, logging and profiling.

pub mod allocator;
pub mod logging;
pub mod math;
pub mod profiling;

pub use allocator::{ParticleArena, ParticleId};
pub use math::*;
pub use profiling::StepProfile;
