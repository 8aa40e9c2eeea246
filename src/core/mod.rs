//! Core types describing particles, their managed sets, and shared level data.

pub mod particle;
pub mod types;

pub use particle::{ManagesParticles, Particle, ParticleSet, ParticleType};
pub use types::LevelBounds;
