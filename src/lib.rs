//! Particle Engine – real-time 2D particle physics for Rust.
//!
//! A pooled particle world driven once per frame: force generators accumulate
//! forces, particles integrate, contact generators detect ground, platform and
//! particle-pair contacts, and a greedy resolver applies impulses and
//! positional corrections.

pub mod cloth;
pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod emitter;
pub mod utils;
pub mod world;

use std::time::Instant;

pub use glam::{Vec2, Vec3};

pub use cloth::{Cloth, ClothBuilder};
pub use collision::{
    contact::ParticleContact,
    generators::{ContactGenerator, GeneratesContacts},
    ground::GroundContactGenerator,
    pairs::ParticlePairContactGenerator,
    platform::{Platform, PlatformContactGenerator},
};
pub use config::WorldConfig;
pub use crate::core::{
    particle::{ManagesParticles, Particle, ParticleSet, ParticleType},
    types::LevelBounds,
};
pub use dynamics::{
    forces::{
        AnchoredBungeeForce, AnchoredFakeStiffSpringForce, AnchoredSpringForce, BungeeForce,
        DragForce, FakeStiffSpringForce, ForceGenerator, ForceGeneratorId, ForceRegistry,
        GravityForce, ParticleForce, SpringForce,
    },
    integrator::Integrator,
    solver::ContactResolver,
};
pub use emitter::BlizzardEmitter;
pub use utils::{
    allocator::{ParticleArena, ParticleId},
    profiling::StepProfile,
};
pub use world::ParticleWorld;

/// High-level convenience wrapper that owns a [`ParticleWorld`] and its emitters.
#[derive(Debug, Default)]
pub struct ParticleEngine {
    world: ParticleWorld,
    emitters: Vec<BlizzardEmitter>,
}

impl ParticleEngine {
    pub fn new(config: WorldConfig) -> Self {
        Self {
            world: ParticleWorld::new(config),
            emitters: Vec::new(),
        }
    }

    pub fn world(&self) -> &ParticleWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut ParticleWorld {
        &mut self.world
    }

    /// Adds an emitter updated every frame and returns its index.
    pub fn add_emitter(&mut self, emitter: BlizzardEmitter) -> usize {
        self.emitters.push(emitter);
        self.emitters.len() - 1
    }

    pub fn emitters(&self) -> &[BlizzardEmitter] {
        &self.emitters
    }

    pub fn emitter_mut(&mut self, index: usize) -> Option<&mut BlizzardEmitter> {
        self.emitters.get_mut(index)
    }

    /// Runs one frame: start the frame, let emitters spawn, then step physics.
    pub fn update(&mut self, dt: f32) {
        let start = Instant::now();

        self.world.start_frame();
        for emitter in &mut self.emitters {
            emitter.update(&mut self.world, dt);
        }
        self.world.run_physics(dt);

        if let Some(budget_ms) = self.world.frame_budget_ms() {
            utils::logging::warn_if_frame_budget_exceeded(start.elapsed(), budget_ms);
        }
    }

    /// Enables or disables parallel integration.
    pub fn set_parallel_enabled(&mut self, enabled: bool) {
        self.world.set_parallel_enabled(enabled);
    }

    /// Returns whether the engine is currently using parallel integration.
    pub fn parallel_enabled(&self) -> bool {
        self.world.parallel_enabled()
    }

    /// Immutable access to a particle by handle.
    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.world.particle(id)
    }

    /// Mutable access to a particle by handle.
    pub fn particle_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.world.particle_mut(id)
    }
}
