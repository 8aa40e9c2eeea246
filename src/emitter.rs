//! Continuous snow spawner.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{
    core::particle::{ManagesParticles, ParticleType},
    utils::{allocator::ParticleId, math::rotate_z_degrees},
    world::ParticleWorld,
};

pub const SNOW_MASS: f32 = 2.0;
pub const SNOW_SPEED: f32 = 50.0;

/// Downward acceleration given to snow, gentler than regular gravity.
pub const DEFAULT_SNOW_GRAVITY: [f32; 3] = [0.0, -5.0, 0.0];

/// Emits one snow particle per update along a direction that sweeps about +Z.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlizzardEmitter {
    pub position: Vec3,
    pub gravity: Vec3,
    /// Degrees per second; negative sweeps clockwise.
    pub rotation_speed: f32,
    direction: Vec3,
    /// Indices of the world's contact generators that receive each new flake.
    contact_generators: Vec<usize>,
}

impl BlizzardEmitter {
    pub fn new(position: Vec3, rotation_speed: f32) -> Self {
        Self {
            position,
            gravity: Vec3::from_array(DEFAULT_SNOW_GRAVITY),
            rotation_speed,
            direction: Vec3::Y,
            contact_generators: Vec::new(),
        }
    }

    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_contact_generators(mut self, generators: impl IntoIterator<Item = usize>) -> Self {
        self.contact_generators = generators.into_iter().collect();
        self
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    pub fn set_rotation_speed(&mut self, rotation_speed: f32) {
        self.rotation_speed = rotation_speed;
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn contact_generators(&self) -> &[usize] {
        &self.contact_generators
    }

    /// Advances the sweep and spawns one flake. Returns `None` when the pool is empty.
    pub fn update(&mut self, world: &mut ParticleWorld, dt: f32) -> Option<ParticleId> {
        self.direction = rotate_z_degrees(self.direction, self.rotation_speed * dt);
        self.emit(world)
    }

    fn emit(&self, world: &mut ParticleWorld) -> Option<ParticleId> {
        let id = world.get_new_particle()?;
        if let Some(particle) = world.particle_mut(id) {
            particle.set_position(self.position);
            particle.set_mass(SNOW_MASS);
            particle.set_velocity(self.direction * SNOW_SPEED);
            particle.set_acceleration(self.gravity);
            particle.set_radius(SNOW_MASS);
            particle.set_bounciness(0.0);
            particle.set_particle_type(ParticleType::Snow);
        }

        for &index in &self.contact_generators {
            if let Some(generator) = world.contact_generator_mut(index) {
                generator.add_particle(id);
            }
        }
        Some(id)
    }
}
