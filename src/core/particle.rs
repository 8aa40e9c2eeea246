use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_DAMPING, DEFAULT_PARTICLE_RADIUS};
use crate::utils::allocator::ParticleId;

/// Category tag consulted only by particle-vs-particle destruction rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ParticleType {
    #[default]
    None,
    Ball,
    Snow,
    Cloth,
}

impl ParticleType {
    /// Whether a particle of this type is removed on touching `other`.
    pub fn destroyed_by(self, other: ParticleType) -> bool {
        matches!(
            (self, other),
            (ParticleType::Snow, ParticleType::Ball) | (ParticleType::Snow, ParticleType::Cloth)
        )
    }

    /// Snow never collides with snow.
    pub fn collides_with(self, other: ParticleType) -> bool {
        !(self == ParticleType::Snow && other == ParticleType::Snow)
    }
}

/// Point mass with a collision radius.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    position: Vec3,
    velocity: Vec3,
    /// Persistent external field such as gravity. Survives across steps.
    acceleration: Vec3,
    /// Cleared every step.
    force_accumulator: Vec3,
    /// In (0, 1]; velocity is scaled by `damping^dt` each step.
    damping: f32,
    mass: f32,
    inverse_mass: f32,
    radius: f32,
    bounciness: f32,
    active: bool,
    particle_type: ParticleType,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            force_accumulator: Vec3::ZERO,
            damping: DEFAULT_DAMPING,
            mass: 1.0,
            inverse_mass: 1.0,
            radius: DEFAULT_PARTICLE_RADIUS,
            bounciness: 0.0,
            active: false,
            particle_type: ParticleType::None,
        }
    }
}

impl Particle {
    /// Semi-implicit Euler step. Infinite-mass particles never move.
    ///
    /// `dt` must be positive. Debug builds assert on it; release builds
    /// leave the particle untouched.
    pub fn integrate(&mut self, dt: f32) {
        if self.inverse_mass <= 0.0 {
            return;
        }
        debug_assert!(dt > 0.0, "integration step must be positive, got {dt}");
        if dt <= 0.0 {
            return;
        }

        self.position += self.velocity * dt;

        let resulting_acceleration = self.acceleration + self.force_accumulator * self.inverse_mass;
        self.velocity += resulting_acceleration * dt;
        self.velocity *= self.damping.powf(dt);

        self.clear_force_accumulator();
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    pub fn acceleration(&self) -> Vec3 {
        self.acceleration
    }

    pub fn set_acceleration(&mut self, acceleration: Vec3) {
        self.acceleration = acceleration;
    }

    pub fn damping(&self) -> f32 {
        self.damping
    }

    /// Clamped into (0, 1].
    pub fn set_damping(&mut self, damping: f32) {
        self.damping = damping.clamp(f32::MIN_POSITIVE, 1.0);
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Non-positive or non-finite masses make the particle immovable.
    pub fn set_mass(&mut self, mass: f32) {
        self.mass = mass;
        self.inverse_mass = if mass.is_finite() && mass > f32::EPSILON {
            1.0 / mass
        } else {
            0.0
        };
    }

    pub fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    pub fn set_inverse_mass(&mut self, inverse_mass: f32) {
        self.inverse_mass = inverse_mass.max(0.0);
        self.mass = if self.inverse_mass > 0.0 {
            1.0 / self.inverse_mass
        } else {
            f32::INFINITY
        };
    }

    pub fn has_finite_mass(&self) -> bool {
        self.inverse_mass > 0.0
    }

    pub fn add_force(&mut self, force: Vec3) {
        self.force_accumulator += force;
    }

    pub fn accumulated_force(&self) -> Vec3 {
        self.force_accumulator
    }

    pub fn clear_force_accumulator(&mut self) {
        self.force_accumulator = Vec3::ZERO;
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
    }

    pub fn bounciness(&self) -> f32 {
        self.bounciness
    }

    pub fn set_bounciness(&mut self, bounciness: f32) {
        self.bounciness = bounciness;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn particle_type(&self) -> ParticleType {
        self.particle_type
    }

    pub fn set_particle_type(&mut self, particle_type: ParticleType) {
        self.particle_type = particle_type;
    }
}

/// Non-owning set of particle handles managed by a contact generator,
/// emitter or renderer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticleSet {
    particles: Vec<ParticleId>,
}

impl ParticleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: ParticleId) {
        self.particles.push(id);
    }

    pub fn add_all(&mut self, ids: &[ParticleId]) {
        self.particles.extend_from_slice(ids);
    }

    /// Removes every occurrence of `id`.
    pub fn remove(&mut self, id: ParticleId) {
        self.particles.retain(|managed| *managed != id);
    }

    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&ParticleId) -> bool,
    {
        self.particles.retain(keep);
    }

    pub fn contains(&self, id: ParticleId) -> bool {
        self.particles.contains(&id)
    }

    pub fn particles(&self) -> &[ParticleId] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}

/// Shared contract for anything that keeps its own set of managed particles.
pub trait ManagesParticles {
    fn particle_set(&self) -> &ParticleSet;
    fn particle_set_mut(&mut self) -> &mut ParticleSet;

    fn add_particle(&mut self, id: ParticleId) {
        self.particle_set_mut().add(id);
    }

    fn add_particles(&mut self, ids: &[ParticleId]) {
        self.particle_set_mut().add_all(ids);
    }

    fn remove_particle(&mut self, id: ParticleId) {
        self.particle_set_mut().remove(id);
    }

    fn particles(&self) -> &[ParticleId] {
        self.particle_set().particles()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn moving_particle() -> Particle {
        let mut particle = Particle::default();
        particle.set_active(true);
        particle.set_mass(2.0);
        particle.set_position(Vec3::new(1.0, 2.0, 0.0));
        particle.set_velocity(Vec3::new(3.0, -4.0, 0.0));
        particle.set_damping(0.5);
        particle
    }

    #[test]
    fn free_particle_only_decays_by_damping() {
        let mut particle = moving_particle();
        let dt = 0.25;
        particle.integrate(dt);

        let decay = 0.5_f32.powf(dt);
        assert_relative_eq!(particle.position(), Vec3::new(1.75, 1.0, 0.0));
        assert_relative_eq!(particle.velocity(), Vec3::new(3.0, -4.0, 0.0) * decay);
    }

    #[test]
    fn infinite_mass_never_moves() {
        let mut particle = moving_particle();
        particle.set_inverse_mass(0.0);
        particle.set_acceleration(Vec3::new(0.0, -10.0, 0.0));
        particle.add_force(Vec3::new(100.0, 0.0, 0.0));

        particle.integrate(0.1);

        assert_eq!(particle.position(), Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(particle.velocity(), Vec3::new(3.0, -4.0, 0.0));
    }

    #[test]
    fn integrate_applies_force_then_clears_it() {
        let mut particle = Particle::default();
        particle.set_active(true);
        particle.set_damping(1.0);
        particle.set_mass(2.0);
        particle.set_acceleration(Vec3::new(0.0, -10.0, 0.0));
        particle.add_force(Vec3::new(4.0, 0.0, 0.0));

        particle.integrate(0.5);

        assert_eq!(particle.position(), Vec3::ZERO);
        assert_relative_eq!(particle.velocity(), Vec3::new(1.0, -5.0, 0.0));
        assert_eq!(particle.accumulated_force(), Vec3::ZERO);
    }

    #[test]
    fn non_positive_mass_maps_to_infinite_mass() {
        let mut particle = Particle::default();
        particle.set_mass(0.0);
        assert!(!particle.has_finite_mass());
        particle.set_mass(-3.0);
        assert_eq!(particle.inverse_mass(), 0.0);
        particle.set_mass(4.0);
        assert_relative_eq!(particle.inverse_mass(), 0.25);
    }

    #[test]
    fn snow_is_destroyed_by_balls_and_cloth_only() {
        assert!(ParticleType::Snow.destroyed_by(ParticleType::Ball));
        assert!(ParticleType::Snow.destroyed_by(ParticleType::Cloth));
        assert!(!ParticleType::Ball.destroyed_by(ParticleType::Snow));
        assert!(!ParticleType::Snow.destroyed_by(ParticleType::Snow));
        assert!(!ParticleType::Snow.collides_with(ParticleType::Snow));
        assert!(ParticleType::Ball.collides_with(ParticleType::Ball));
    }

    #[test]
    fn particle_set_removes_all_duplicates() {
        let mut set = ParticleSet::new();
        let id = ParticleId::new(3, 0);
        set.add(id);
        set.add(ParticleId::new(4, 0));
        set.add(id);
        set.remove(id);
        assert_eq!(set.particles(), &[ParticleId::new(4, 0)]);
    }
}
