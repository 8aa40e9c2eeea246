use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::utils::allocator::{ParticleArena, ParticleId};

/// A single contact between a particle and either another particle or static scenery.
///
/// `normal` points from the second body toward `particle`, so resolving the
/// contact pushes `particle` along `+normal` and `other` along `-normal`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleContact {
    pub particle: ParticleId,
    /// `None` for contacts with the scenery.
    pub other: Option<ParticleId>,
    pub normal: Vec3,
    pub penetration: f32,
    pub restitution: f32,
    /// Displacement applied to each side by the last interpenetration pass.
    pub movement: [Vec3; 2],
}

impl ParticleContact {
    pub fn with_scenery(particle: ParticleId, normal: Vec3, penetration: f32, restitution: f32) -> Self {
        Self {
            particle,
            other: None,
            normal,
            penetration,
            restitution,
            movement: [Vec3::ZERO; 2],
        }
    }

    pub fn between(
        particle: ParticleId,
        other: ParticleId,
        normal: Vec3,
        penetration: f32,
        restitution: f32,
    ) -> Self {
        Self {
            particle,
            other: Some(other),
            normal,
            penetration,
            restitution,
            movement: [Vec3::ZERO; 2],
        }
    }

    /// Velocity and position correction for this contact.
    pub fn resolve(&mut self, particles: &mut ParticleArena, dt: f32) {
        self.resolve_velocity(particles, dt);
        self.resolve_interpenetration(particles);
    }

    /// Relative velocity along the normal; negative when closing.
    pub fn separating_velocity(&self, particles: &ParticleArena) -> f32 {
        let mut relative = particles
            .get(self.particle)
            .map(|p| p.velocity())
            .unwrap_or(Vec3::ZERO);
        if let Some(other) = self.other.and_then(|id| particles.get(id)) {
            relative -= other.velocity();
        }
        relative.dot(self.normal)
    }

    fn total_inverse_mass(&self, particles: &ParticleArena) -> f32 {
        let mut total = particles
            .get(self.particle)
            .map(|p| p.inverse_mass())
            .unwrap_or(0.0);
        if let Some(other) = self.other.and_then(|id| particles.get(id)) {
            total += other.inverse_mass();
        }
        total
    }

    fn relative_acceleration(&self, particles: &ParticleArena) -> Vec3 {
        let mut acceleration = particles
            .get(self.particle)
            .map(|p| p.acceleration())
            .unwrap_or(Vec3::ZERO);
        if let Some(other) = self.other.and_then(|id| particles.get(id)) {
            acceleration -= other.acceleration();
        }
        acceleration
    }

    /// Applies the impulse that turns the closing velocity into a bounce.
    pub fn resolve_velocity(&mut self, particles: &mut ParticleArena, dt: f32) {
        let separating_velocity = self.separating_velocity(particles);
        if separating_velocity >= 0.0 {
            return;
        }

        let mut new_separating_velocity = -separating_velocity * self.restitution;

        // Closing speed built up by this step's acceleration alone is not
        // bounced back, otherwise resting contacts jitter.
        let acceleration_separating = self.relative_acceleration(particles).dot(self.normal) * dt;
        if acceleration_separating < 0.0 {
            new_separating_velocity += self.restitution * acceleration_separating;
            new_separating_velocity = new_separating_velocity.max(0.0);
        }

        let delta_velocity = new_separating_velocity - separating_velocity;

        let total_inverse_mass = self.total_inverse_mass(particles);
        if total_inverse_mass <= 0.0 {
            return;
        }

        let impulse_per_inverse_mass = self.normal * (delta_velocity / total_inverse_mass);

        if let Some(particle) = particles.get_mut(self.particle) {
            let velocity = particle.velocity() + impulse_per_inverse_mass * particle.inverse_mass();
            particle.set_velocity(velocity);
        }
        if let Some(other) = self.other.and_then(|id| particles.get_mut(id)) {
            let velocity = other.velocity() - impulse_per_inverse_mass * other.inverse_mass();
            other.set_velocity(velocity);
        }
    }

    /// Moves both sides apart along the normal in proportion to inverse mass.
    /// Records the applied displacement in `movement`.
    pub fn resolve_interpenetration(&mut self, particles: &mut ParticleArena) {
        self.movement = [Vec3::ZERO; 2];
        if self.penetration <= 0.0 {
            return;
        }

        let total_inverse_mass = self.total_inverse_mass(particles);
        if total_inverse_mass <= 0.0 {
            return;
        }

        let move_per_inverse_mass = self.normal * (self.penetration / total_inverse_mass);

        if let Some(particle) = particles.get_mut(self.particle) {
            self.movement[0] = move_per_inverse_mass * particle.inverse_mass();
            particle.set_position(particle.position() + self.movement[0]);
        }
        if let Some(other) = self.other.and_then(|id| particles.get_mut(id)) {
            self.movement[1] = -move_per_inverse_mass * other.inverse_mass();
            other.set_position(other.position() + self.movement[1]);
        }
    }
}
