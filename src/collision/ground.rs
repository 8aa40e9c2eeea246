use glam::Vec3;

use crate::{
    collision::{contact::ParticleContact, generators::GeneratesContacts},
    config::DEFAULT_GROUND_RESTITUTION,
    core::particle::{ManagesParticles, ParticleSet},
    utils::allocator::ParticleArena,
};

/// Infinite horizontal plane tested against particle centres.
#[derive(Debug, Clone)]
pub struct GroundContactGenerator {
    pub ground_y: f32,
    pub restitution: f32,
    particles: ParticleSet,
}

impl Default for GroundContactGenerator {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl GroundContactGenerator {
    pub fn new(ground_y: f32) -> Self {
        Self {
            ground_y,
            restitution: DEFAULT_GROUND_RESTITUTION,
            particles: ParticleSet::new(),
        }
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }
}

impl GeneratesContacts for GroundContactGenerator {
    fn add_contacts(
        &mut self,
        particles: &mut ParticleArena,
        contacts: &mut Vec<ParticleContact>,
        limit: usize,
    ) -> usize {
        let mut written = 0;
        for &id in self.particles.particles() {
            if written >= limit {
                break;
            }
            let Some(particle) = particles.get(id).filter(|p| p.is_active()) else {
                continue;
            };

            let y = particle.position().y;
            if y < self.ground_y {
                contacts.push(ParticleContact::with_scenery(
                    id,
                    Vec3::Y,
                    self.ground_y - y,
                    self.restitution,
                ));
                written += 1;
            }
        }
        written
    }
}

impl ManagesParticles for GroundContactGenerator {
    fn particle_set(&self) -> &ParticleSet {
        &self.particles
    }

    fn particle_set_mut(&mut self) -> &mut ParticleSet {
        &mut self.particles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn spawn_at(arena: &mut ParticleArena, y: f32) -> crate::utils::allocator::ParticleId {
        let id = arena.acquire().unwrap();
        arena.get_mut(id).unwrap().set_position(Vec3::new(0.0, y, 0.0));
        id
    }

    #[test]
    fn particle_resting_on_ground_is_not_a_contact() {
        let mut arena = ParticleArena::with_capacity(1);
        let mut ground = GroundContactGenerator::new(2.0);
        ground.add_particle(spawn_at(&mut arena, 2.0));

        let mut contacts = Vec::new();
        assert_eq!(ground.add_contacts(&mut arena, &mut contacts, 10), 0);
        assert!(contacts.is_empty());
    }

    #[test]
    fn sunk_particle_reports_penetration_and_up_normal() {
        let mut arena = ParticleArena::with_capacity(1);
        let mut ground = GroundContactGenerator::new(2.0);
        let id = spawn_at(&mut arena, 2.0 - 0.25);
        ground.add_particle(id);

        let mut contacts = Vec::new();
        assert_eq!(ground.add_contacts(&mut arena, &mut contacts, 10), 1);
        let contact = contacts[0];
        assert_eq!(contact.particle, id);
        assert_eq!(contact.other, None);
        assert_eq!(contact.normal, Vec3::Y);
        assert_relative_eq!(contact.penetration, 0.25);
        assert_relative_eq!(contact.restitution, DEFAULT_GROUND_RESTITUTION);
    }

    #[test]
    fn never_writes_past_the_limit() {
        let mut arena = ParticleArena::with_capacity(5);
        let mut ground = GroundContactGenerator::default();
        for _ in 0..5 {
            let id = spawn_at(&mut arena, -1.0);
            ground.add_particle(id);
        }

        let mut contacts = Vec::new();
        assert_eq!(ground.add_contacts(&mut arena, &mut contacts, 3), 3);
        assert_eq!(contacts.len(), 3);
        assert_eq!(ground.add_contacts(&mut arena, &mut contacts, 0), 0);
        assert_eq!(contacts.len(), 3);
    }
}
