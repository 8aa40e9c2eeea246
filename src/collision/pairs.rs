use std::collections::HashSet;

use glam::Vec3;

use crate::{
    collision::{contact::ParticleContact, generators::GeneratesContacts},
    core::particle::{ManagesParticles, ParticleSet},
    utils::allocator::ParticleArena,
};

/// Sphere-sphere contacts between every pair of managed particles.
///
/// Pairs whose types destroy one another produce no contact: the destroyed
/// particle is deactivated instead and reclaimed at the next frame start.
/// Destruction does not depend on the remaining buffer capacity.
#[derive(Debug, Clone, Default)]
pub struct ParticlePairContactGenerator {
    particles: ParticleSet,
    seen: HashSet<(usize, usize)>,
}

impl ParticlePairContactGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GeneratesContacts for ParticlePairContactGenerator {
    fn add_contacts(
        &mut self,
        particles: &mut ParticleArena,
        contacts: &mut Vec<ParticleContact>,
        limit: usize,
    ) -> usize {
        self.seen.clear();
        let ids = self.particles.particles();
        let mut written = 0;

        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                if a.index() == b.index() {
                    continue;
                }
                let key = (a.index().min(b.index()), a.index().max(b.index()));
                if !self.seen.insert(key) {
                    continue;
                }

                let (Some(first), Some(second)) = (particles.get(a), particles.get(b)) else {
                    continue;
                };
                if !first.is_active() || !second.is_active() {
                    continue;
                }
                let (first_type, second_type) = (first.particle_type(), second.particle_type());
                if !first_type.collides_with(second_type) {
                    continue;
                }

                let offset = first.position() - second.position();
                let distance = offset.length();
                let reach = first.radius() + second.radius();
                if distance >= reach {
                    continue;
                }

                if first_type.destroyed_by(second_type) {
                    if let Some(particle) = particles.get_mut(a) {
                        particle.set_active(false);
                    }
                    continue;
                }
                if second_type.destroyed_by(first_type) {
                    if let Some(particle) = particles.get_mut(b) {
                        particle.set_active(false);
                    }
                    continue;
                }

                if written >= limit {
                    continue;
                }
                let normal = if distance > f32::EPSILON {
                    offset / distance
                } else {
                    Vec3::Y
                };

                // Restitution is the sum of both bounciness values, not an average.
                contacts.push(ParticleContact::between(
                    a,
                    b,
                    normal,
                    reach - distance,
                    first.bounciness() + second.bounciness(),
                ));
                written += 1;
            }
        }
        written
    }
}

impl ManagesParticles for ParticlePairContactGenerator {
    fn particle_set(&self) -> &ParticleSet {
        &self.particles
    }

    fn particle_set_mut(&mut self) -> &mut ParticleSet {
        &mut self.particles
    }
}
