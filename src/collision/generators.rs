use crate::{
    collision::{
        contact::ParticleContact, ground::GroundContactGenerator, pairs::ParticlePairContactGenerator,
        platform::PlatformContactGenerator,
    },
    core::particle::{ManagesParticles, ParticleSet},
    utils::allocator::ParticleArena,
};

/// Inspects particle state and appends contacts for the current step.
pub trait GeneratesContacts {
    /// Appends at most `limit` contacts to `contacts` and returns how many were written.
    ///
    /// Generators may deactivate particles (destruction rules) but never move them.
    fn add_contacts(
        &mut self,
        particles: &mut ParticleArena,
        contacts: &mut Vec<ParticleContact>,
        limit: usize,
    ) -> usize;
}

/// The contact generators a world can host.
#[derive(Debug, Clone)]
pub enum ContactGenerator {
    Ground(GroundContactGenerator),
    Platform(PlatformContactGenerator),
    Particles(ParticlePairContactGenerator),
}

impl GeneratesContacts for ContactGenerator {
    fn add_contacts(
        &mut self,
        particles: &mut ParticleArena,
        contacts: &mut Vec<ParticleContact>,
        limit: usize,
    ) -> usize {
        match self {
            ContactGenerator::Ground(g) => g.add_contacts(particles, contacts, limit),
            ContactGenerator::Platform(g) => g.add_contacts(particles, contacts, limit),
            ContactGenerator::Particles(g) => g.add_contacts(particles, contacts, limit),
        }
    }
}

impl ManagesParticles for ContactGenerator {
    fn particle_set(&self) -> &ParticleSet {
        match self {
            ContactGenerator::Ground(g) => g.particle_set(),
            ContactGenerator::Platform(g) => g.particle_set(),
            ContactGenerator::Particles(g) => g.particle_set(),
        }
    }

    fn particle_set_mut(&mut self) -> &mut ParticleSet {
        match self {
            ContactGenerator::Ground(g) => g.particle_set_mut(),
            ContactGenerator::Platform(g) => g.particle_set_mut(),
            ContactGenerator::Particles(g) => g.particle_set_mut(),
        }
    }
}

impl From<GroundContactGenerator> for ContactGenerator {
    fn from(generator: GroundContactGenerator) -> Self {
        ContactGenerator::Ground(generator)
    }
}

impl From<PlatformContactGenerator> for ContactGenerator {
    fn from(generator: PlatformContactGenerator) -> Self {
        ContactGenerator::Platform(generator)
    }
}

impl From<ParticlePairContactGenerator> for ContactGenerator {
    fn from(generator: ParticlePairContactGenerator) -> Self {
        ContactGenerator::Particles(generator)
    }
}
