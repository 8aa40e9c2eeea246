use crate::{
    collision::contact::ParticleContact,
    utils::allocator::{ParticleArena, ParticleId},
};

/// Per-step numbers reported by the resolver.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ResolverStepMetrics {
    pub contacts: usize,
    pub iteration_budget: u32,
    pub iterations_used: u32,
}

/// Greedy contact resolver: each iteration resolves the contact that is
/// closing fastest, then corrects the penetration of every contact that
/// shares a particle with it.
#[derive(Debug, Clone)]
pub struct ContactResolver {
    iterations: u32,
    auto: bool,
    metrics: ResolverStepMetrics,
}

impl ContactResolver {
    /// `iterations == 0` selects auto mode: twice the contact count each step.
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations,
            auto: iterations == 0,
            metrics: ResolverStepMetrics::default(),
        }
    }

    pub fn set_iterations(&mut self, iterations: u32) {
        self.iterations = iterations;
        self.auto = iterations == 0;
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn is_auto(&self) -> bool {
        self.auto
    }

    pub fn iterations_used(&self) -> u32 {
        self.metrics.iterations_used
    }

    pub fn last_metrics(&self) -> ResolverStepMetrics {
        self.metrics
    }

    pub fn resolve_contacts(
        &mut self,
        contacts: &mut [ParticleContact],
        particles: &mut ParticleArena,
        dt: f32,
    ) {
        if self.auto {
            self.iterations = u32::try_from(contacts.len().saturating_mul(2)).unwrap_or(u32::MAX);
        }
        self.metrics = ResolverStepMetrics {
            contacts: contacts.len(),
            iteration_budget: self.iterations,
            iterations_used: 0,
        };

        while self.metrics.iterations_used < self.iterations {
            let Some(index) = Self::most_urgent(contacts, particles) else {
                break;
            };

            contacts[index].resolve(particles, dt);
            let resolved = contacts[index];
            for contact in contacts.iter_mut() {
                Self::propagate_movement(contact, &resolved);
            }

            self.metrics.iterations_used += 1;
        }
    }

    /// Index of the contact with the lowest separating velocity among those
    /// still closing or still interpenetrating.
    fn most_urgent(contacts: &[ParticleContact], particles: &ParticleArena) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (index, contact) in contacts.iter().enumerate() {
            let separating_velocity = contact.separating_velocity(particles);
            if separating_velocity >= 0.0 && contact.penetration <= 0.0 {
                continue;
            }
            match best {
                Some((_, lowest)) if separating_velocity >= lowest => {}
                _ => best = Some((index, separating_velocity)),
            }
        }
        best.map(|(index, _)| index)
    }

    fn propagate_movement(contact: &mut ParticleContact, resolved: &ParticleContact) {
        let [moved_first, moved_second] = resolved.movement;
        let shares = |id: ParticleId| Some(id) == resolved.other;

        if contact.particle == resolved.particle {
            contact.penetration -= moved_first.dot(contact.normal);
        } else if shares(contact.particle) {
            contact.penetration -= moved_second.dot(contact.normal);
        }

        if let Some(other) = contact.other {
            if other == resolved.particle {
                contact.penetration += moved_first.dot(contact.normal);
            } else if shares(other) {
                contact.penetration += moved_second.dot(contact.normal);
            }
        }
    }
}

impl Default for ContactResolver {
    fn default() -> Self {
        Self::new(0)
    }
}
