use std::collections::HashSet;

use glam::Vec3;
use log::debug;

use crate::{
    collision::{
        contact::ParticleContact,
        generators::{ContactGenerator, GeneratesContacts},
    },
    config::WorldConfig,
    core::{
        particle::{ManagesParticles, Particle, ParticleType},
        types::LevelBounds,
    },
    dynamics::{forces::ForceRegistry, integrator::Integrator, solver::ContactResolver},
    utils::{
        allocator::{ParticleArena, ParticleId},
        logging::ScopedTimer,
        profiling::StepProfile,
    },
};

/// Owns the particle pool and runs the fixed step sequence:
/// cull, reclaim, clear forces, apply forces, integrate, generate contacts, resolve.
#[derive(Debug)]
pub struct ParticleWorld {
    particles: ParticleArena,
    active: Vec<ParticleId>,
    force_registry: ForceRegistry,
    contact_generators: Vec<ContactGenerator>,
    contacts: Vec<ParticleContact>,
    max_contacts: usize,
    resolver: ContactResolver,
    integrator: Integrator,
    level_bounds: LevelBounds,
    frame_budget_ms: Option<f32>,
    profile: StepProfile,
}

impl Default for ParticleWorld {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl ParticleWorld {
    pub fn new(config: WorldConfig) -> Self {
        let config = config.sanitized();
        Self {
            particles: ParticleArena::with_capacity(config.pool_size),
            active: Vec::with_capacity(config.pool_size),
            force_registry: ForceRegistry::new(),
            contact_generators: Vec::new(),
            contacts: Vec::with_capacity(config.max_contacts),
            max_contacts: config.max_contacts,
            resolver: ContactResolver::new(config.resolver_iterations),
            integrator: Integrator::new(config.parallel),
            level_bounds: config.level_bounds,
            frame_budget_ms: config.frame_budget_ms,
            profile: StepProfile::default(),
        }
    }

    /// Takes a particle out of the pool and marks it active.
    ///
    /// Returns `None` when the pool is exhausted; callers skip the spawn.
    pub fn get_new_particle(&mut self) -> Option<ParticleId> {
        match self.particles.acquire() {
            Some(id) => {
                self.active.push(id);
                Some(id)
            }
            None => {
                debug!(
                    "particle pool exhausted ({} particles in use)",
                    self.particles.capacity()
                );
                None
            }
        }
    }

    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id)
    }

    pub fn particle_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.particles.get_mut(id)
    }

    /// Read access to the whole pool, for generators that look up other particles.
    pub fn particles(&self) -> &ParticleArena {
        &self.particles
    }

    /// Returns the particle to the pool right away. Stale handles are ignored.
    ///
    /// Only `id` is reclaimed; other inactive particles wait for the next
    /// frame start.
    pub fn release_particle(&mut self, id: ParticleId) -> bool {
        if !self.particles.is_valid(id) {
            return false;
        }
        self.active.retain(|&active| active != id);
        for generator in &mut self.contact_generators {
            generator.particle_set_mut().remove(id);
        }
        self.force_registry.remove_particle(id);
        self.particles.release(id)
    }

    /// Deactivates every active particle of `particle_type` and reclaims them
    /// immediately. Returns how many were destroyed.
    pub fn destroy_all_of_type(&mut self, particle_type: ParticleType) -> usize {
        for &id in &self.active {
            if let Some(particle) = self.particles.get_mut(id) {
                if particle.particle_type() == particle_type {
                    particle.set_active(false);
                }
            }
        }
        self.reclaim_inactive()
    }

    pub fn destroy_all_snow(&mut self) -> usize {
        self.destroy_all_of_type(ParticleType::Snow)
    }

    pub fn destroy_all_balls(&mut self) -> usize {
        self.destroy_all_of_type(ParticleType::Ball)
    }

    /// Culls particles below the level floor, reclaims everything inactive
    /// and clears the force accumulators of the survivors.
    pub fn start_frame(&mut self) {
        let mut profile = StepProfile::default();
        {
            let _timer = ScopedTimer::recording("world::start_frame", &mut profile.start_frame_time);

            for &id in &self.active {
                if let Some(particle) = self.particles.get_mut(id) {
                    if self.level_bounds.is_below_floor(particle.position()) {
                        particle.set_active(false);
                    }
                }
            }

            profile.reclaimed_particles = self.reclaim_inactive();

            for &id in &self.active {
                if let Some(particle) = self.particles.get_mut(id) {
                    particle.clear_force_accumulator();
                }
            }
        }
        self.profile = profile;
    }

    /// Runs forces, integration, contact generation and resolution for one step.
    /// A non-positive `dt` leaves the world untouched.
    pub fn run_physics(&mut self, dt: f32) {
        if dt <= 0.0 {
            debug!("run_physics skipped: non-positive dt {dt}");
            return;
        }

        let mut profile = self.profile;
        {
            let _timer = ScopedTimer::recording("forces", &mut profile.force_time);
            self.force_registry.update_forces(&mut self.particles, dt);
        }
        {
            let _timer = ScopedTimer::recording("integrator", &mut profile.integrate_time);
            self.integrator.step(&mut self.particles, dt);
        }
        {
            let _timer = ScopedTimer::recording("contacts::generate", &mut profile.contact_generation_time);
            profile.generators_skipped = self.generate_contacts();
        }
        {
            let _timer = ScopedTimer::recording("contacts::resolve", &mut profile.resolve_time);
            self.resolver
                .resolve_contacts(&mut self.contacts, &mut self.particles, dt);
        }

        profile.active_particles = self.active.len();
        profile.contacts_generated = self.contacts.len();
        profile.resolver_iterations = self.resolver.iterations_used();
        self.profile = profile;
    }

    /// Convenience for hosts that drive one call per frame.
    pub fn step(&mut self, dt: f32) {
        self.start_frame();
        self.run_physics(dt);
    }

    /// Fills the contact buffer from every generator in order, handing each
    /// the remaining capacity. Generators that find the buffer full still run
    /// so destruction rules apply, but write nothing. Returns how many did.
    fn generate_contacts(&mut self) -> usize {
        self.contacts.clear();
        let mut remaining = self.max_contacts;
        let mut skipped = 0;

        for generator in &mut self.contact_generators {
            if remaining == 0 {
                skipped += 1;
            }
            let written = generator.add_contacts(&mut self.particles, &mut self.contacts, remaining);
            remaining = remaining.saturating_sub(written);
        }

        if skipped > 0 {
            debug!(
                "contact buffer full at {} contacts, {} generators skipped",
                self.max_contacts, skipped
            );
        }
        skipped
    }

    /// Moves inactive particles from the active list back into the pool and
    /// forgets them in every generator and force registration.
    fn reclaim_inactive(&mut self) -> usize {
        let particles = &self.particles;
        let mut reclaimed = HashSet::new();
        self.active.retain(|&id| {
            let keep = particles.is_active(id);
            if !keep {
                reclaimed.insert(id);
            }
            keep
        });
        if reclaimed.is_empty() {
            return 0;
        }

        for generator in &mut self.contact_generators {
            generator
                .particle_set_mut()
                .retain(|id| !reclaimed.contains(id));
        }
        for &id in &reclaimed {
            self.force_registry.remove_particle(id);
            self.particles.release(id);
        }
        reclaimed.len()
    }

    pub fn active_ids(&self) -> &[ParticleId] {
        &self.active
    }

    /// Active particles in spawn order, for rendering.
    pub fn active_particles(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.active.iter().filter_map(|&id| self.particles.get(id))
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn pool_free_count(&self) -> usize {
        self.particles.free_count()
    }

    pub fn pool_size(&self) -> usize {
        self.particles.capacity()
    }

    /// Assigns `acceleration` to every active particle accepted by `predicate`.
    pub fn set_acceleration_where<F>(&mut self, predicate: F, acceleration: Vec3) -> usize
    where
        F: Fn(&Particle) -> bool,
    {
        let mut updated = 0;
        for &id in &self.active {
            if let Some(particle) = self.particles.get_mut(id) {
                if predicate(particle) {
                    particle.set_acceleration(acceleration);
                    updated += 1;
                }
            }
        }
        updated
    }

    /// Appends a generator and returns its index.
    pub fn add_contact_generator<G: Into<ContactGenerator>>(&mut self, generator: G) -> usize {
        self.contact_generators.push(generator.into());
        self.contact_generators.len() - 1
    }

    pub fn contact_generators(&self) -> &[ContactGenerator] {
        &self.contact_generators
    }

    pub fn contact_generator_mut(&mut self, index: usize) -> Option<&mut ContactGenerator> {
        self.contact_generators.get_mut(index)
    }

    pub fn force_registry(&self) -> &ForceRegistry {
        &self.force_registry
    }

    pub fn force_registry_mut(&mut self) -> &mut ForceRegistry {
        &mut self.force_registry
    }

    /// Contacts generated by the last step, after resolution.
    pub fn contacts(&self) -> &[ParticleContact] {
        &self.contacts
    }

    pub fn max_contacts(&self) -> usize {
        self.max_contacts
    }

    pub fn resolver(&self) -> &ContactResolver {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut ContactResolver {
        &mut self.resolver
    }

    pub fn level_bounds(&self) -> LevelBounds {
        self.level_bounds
    }

    pub fn set_level_bounds(&mut self, bounds: LevelBounds) {
        self.level_bounds = bounds;
    }

    pub fn set_parallel_enabled(&mut self, enabled: bool) {
        self.integrator.set_parallel(enabled);
    }

    pub fn parallel_enabled(&self) -> bool {
        self.integrator.parallel()
    }

    pub fn frame_budget_ms(&self) -> Option<f32> {
        self.frame_budget_ms
    }

    pub fn last_profile(&self) -> &StepProfile {
        &self.profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{ground::GroundContactGenerator, pairs::ParticlePairContactGenerator};
    use glam::Vec2;

    fn small_world(pool_size: usize) -> ParticleWorld {
        ParticleWorld::new(
            WorldConfig::default()
                .with_pool_size(pool_size)
                .with_level_bounds(LevelBounds::from_half_extents(Vec2::new(100.0, 100.0))),
        )
    }

    #[test]
    fn exhausted_pool_returns_none_without_changing_counts() {
        let mut world = small_world(2);
        assert!(world.get_new_particle().is_some());
        assert!(world.get_new_particle().is_some());
        assert!(world.get_new_particle().is_none());
        assert_eq!(world.active_count(), 2);
        assert_eq!(world.pool_free_count(), 0);
    }

    #[test]
    fn particles_below_the_floor_are_reclaimed_next_frame() {
        let mut world = small_world(4);
        let id = world.get_new_particle().unwrap();
        world
            .particle_mut(id)
            .unwrap()
            .set_position(Vec3::new(0.0, -150.0, 0.0));
        let ground = world.add_contact_generator(GroundContactGenerator::new(-100.0));
        world.contact_generator_mut(ground).unwrap().add_particle(id);

        world.start_frame();

        assert_eq!(world.active_count(), 0);
        assert_eq!(world.pool_free_count(), 4);
        assert!(world.particle(id).is_none());
        assert!(world.contact_generators()[ground].particles().is_empty());
        assert_eq!(world.last_profile().reclaimed_particles, 1);
    }

    #[test]
    fn particles_beside_or_above_the_level_survive() {
        let mut world = small_world(2);
        let right = world.get_new_particle().unwrap();
        let above = world.get_new_particle().unwrap();
        world.particle_mut(right).unwrap().set_position(Vec3::new(500.0, 0.0, 0.0));
        world.particle_mut(above).unwrap().set_position(Vec3::new(0.0, 500.0, 0.0));

        world.start_frame();

        assert_eq!(world.active_count(), 2);
    }

    #[test]
    fn destroy_all_of_type_reclaims_immediately() {
        let mut world = small_world(3);
        for particle_type in [ParticleType::Snow, ParticleType::Ball, ParticleType::Snow] {
            let id = world.get_new_particle().unwrap();
            world.particle_mut(id).unwrap().set_particle_type(particle_type);
        }

        assert_eq!(world.destroy_all_snow(), 2);
        assert_eq!(world.active_count(), 1);
        assert_eq!(world.pool_free_count(), 2);
        assert_eq!(world.destroy_all_balls(), 1);
        assert_eq!(world.pool_free_count(), 3);
    }

    #[test]
    fn release_particle_ignores_stale_handles() {
        let mut world = small_world(1);
        let id = world.get_new_particle().unwrap();
        assert!(world.release_particle(id));
        assert!(!world.release_particle(id));

        let reused = world.get_new_particle().unwrap();
        assert_eq!(reused.index(), id.index());
        assert!(!world.release_particle(id));
        assert!(world.particle(reused).is_some());
    }

    #[test]
    fn non_positive_dt_is_a_no_op() {
        let mut world = small_world(1);
        let id = world.get_new_particle().unwrap();
        world.particle_mut(id).unwrap().set_velocity(Vec3::X);

        world.step(0.0);
        world.step(-1.0);

        assert_eq!(world.particle(id).unwrap().position(), Vec3::ZERO);
    }

    #[test]
    fn contact_buffer_caps_generation() {
        let mut world = ParticleWorld::new(
            WorldConfig::default()
                .with_pool_size(4)
                .with_max_contacts(3)
                .with_level_bounds(LevelBounds::from_half_extents(Vec2::new(100.0, 100.0))),
        );
        let first = world.add_contact_generator(GroundContactGenerator::default());
        let second = world.add_contact_generator(GroundContactGenerator::default());
        for _ in 0..4 {
            let id = world.get_new_particle().unwrap();
            world.particle_mut(id).unwrap().set_position(Vec3::new(0.0, -1.0, 0.0));
            world.contact_generator_mut(first).unwrap().add_particle(id);
            world.contact_generator_mut(second).unwrap().add_particle(id);
        }

        world.step(1.0 / 60.0);

        assert_eq!(world.contacts().len(), 3);
        assert_eq!(world.last_profile().contacts_generated, 3);
        assert_eq!(world.last_profile().generators_skipped, 1);
    }

    #[test]
    fn acceleration_update_honours_the_predicate() {
        let mut world = small_world(2);
        let snow = world.get_new_particle().unwrap();
        let ball = world.get_new_particle().unwrap();
        world.particle_mut(snow).unwrap().set_particle_type(ParticleType::Snow);
        world.particle_mut(ball).unwrap().set_particle_type(ParticleType::Ball);

        let fan = Vec3::new(-100.0, -5.0, 0.0);
        let updated =
            world.set_acceleration_where(|p| p.particle_type() == ParticleType::Snow, fan);

        assert_eq!(updated, 1);
        assert_eq!(world.particle(snow).unwrap().acceleration(), fan);
        assert_eq!(world.particle(ball).unwrap().acceleration(), Vec3::ZERO);
    }

    fn spawn_typed(world: &mut ParticleWorld, x: f32, particle_type: ParticleType, pairs: usize) -> ParticleId {
        let id = world.get_new_particle().unwrap();
        let particle = world.particle_mut(id).unwrap();
        particle.set_position(Vec3::new(x, 0.0, 0.0));
        particle.set_radius(1.0);
        particle.set_particle_type(particle_type);
        world.contact_generator_mut(pairs).unwrap().add_particle(id);
        id
    }

    #[test]
    fn release_particle_leaves_other_inactive_particles_for_frame_start() {
        let mut world = small_world(4);
        let pairs = world.add_contact_generator(ParticlePairContactGenerator::new());
        let _ball = spawn_typed(&mut world, 0.0, ParticleType::Ball, pairs);
        let flake = spawn_typed(&mut world, 0.5, ParticleType::Snow, pairs);
        let bystander = spawn_typed(&mut world, 50.0, ParticleType::None, pairs);

        world.step(1.0 / 60.0);
        assert!(!world.particles().is_active(flake));

        assert!(world.release_particle(bystander));
        assert!(world.particles().is_valid(flake), "melted flake waits for frame start");
        assert_eq!(world.active_count(), 2);
        assert!(!world.contact_generators()[pairs].particles().contains(&bystander));

        world.start_frame();
        assert!(!world.particles().is_valid(flake));
        assert_eq!(world.last_profile().reclaimed_particles, 1);
        assert_eq!(world.active_count(), 1);
    }

    #[test]
    fn snow_melts_even_when_the_contact_buffer_is_full() {
        let mut world = ParticleWorld::new(
            WorldConfig::default()
                .with_pool_size(4)
                .with_max_contacts(1)
                .with_level_bounds(LevelBounds::from_half_extents(Vec2::new(100.0, 100.0))),
        );
        let balls = world.add_contact_generator(ParticlePairContactGenerator::new());
        let snow = world.add_contact_generator(ParticlePairContactGenerator::new());
        spawn_typed(&mut world, 0.0, ParticleType::Ball, balls);
        let ball = spawn_typed(&mut world, 1.5, ParticleType::Ball, balls);
        world.contact_generator_mut(snow).unwrap().add_particle(ball);
        let flake = spawn_typed(&mut world, 2.0, ParticleType::Snow, snow);

        world.run_physics(1.0 / 60.0);

        assert_eq!(world.contacts().len(), 1);
        assert_eq!(world.last_profile().generators_skipped, 1);
        assert!(!world.particles().is_active(flake));
    }
}
