use std::fmt::Debug;

use glam::Vec3;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_GRAVITY;
use crate::core::particle::Particle;
use crate::utils::allocator::{ParticleArena, ParticleId};

const MIN_SPRING_LENGTH: f32 = 1e-6;

/// A force contributor evaluated once per registered particle per step.
///
/// Implementations only compute the force. The registry adds it to the
/// particle's accumulator, so a generator never touches velocity or position.
/// `particles` gives read access to other particles referenced by handle.
pub trait ParticleForce: Debug + Send + Sync {
    fn force(&self, particle: &Particle, particles: &ParticleArena, dt: f32) -> Vec3;
}

/// Constant field scaled by mass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GravityForce {
    pub gravity: Vec3,
}

impl Default for GravityForce {
    fn default() -> Self {
        Self::new(Vec3::from_array(DEFAULT_GRAVITY))
    }
}

impl GravityForce {
    pub fn new(gravity: Vec3) -> Self {
        Self { gravity }
    }
}

impl ParticleForce for GravityForce {
    fn force(&self, particle: &Particle, _particles: &ParticleArena, _dt: f32) -> Vec3 {
        if !particle.has_finite_mass() {
            return Vec3::ZERO;
        }
        self.gravity * particle.mass()
    }
}

/// Linear plus quadratic drag opposing the direction of motion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragForce {
    pub k1: f32,
    pub k2: f32,
}

impl DragForce {
    pub fn new(k1: f32, k2: f32) -> Self {
        Self { k1, k2 }
    }
}

impl ParticleForce for DragForce {
    fn force(&self, particle: &Particle, _particles: &ParticleArena, _dt: f32) -> Vec3 {
        let velocity = particle.velocity();
        let speed = velocity.length();
        if speed < 1e-6 {
            return Vec3::ZERO;
        }

        let drag = self.k1 * speed + self.k2 * speed * speed;
        -(velocity / speed) * drag
    }
}

/// Hooke's law along `displacement`, pulling or pushing toward `rest_length`.
fn hookean(displacement: Vec3, spring_constant: f32, rest_length: f32) -> Vec3 {
    let length = displacement.length();
    if length < MIN_SPRING_LENGTH {
        return Vec3::ZERO;
    }
    -(displacement / length) * (spring_constant * (length - rest_length))
}

/// Like [`hookean`] but slack while compressed.
fn one_sided(displacement: Vec3, spring_constant: f32, rest_length: f32) -> Vec3 {
    if displacement.length() <= rest_length {
        return Vec3::ZERO;
    }
    hookean(displacement, spring_constant, rest_length)
}

/// Spring to another particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpringForce {
    pub other: ParticleId,
    pub spring_constant: f32,
    pub rest_length: f32,
}

impl SpringForce {
    pub fn new(other: ParticleId, spring_constant: f32, rest_length: f32) -> Self {
        Self {
            other,
            spring_constant,
            rest_length,
        }
    }
}

impl ParticleForce for SpringForce {
    fn force(&self, particle: &Particle, particles: &ParticleArena, _dt: f32) -> Vec3 {
        match particles.get(self.other) {
            Some(other) => hookean(
                particle.position() - other.position(),
                self.spring_constant,
                self.rest_length,
            ),
            None => Vec3::ZERO,
        }
    }
}

/// Spring to a fixed point in space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchoredSpringForce {
    pub anchor: Vec3,
    pub spring_constant: f32,
    pub rest_length: f32,
}

impl AnchoredSpringForce {
    pub fn new(anchor: Vec3, spring_constant: f32, rest_length: f32) -> Self {
        Self {
            anchor,
            spring_constant,
            rest_length,
        }
    }

    pub fn set_anchor(&mut self, anchor: Vec3) {
        self.anchor = anchor;
    }
}

impl ParticleForce for AnchoredSpringForce {
    fn force(&self, particle: &Particle, _particles: &ParticleArena, _dt: f32) -> Vec3 {
        hookean(
            particle.position() - self.anchor,
            self.spring_constant,
            self.rest_length,
        )
    }
}

/// Elastic cord to another particle; pulls only when stretched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BungeeForce {
    pub other: ParticleId,
    pub spring_constant: f32,
    pub rest_length: f32,
}

impl BungeeForce {
    pub fn new(other: ParticleId, spring_constant: f32, rest_length: f32) -> Self {
        Self {
            other,
            spring_constant,
            rest_length,
        }
    }
}

impl ParticleForce for BungeeForce {
    fn force(&self, particle: &Particle, particles: &ParticleArena, _dt: f32) -> Vec3 {
        match particles.get(self.other) {
            Some(other) => one_sided(
                particle.position() - other.position(),
                self.spring_constant,
                self.rest_length,
            ),
            None => Vec3::ZERO,
        }
    }
}

/// Elastic cord to a fixed point; pulls only when stretched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchoredBungeeForce {
    pub anchor: Vec3,
    pub spring_constant: f32,
    pub rest_length: f32,
}

impl AnchoredBungeeForce {
    pub fn new(anchor: Vec3, spring_constant: f32, rest_length: f32) -> Self {
        Self {
            anchor,
            spring_constant,
            rest_length,
        }
    }

    pub fn set_anchor(&mut self, anchor: Vec3) {
        self.anchor = anchor;
    }
}

impl ParticleForce for AnchoredBungeeForce {
    fn force(&self, particle: &Particle, _particles: &ParticleArena, _dt: f32) -> Vec3 {
        one_sided(
            particle.position() - self.anchor,
            self.spring_constant,
            self.rest_length,
        )
    }
}

/// Closed-form damped harmonic oscillator step.
///
/// Predicts where the particle would be after `dt` under a spring of
/// stiffness `k` and damping `d` toward the origin of `relative_position`,
/// then returns the force that moves it there in one integration step.
fn damped_oscillator_force(
    particle: &Particle,
    relative_position: Vec3,
    spring_constant: f32,
    damping: f32,
    dt: f32,
) -> Vec3 {
    if !particle.has_finite_mass() || dt <= 0.0 {
        return Vec3::ZERO;
    }

    let gamma = 0.5 * (4.0 * spring_constant - damping * damping).sqrt();
    if !gamma.is_finite() || gamma == 0.0 {
        debug!("fake stiff spring degenerate (k = {spring_constant}, d = {damping}), skipping");
        return Vec3::ZERO;
    }

    let velocity = particle.velocity();
    let c = relative_position * (damping / (2.0 * gamma)) + velocity * (1.0 / gamma);
    let target = (relative_position * (gamma * dt).cos() + c * (gamma * dt).sin())
        * (-0.5 * dt * damping).exp();

    let acceleration = (target - relative_position) * (1.0 / (dt * dt)) - velocity * (1.0 / dt);
    acceleration * particle.mass()
}

/// Stiff spring to another particle solved analytically.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FakeStiffSpringForce {
    pub other: ParticleId,
    pub spring_constant: f32,
    pub damping: f32,
}

impl FakeStiffSpringForce {
    pub fn new(other: ParticleId, spring_constant: f32, damping: f32) -> Self {
        Self {
            other,
            spring_constant,
            damping,
        }
    }
}

impl ParticleForce for FakeStiffSpringForce {
    fn force(&self, particle: &Particle, particles: &ParticleArena, dt: f32) -> Vec3 {
        match particles.get(self.other) {
            Some(other) => damped_oscillator_force(
                particle,
                particle.position() - other.position(),
                self.spring_constant,
                self.damping,
                dt,
            ),
            None => Vec3::ZERO,
        }
    }
}

/// Stiff spring to a fixed point solved analytically.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchoredFakeStiffSpringForce {
    pub anchor: Vec3,
    pub spring_constant: f32,
    pub damping: f32,
}

impl AnchoredFakeStiffSpringForce {
    pub fn new(anchor: Vec3, spring_constant: f32, damping: f32) -> Self {
        Self {
            anchor,
            spring_constant,
            damping,
        }
    }

    pub fn set_anchor(&mut self, anchor: Vec3) {
        self.anchor = anchor;
    }
}

impl ParticleForce for AnchoredFakeStiffSpringForce {
    fn force(&self, particle: &Particle, _particles: &ParticleArena, dt: f32) -> Vec3 {
        damped_oscillator_force(
            particle,
            particle.position() - self.anchor,
            self.spring_constant,
            self.damping,
            dt,
        )
    }
}

/// Every force generator the registry can hold.
///
/// The built-in variants cover the engine's own needs; `Custom` accepts any
/// other [`ParticleForce`].
#[derive(Debug)]
pub enum ForceGenerator {
    Gravity(GravityForce),
    Drag(DragForce),
    Spring(SpringForce),
    AnchoredSpring(AnchoredSpringForce),
    Bungee(BungeeForce),
    AnchoredBungee(AnchoredBungeeForce),
    FakeStiffSpring(FakeStiffSpringForce),
    AnchoredFakeStiffSpring(AnchoredFakeStiffSpringForce),
    Custom(Box<dyn ParticleForce>),
}

impl ForceGenerator {
    pub fn custom<F: ParticleForce + 'static>(force: F) -> Self {
        Self::Custom(Box::new(force))
    }
}

impl ParticleForce for ForceGenerator {
    fn force(&self, particle: &Particle, particles: &ParticleArena, dt: f32) -> Vec3 {
        match self {
            ForceGenerator::Gravity(g) => g.force(particle, particles, dt),
            ForceGenerator::Drag(g) => g.force(particle, particles, dt),
            ForceGenerator::Spring(g) => g.force(particle, particles, dt),
            ForceGenerator::AnchoredSpring(g) => g.force(particle, particles, dt),
            ForceGenerator::Bungee(g) => g.force(particle, particles, dt),
            ForceGenerator::AnchoredBungee(g) => g.force(particle, particles, dt),
            ForceGenerator::FakeStiffSpring(g) => g.force(particle, particles, dt),
            ForceGenerator::AnchoredFakeStiffSpring(g) => g.force(particle, particles, dt),
            ForceGenerator::Custom(g) => g.force(particle, particles, dt),
        }
    }
}

macro_rules! impl_from_force {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for ForceGenerator {
                fn from(force: $ty) -> Self {
                    ForceGenerator::$variant(force)
                }
            }
        )*
    };
}

impl_from_force!(
    Gravity(GravityForce),
    Drag(DragForce),
    Spring(SpringForce),
    AnchoredSpring(AnchoredSpringForce),
    Bungee(BungeeForce),
    AnchoredBungee(AnchoredBungeeForce),
    FakeStiffSpring(FakeStiffSpringForce),
    AnchoredFakeStiffSpring(AnchoredFakeStiffSpringForce),
);

/// Handle to a generator stored in a [`ForceRegistry`].
///
/// Like [`ParticleId`], a handle goes stale once its generator is dropped,
/// even if the slot is later reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForceGeneratorId {
    index: usize,
    generation: u32,
}

impl ForceGeneratorId {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ForceRegistration {
    particle: ParticleId,
    generator: ForceGeneratorId,
}

#[derive(Debug, Default)]
struct GeneratorSlot {
    generator: Option<ForceGenerator>,
    generation: u32,
    registrations: usize,
}

/// Many-to-many association of particles and force generators.
///
/// A generator lives until its last registration goes away, whether removed
/// explicitly or evicted with an inactive particle, or until
/// [`ForceRegistry::remove_generator`] drops it. Generators that were never
/// registered stay stored until removed.
#[derive(Debug, Default)]
pub struct ForceRegistry {
    slots: Vec<GeneratorSlot>,
    free_slots: Vec<usize>,
    registrations: Vec<ForceRegistration>,
}

impl ForceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a generator so it can be shared by any number of registrations.
    pub fn add_generator<G: Into<ForceGenerator>>(&mut self, generator: G) -> ForceGeneratorId {
        let generator = Some(generator.into());
        match self.free_slots.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.generator = generator;
                slot.registrations = 0;
                ForceGeneratorId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(GeneratorSlot {
                    generator,
                    ..GeneratorSlot::default()
                });
                ForceGeneratorId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        }
    }

    fn slot(&self, id: ForceGeneratorId) -> Option<&GeneratorSlot> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation && slot.generator.is_some())
    }

    fn slot_mut(&mut self, id: ForceGeneratorId) -> Option<&mut GeneratorSlot> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation && slot.generator.is_some())
    }

    pub fn generator(&self, id: ForceGeneratorId) -> Option<&ForceGenerator> {
        self.slot(id)?.generator.as_ref()
    }

    pub fn generator_mut(&mut self, id: ForceGeneratorId) -> Option<&mut ForceGenerator> {
        self.slot_mut(id)?.generator.as_mut()
    }

    /// Drops a generator together with every registration that uses it.
    pub fn remove_generator(&mut self, id: ForceGeneratorId) -> Option<ForceGenerator> {
        self.slot(id)?;
        self.registrations.retain(|r| r.generator != id);
        self.free_slot(id.index)
    }

    /// Number of generators currently stored.
    pub fn generator_count(&self) -> usize {
        self.slots.len() - self.free_slots.len()
    }

    /// Registers `particle` with a stored generator. Stale generator handles
    /// are ignored.
    pub fn add(&mut self, particle: ParticleId, generator: ForceGeneratorId) -> bool {
        let Some(slot) = self.slot_mut(generator) else {
            debug!("ignoring registration with stale force generator {generator:?}");
            return false;
        };
        slot.registrations += 1;
        self.registrations.push(ForceRegistration {
            particle,
            generator,
        });
        true
    }

    /// Removes the first matching registration.
    pub fn remove(&mut self, particle: ParticleId, generator: ForceGeneratorId) -> bool {
        let found = self
            .registrations
            .iter()
            .position(|r| r.particle == particle && r.generator == generator);
        match found {
            Some(index) => {
                self.registrations.remove(index);
                self.release_registration(generator);
                true
            }
            None => false,
        }
    }

    pub fn remove_particle(&mut self, particle: ParticleId) {
        self.evict_where(|r| r.particle == particle);
    }

    /// Drops every registration and with them every registered generator.
    pub fn clear(&mut self) {
        self.evict_where(|_| true);
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Evicts registrations of inactive or reclaimed particles, then applies
    /// every remaining generator in registration order.
    pub fn update_forces(&mut self, particles: &mut ParticleArena, dt: f32) {
        self.evict_where(|r| !particles.is_active(r.particle));

        for registration in &self.registrations {
            let Some(generator) = self
                .slots
                .get(registration.generator.index)
                .and_then(|slot| slot.generator.as_ref())
            else {
                continue;
            };
            let Some(particle) = particles.get(registration.particle) else {
                continue;
            };
            let force = generator.force(particle, particles, dt);
            if let Some(particle) = particles.get_mut(registration.particle) {
                particle.add_force(force);
            }
        }
    }

    fn evict_where<F>(&mut self, mut evict: F) -> usize
    where
        F: FnMut(&ForceRegistration) -> bool,
    {
        let mut evicted = Vec::new();
        self.registrations.retain(|r| {
            let gone = evict(r);
            if gone {
                evicted.push(r.generator);
            }
            !gone
        });
        for &generator in &evicted {
            self.release_registration(generator);
        }
        evicted.len()
    }

    fn release_registration(&mut self, id: ForceGeneratorId) {
        let Some(slot) = self.slot_mut(id) else {
            return;
        };
        slot.registrations = slot.registrations.saturating_sub(1);
        if slot.registrations == 0 {
            self.free_slot(id.index);
        }
    }

    fn free_slot(&mut self, index: usize) -> Option<ForceGenerator> {
        let slot = self.slots.get_mut(index)?;
        let generator = slot.generator.take()?;
        slot.registrations = 0;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_slots.push(index);
        Some(generator)
    }
}
