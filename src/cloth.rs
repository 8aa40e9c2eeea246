//! Hanging cloth built from fake-stiff springs.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{
    config::DEFAULT_GRAVITY,
    core::particle::{ManagesParticles, ParticleType},
    dynamics::forces::{
        AnchoredFakeStiffSpringForce, FakeStiffSpringForce, ForceGenerator, ForceGeneratorId,
    },
    utils::allocator::ParticleId,
    world::ParticleWorld,
};

/// Parameters of a cloth grid. Columns hang from `anchors`, one column per anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClothBuilder {
    pub anchors: Vec<Vec3>,
    pub rows: usize,
    /// Vertical distance between particles at spawn.
    pub spacing: f32,
    pub spring_constant: f32,
    pub damping: f32,
    pub mass: f32,
    pub radius: f32,
    pub gravity: Vec3,
    pub contact_generators: Vec<usize>,
}

impl Default for ClothBuilder {
    fn default() -> Self {
        Self {
            anchors: Vec::new(),
            rows: 3,
            spacing: 30.0,
            spring_constant: 50.0,
            damping: 0.8,
            mass: 10.0,
            radius: 10.0,
            gravity: Vec3::from_array(DEFAULT_GRAVITY),
            contact_generators: Vec::new(),
        }
    }
}

/// Handles of a spawned cloth.
#[derive(Debug, Clone, PartialEq)]
pub struct Cloth {
    /// `grid[column][row]`, row 0 hanging from the anchor.
    pub grid: Vec<Vec<ParticleId>>,
    /// One anchored spring per column.
    pub anchor_springs: Vec<ForceGeneratorId>,
}

impl Cloth {
    pub fn particles(&self) -> impl Iterator<Item = ParticleId> + '_ {
        self.grid.iter().flatten().copied()
    }

    /// Moves the anchor of `column`. Returns false for an unknown column.
    pub fn set_anchor(&self, world: &mut ParticleWorld, column: usize, anchor: Vec3) -> bool {
        let Some(&id) = self.anchor_springs.get(column) else {
            return false;
        };
        match world.force_registry_mut().generator_mut(id) {
            Some(ForceGenerator::AnchoredFakeStiffSpring(spring)) => {
                spring.set_anchor(anchor);
                true
            }
            _ => false,
        }
    }
}

impl ClothBuilder {
    pub fn new(anchors: Vec<Vec3>, rows: usize) -> Self {
        Self {
            anchors,
            rows,
            ..Self::default()
        }
    }

    pub fn with_springs(mut self, spring_constant: f32, damping: f32) -> Self {
        self.spring_constant = spring_constant;
        self.damping = damping;
        self
    }

    pub fn with_contact_generators(mut self, generators: impl IntoIterator<Item = usize>) -> Self {
        self.contact_generators = generators.into_iter().collect();
        self
    }

    /// Spawns the grid and registers its springs. Neighbour links use half
    /// the anchor stiffness and are registered in both directions.
    ///
    /// Returns `None`, leaving the world unchanged, if the pool cannot hold
    /// the whole grid.
    pub fn build(&self, world: &mut ParticleWorld) -> Option<Cloth> {
        let columns = self.anchors.len();
        if columns == 0 || self.rows == 0 {
            return None;
        }
        if world.pool_free_count() < columns * self.rows {
            log::debug!(
                "cloth of {} particles does not fit in {} free slots",
                columns * self.rows,
                world.pool_free_count()
            );
            return None;
        }

        let mut grid = Vec::with_capacity(columns);
        for &anchor in &self.anchors {
            let mut column = Vec::with_capacity(self.rows);
            for row in 0..self.rows {
                let id = self.spawn(world, anchor + Vec3::NEG_Y * self.spacing * row as f32)?;
                column.push(id);
            }
            grid.push(column);
        }

        let link_constant = self.spring_constant / 2.0;
        let registry = world.force_registry_mut();
        let mut link = |particle: ParticleId, other: ParticleId| {
            let spring = registry.add_generator(FakeStiffSpringForce::new(
                other,
                link_constant,
                self.damping,
            ));
            registry.add(particle, spring);
        };

        for column in &grid {
            for pair in column.windows(2) {
                link(pair[1], pair[0]);
                link(pair[0], pair[1]);
            }
        }
        for pair in grid.windows(2) {
            for row in 0..self.rows {
                link(pair[1][row], pair[0][row]);
                link(pair[0][row], pair[1][row]);
            }
        }

        let mut anchor_springs = Vec::with_capacity(columns);
        for (column, &anchor) in grid.iter().zip(&self.anchors) {
            let spring = registry.add_generator(AnchoredFakeStiffSpringForce::new(
                anchor,
                self.spring_constant,
                self.damping,
            ));
            registry.add(column[0], spring);
            anchor_springs.push(spring);
        }

        Some(Cloth {
            grid,
            anchor_springs,
        })
    }

    fn spawn(&self, world: &mut ParticleWorld, position: Vec3) -> Option<ParticleId> {
        let id = world.get_new_particle()?;
        let particle = world.particle_mut(id)?;
        particle.set_position(position);
        particle.set_mass(self.mass);
        particle.set_acceleration(self.gravity);
        particle.set_radius(self.radius);
        particle.set_particle_type(ParticleType::Cloth);
        particle.set_bounciness(0.0);

        for &index in &self.contact_generators {
            if let Some(generator) = world.contact_generator_mut(index) {
                generator.add_particle(id);
            }
        }
        Some(id)
    }
}
