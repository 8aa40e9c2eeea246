use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{
    collision::{contact::ParticleContact, generators::GeneratesContacts},
    core::{
        particle::{ManagesParticles, ParticleSet},
        types::LevelBounds,
    },
    utils::{allocator::ParticleArena, math::flatten},
};

/// Static line segment. `thickness` is only used when building render geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub start: Vec3,
    pub end: Vec3,
    pub thickness: f32,
}

impl Platform {
    pub fn new(start: Vec3, end: Vec3, thickness: f32) -> Self {
        Self {
            start,
            end,
            thickness,
        }
    }

    /// Ground, ceiling, left and right walls around `bounds`, wound so that
    /// each wall's render quad extends outside the level.
    pub fn level_walls(bounds: &LevelBounds, thickness: f32) -> [Platform; 4] {
        let (min, max) = (bounds.min, bounds.max);
        [
            Platform::new(Vec3::new(min.x, min.y, 0.0), Vec3::new(max.x, min.y, 0.0), thickness),
            Platform::new(Vec3::new(max.x, max.y, 0.0), Vec3::new(min.x, max.y, 0.0), thickness),
            Platform::new(Vec3::new(min.x, max.y, 0.0), Vec3::new(min.x, min.y, 0.0), thickness),
            Platform::new(Vec3::new(max.x, min.y, 0.0), Vec3::new(max.x, max.y, 0.0), thickness),
        ]
    }

    /// Point on the segment closest to `point`.
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let segment = self.end - self.start;
        let length_squared = segment.length_squared();
        let projection = (point - self.start).dot(segment);

        if projection <= 0.0 {
            self.start
        } else if projection >= length_squared {
            self.end
        } else {
            self.start + segment * (projection / length_squared)
        }
    }

    /// Two triangles covering the segment swept `thickness` along its
    /// clockwise perpendicular, flattened to z = 0.
    pub fn vertices(&self) -> [Vec3; 6] {
        let direction = self.end - self.start;
        let side = Vec3::new(direction.y, -direction.x, 0.0).normalize_or_zero() * self.thickness;
        let outer_start = self.start + side;
        [
            self.start,
            self.end,
            outer_start,
            outer_start,
            self.end,
            outer_start + direction,
        ]
        .map(flatten)
    }

    fn fallback_normal(&self) -> Vec3 {
        let direction = self.end - self.start;
        let normal = Vec3::new(-direction.y, direction.x, 0.0).normalize_or_zero();
        if normal == Vec3::ZERO {
            Vec3::Y
        } else {
            normal
        }
    }
}

/// Collides managed particles against a [`Platform`] treated as a capsule of
/// zero radius: the nearest feature is either endpoint or the perpendicular foot.
#[derive(Debug, Clone)]
pub struct PlatformContactGenerator {
    pub platform: Platform,
    particles: ParticleSet,
}

impl PlatformContactGenerator {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            particles: ParticleSet::new(),
        }
    }

    pub fn start(&self) -> Vec3 {
        self.platform.start
    }

    pub fn end(&self) -> Vec3 {
        self.platform.end
    }
}

impl GeneratesContacts for PlatformContactGenerator {
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

            let position = particle.position();
            let radius = particle.radius();
            let nearest = self.platform.closest_point(position);
            let offset = flatten(position - nearest);
            let distance = offset.length();
            if distance >= radius {
                continue;
            }

            let normal = if distance > f32::EPSILON {
                offset / distance
            } else {
                self.platform.fallback_normal()
            };

            contacts.push(ParticleContact::with_scenery(
                id,
                normal,
                radius - distance,
                particle.bounciness(),
            ));
            written += 1;
        }
        written
    }
}

impl ManagesParticles for PlatformContactGenerator {
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
    use crate::utils::allocator::ParticleId;
    use approx::assert_relative_eq;
    use glam::Vec2;

    fn spawn(arena: &mut ParticleArena, position: Vec3, radius: f32, bounciness: f32) -> ParticleId {
        let id = arena.acquire().unwrap();
        let particle = arena.get_mut(id).unwrap();
        particle.set_position(position);
        particle.set_radius(radius);
        particle.set_bounciness(bounciness);
        id
    }

    fn horizontal() -> PlatformContactGenerator {
        PlatformContactGenerator::new(Platform::new(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 2.0))
    }

    fn collide(generator: &mut PlatformContactGenerator, arena: &mut ParticleArena) -> Vec<ParticleContact> {
        let mut contacts = Vec::new();
        generator.add_contacts(arena, &mut contacts, usize::MAX);
        contacts
    }

    #[test]
    fn mid_segment_contact_uses_perpendicular_foot() {
        let mut arena = ParticleArena::with_capacity(1);
        let mut generator = horizontal();
        let id = spawn(&mut arena, Vec3::new(4.0, 0.5, 0.0), 1.0, 0.3);
        generator.add_particle(id);

        let contacts = collide(&mut generator, &mut arena);
        assert_eq!(contacts.len(), 1);
        assert_relative_eq!(contacts[0].normal, Vec3::Y);
        assert_relative_eq!(contacts[0].penetration, 0.5);
        assert_relative_eq!(contacts[0].restitution, 0.3);
    }

    #[test]
    fn particle_below_segment_is_pushed_down() {
        let mut arena = ParticleArena::with_capacity(1);
        let mut generator = horizontal();
        generator.add_particle(spawn(&mut arena, Vec3::new(4.0, -0.25, 0.0), 1.0, 0.0));

        let contacts = collide(&mut generator, &mut arena);
        assert_relative_eq!(contacts[0].normal, -Vec3::Y);
        assert_relative_eq!(contacts[0].penetration, 0.75);
    }

    #[test]
    fn endpoints_behave_like_circles() {
        let mut arena = ParticleArena::with_capacity(3);
        let mut generator = horizontal();
        let before_start = spawn(&mut arena, Vec3::new(-0.6, 0.0, 0.0), 1.0, 0.0);
        let past_end = spawn(&mut arena, Vec3::new(10.0, 0.0, 0.0) + Vec3::new(0.6, 0.8, 0.0) * 0.5, 1.0, 0.0);
        let diagonal_miss = spawn(&mut arena, Vec3::new(-0.8, -0.8, 0.0), 1.0, 0.0);
        generator.add_particles(&[before_start, past_end, diagonal_miss]);

        let contacts = collide(&mut generator, &mut arena);
        assert_eq!(contacts.len(), 2);
        assert_relative_eq!(contacts[0].normal, -Vec3::X);
        assert_relative_eq!(contacts[0].penetration, 0.4, epsilon = 1e-6);
        assert_relative_eq!(contacts[1].normal, Vec3::new(0.6, 0.8, 0.0), epsilon = 1e-6);
        assert_relative_eq!(contacts[1].penetration, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn depth_is_ignored_in_the_normal() {
        let mut arena = ParticleArena::with_capacity(1);
        let mut generator = horizontal();
        generator.add_particle(spawn(&mut arena, Vec3::new(5.0, 0.5, 3.0), 1.0, 0.0));

        let contacts = collide(&mut generator, &mut arena);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].normal.z, 0.0);
        assert_relative_eq!(contacts[0].penetration, 0.5);
    }

    #[test]
    fn centre_on_segment_falls_back_to_segment_normal() {
        let mut arena = ParticleArena::with_capacity(1);
        let mut generator = horizontal();
        generator.add_particle(spawn(&mut arena, Vec3::new(5.0, 0.0, 0.0), 1.0, 0.0));

        let contacts = collide(&mut generator, &mut arena);
        assert_relative_eq!(contacts[0].normal, Vec3::Y);
        assert_relative_eq!(contacts[0].penetration, 1.0);
    }

    #[test]
    fn level_walls_box_the_bounds() {
        let bounds = LevelBounds::from_half_extents(Vec2::new(4.0, 3.0));
        let walls = Platform::level_walls(&bounds, 1.0);

        assert_eq!(walls[0].start, Vec3::new(-4.0, -3.0, 0.0));
        assert_eq!(walls[0].end, Vec3::new(4.0, -3.0, 0.0));
        // Ground quad hangs below the floor.
        assert!(walls[0].vertices()[2].y < -3.0);
        // Ceiling quad sits above the top.
        assert!(walls[1].vertices()[2].y > 3.0);
    }
}
