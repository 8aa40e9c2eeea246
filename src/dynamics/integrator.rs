#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::utils::allocator::ParticleArena;

/// Steps every active particle in the pool forward in time.
#[derive(Debug, Clone, Default)]
pub struct Integrator {
    parallel: bool,
}

impl Integrator {
    pub fn new(parallel: bool) -> Self {
        Self { parallel }
    }

    /// Has no effect unless the `parallel` feature is compiled in.
    pub fn set_parallel(&mut self, enabled: bool) {
        self.parallel = enabled;
    }

    pub fn parallel(&self) -> bool {
        self.parallel && cfg!(feature = "parallel")
    }

    pub fn step(&self, particles: &mut ParticleArena, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        if self.parallel() {
            Self::step_parallel(particles, dt);
        } else {
            Self::step_sequential(particles, dt);
        }
    }

    fn step_sequential(particles: &mut ParticleArena, dt: f32) {
        particles
            .slots_mut()
            .iter_mut()
            .filter(|particle| particle.is_active())
            .for_each(|particle| particle.integrate(dt));
    }

    #[cfg(feature = "parallel")]
    fn step_parallel(particles: &mut ParticleArena, dt: f32) {
        particles
            .slots_mut()
            .par_iter_mut()
            .filter(|particle| particle.is_active())
            .for_each(|particle| particle.integrate(dt));
    }

    #[cfg(not(feature = "parallel"))]
    fn step_parallel(particles: &mut ParticleArena, dt: f32) {
        Self::step_sequential(particles, dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn falling_pool(count: usize) -> ParticleArena {
        let mut arena = ParticleArena::with_capacity(count);
        for i in 0..count {
            let id = arena.acquire().unwrap();
            let particle = arena.get_mut(id).unwrap();
            particle.set_position(Vec3::new(i as f32, 10.0, 0.0));
            particle.set_acceleration(Vec3::new(0.0, -10.0, 0.0));
        }
        arena
    }

    #[test]
    fn inactive_slots_are_skipped() {
        let mut arena = ParticleArena::with_capacity(2);
        let id = arena.acquire().unwrap();
        arena.get_mut(id).unwrap().set_velocity(Vec3::X);
        let parked = arena.acquire().unwrap();
        arena.get_mut(parked).unwrap().set_velocity(Vec3::X);
        arena.get_mut(parked).unwrap().set_active(false);

        Integrator::new(false).step(&mut arena, 0.5);

        assert!(arena.get(id).unwrap().position().x > 0.0);
        assert_eq!(arena.get(parked).unwrap().position(), Vec3::ZERO);
    }

    #[test]
    fn parallel_and_serial_agree() {
        let mut serial = falling_pool(64);
        let mut parallel = falling_pool(64);

        for _ in 0..10 {
            Integrator::new(false).step(&mut serial, 1.0 / 60.0);
            Integrator::new(true).step(&mut parallel, 1.0 / 60.0);
        }

        for (a, b) in serial.slots_mut().iter().zip(parallel.slots_mut().iter()) {
            assert_eq!(a.position(), b.position());
            assert_eq!(a.velocity(), b.velocity());
        }
    }
}
