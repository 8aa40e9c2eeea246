use std::time::Duration;

/// Timing and counters for the most recent [`crate::world::ParticleWorld`] step.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct StepProfile {
    pub start_frame_time: Duration,
    pub force_time: Duration,
    pub integrate_time: Duration,
    pub contact_generation_time: Duration,
    pub resolve_time: Duration,

    pub active_particles: usize,
    pub reclaimed_particles: usize,
    pub contacts_generated: usize,
    /// Generators that found the contact buffer already full. They still
    /// apply destruction rules but write no contacts.
    pub generators_skipped: usize,
    pub resolver_iterations: u32,
}

impl StepProfile {
    pub fn total_time(&self) -> Duration {
        self.start_frame_time
            + self.force_time
            + self.integrate_time
            + self.contact_generation_time
            + self.resolve_time
    }

    pub fn report(&self) {
        let total = self.total_time();
        let total_us = total.as_micros() as f32;
        if total_us < 1.0 {
            return;
        }
        let share = |phase: Duration| (phase.as_micros() as f32 / total_us) * 100.0;

        log::info!(
            "step: {:.2} ms, {} active, {} reclaimed, {} contacts ({} generators skipped), {} resolver iterations",
            total.as_secs_f32() * 1000.0,
            self.active_particles,
            self.reclaimed_particles,
            self.contacts_generated,
            self.generators_skipped,
            self.resolver_iterations
        );
        log::info!(
            "  start frame {:.1}% | forces {:.1}% | integrate {:.1}% | generate {:.1}% | resolve {:.1}%",
            share(self.start_frame_time),
            share(self.force_time),
            share(self.integrate_time),
            share(self.contact_generation_time),
            share(self.resolve_time)
        );
    }
}
