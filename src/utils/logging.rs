use log::{Level, log_enabled, warn};
use std::time::{Duration, Instant};

/// Scoped timer for one step phase. Logs at `trace` and, when given a slot,
/// adds the elapsed time to it on drop.
pub struct ScopedTimer<'a> {
    label: &'a str,
    start: Instant,
    output: Option<&'a mut Duration>,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(label: &'a str) -> Self {
        if log_enabled!(Level::Trace) {
            log::trace!("⏱️ start {label}");
        }
        Self {
            label,
            start: Instant::now(),
            output: None,
        }
    }

    pub fn recording(label: &'a str, output: &'a mut Duration) -> Self {
        let mut timer = Self::new(label);
        timer.output = Some(output);
        timer
    }
}

impl<'a> Drop for ScopedTimer<'a> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        if let Some(output) = self.output.as_deref_mut() {
            *output += elapsed;
        }
        if log_enabled!(Level::Trace) {
            log::trace!("⏱️ end {} ({} µs)", self.label, elapsed.as_micros());
        }
    }
}

/// Logs a warning when a frame took longer than `budget_ms`. Returns whether it did.
pub fn warn_if_frame_budget_exceeded(duration: Duration, budget_ms: f32) -> bool {
    let elapsed_ms = duration.as_secs_f32() * 1000.0;
    if elapsed_ms > budget_ms {
        warn!("Frame exceeded budget: {elapsed_ms:.2} ms > {budget_ms:.2} ms");
        return true;
    }
    false
}
