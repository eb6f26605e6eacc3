//! Time management utilities
//!
//! Detection runs on its own capped cadence, decoupled from the render loop,
//! and the kinematic backend steps its contact world with a fixed timestep.
//! Both take the current `Instant` from the caller so tests can drive time.

use std::time::{Duration, Instant};

/// Gate that lets work through at most once per interval.
#[derive(Debug)]
pub struct IntervalGate {
    interval: Duration,
    last_run: Option<Instant>,
}

impl IntervalGate {
    /// Create a gate with the given minimum interval between runs.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
        }
    }

    /// Returns true (and records the run) if enough time has passed since the
    /// previous accepted run. The first call always passes.
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last_run {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last_run = Some(now);
                true
            }
        }
    }

    /// Forget the previous run so the next `ready` call passes immediately.
    pub fn reset(&mut self) {
        self.last_run = None;
    }

    /// Replace the interval; takes effect from the next `ready` check.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }
}

/// Fixed-timestep accumulator.
///
/// Wall-clock jitter is absorbed by the accumulator; consumers always see
/// whole steps of the same size, capped at `max_substeps` per update.
#[derive(Debug)]
pub struct FixedStep {
    step: Duration,
    max_substeps: u32,
    accumulated: Duration,
    last_update: Option<Instant>,
}

impl FixedStep {
    /// Create an accumulator with the given step size and substep cap.
    pub fn new(step: Duration, max_substeps: u32) -> Self {
        Self {
            step,
            max_substeps,
            accumulated: Duration::ZERO,
            last_update: None,
        }
    }

    /// Advance to `now` and return how many fixed steps to execute (0..=cap).
    pub fn advance(&mut self, now: Instant) -> u32 {
        if let Some(last) = self.last_update {
            self.accumulated += now.saturating_duration_since(last);
        } else {
            // First update runs exactly one step.
            self.accumulated = self.step;
        }
        self.last_update = Some(now);

        let mut steps = 0;
        while self.accumulated >= self.step && steps < self.max_substeps {
            self.accumulated -= self.step;
            steps += 1;
        }
        // Drop any backlog beyond the cap instead of spiraling.
        if self.accumulated >= self.step {
            self.accumulated = Duration::ZERO;
        }
        steps
    }

    /// The fixed step size in seconds.
    pub fn step_seconds(&self) -> f32 {
        self.step.as_secs_f32()
    }

    /// Clear accumulated time and the last-update mark.
    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.last_update = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_passes_first_call_then_enforces_interval() {
        let mut gate = IntervalGate::new(Duration::from_millis(100));
        let t0 = Instant::now();
        assert!(gate.ready(t0));
        assert!(!gate.ready(t0 + Duration::from_millis(50)));
        assert!(gate.ready(t0 + Duration::from_millis(150)));
    }

    #[test]
    fn gate_reset_allows_immediate_run() {
        let mut gate = IntervalGate::new(Duration::from_millis(100));
        let t0 = Instant::now();
        assert!(gate.ready(t0));
        gate.reset();
        assert!(gate.ready(t0 + Duration::from_millis(1)));
    }

    #[test]
    fn fixed_step_caps_substeps() {
        let mut stepper = FixedStep::new(Duration::from_millis(16), 3);
        let t0 = Instant::now();
        assert_eq!(stepper.advance(t0), 1);
        // A long stall yields at most the substep cap, no backlog carryover.
        assert_eq!(stepper.advance(t0 + Duration::from_secs(1)), 3);
        assert_eq!(stepper.advance(t0 + Duration::from_secs(1)), 0);
    }
}
