//! Fixed-timestep accumulator that turns host callbacks into simulation steps.

use std::time::Duration;

use tracing::trace;

use crate::constants::{LOOP_TIME, MAX_FRAME_DELTA};

/// Converts monotonic host timestamps into a whole number of fixed steps.
///
/// Time between callbacks is clamped to `max_delta`, so a long stall yields a bounded
/// burst of catch-up steps instead of replaying the whole gap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedTimestep {
    step: Duration,
    max_delta: Duration,
    accumulator: Duration,
    last: Option<Duration>,
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(LOOP_TIME, MAX_FRAME_DELTA)
    }
}

impl FixedTimestep {
    pub fn new(step: Duration, max_delta: Duration) -> Self {
        Self {
            step,
            max_delta,
            accumulator: Duration::ZERO,
            last: None,
        }
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Time carried over towards the next step.
    pub fn accumulated(&self) -> Duration {
        self.accumulator
    }

    /// Records a host callback at `now` and returns how many steps are due.
    ///
    /// The first callback after construction or [`reset`](Self::reset) only establishes
    /// the reference point and yields no steps. Timestamps that go backwards count as zero.
    pub fn advance(&mut self, now: Duration) -> u32 {
        let Some(last) = self.last.replace(now) else {
            return 0;
        };

        let delta = now.saturating_sub(last);
        let clamped = delta.min(self.max_delta);
        if clamped < delta {
            trace!(?delta, ?clamped, "Frame delta clamped");
        }
        self.accumulator += clamped;

        let mut steps = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            steps += 1;
        }
        steps
    }

    /// Forgets the previous timestamp and any partial step.
    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
        self.last = None;
    }
}
