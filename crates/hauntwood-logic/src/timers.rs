//! Countdown primitive shared by the scheduler and cinematic phases.

use serde::{Deserialize, Serialize};

/// A countdown that clamps at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    remaining: f32,
}

impl Countdown {
    pub fn new(secs: f32) -> Self {
        Self {
            remaining: secs.max(0.0),
        }
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn is_done(&self) -> bool {
        self.remaining <= 0.0
    }

    pub fn reset(&mut self, secs: f32) {
        self.remaining = secs.max(0.0);
    }

    pub fn add(&mut self, secs: f32) {
        self.remaining = (self.remaining + secs).max(0.0);
    }

    /// Decrement by `delta`. Returns true on the tick the countdown reaches
    /// zero; an already-expired countdown does not fire again.
    pub fn tick(&mut self, delta: f32) -> bool {
        if self.remaining <= 0.0 {
            return false;
        }
        self.remaining = (self.remaining - delta).max(0.0);
        self.remaining <= 0.0
    }
}

/// Elapsed-time accumulator for phases that end on a duration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseClock {
    pub elapsed: f32,
}

impl PhaseClock {
    pub fn advance(&mut self, delta: f32) -> f32 {
        self.elapsed += delta;
        self.elapsed
    }

    pub fn restart(&mut self) {
        self.elapsed = 0.0;
    }
}
