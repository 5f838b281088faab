//! Camera math: follow offsets, walking bob and transient shake.

use serde::{Deserialize, Serialize};

use crate::constants::camera::{BOB_AMPLITUDE, BOB_FREQUENCY, BOB_JITTER, FOLLOW_OFFSET};
use crate::geometry::Vec3;

pub fn follow_offset() -> Vec3 {
    Vec3::new(FOLLOW_OFFSET.0, FOLLOW_OFFSET.1, FOLLOW_OFFSET.2)
}

/// Offset used while the ritual survivors walk out; pulls back over time.
pub fn outro_offset(outro_secs: f32) -> Vec3 {
    let zoom = 1.0 + outro_secs * 0.2;
    Vec3::new(0.0, 20.0 * zoom, 25.0 * zoom)
}

/// Head bob for a walking camera. `noise` holds two samples in `[-0.5, 0.5)`.
pub fn bob_offset(bob_secs: f32, noise: (f32, f32)) -> Vec3 {
    Vec3::new(
        noise.0 * BOB_JITTER,
        (bob_secs * BOB_FREQUENCY).sin() * BOB_AMPLITUDE + noise.1 * BOB_JITTER,
        0.0,
    )
}

/// A transient shake whose intensity fades linearly to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraShake {
    pub intensity: f32,
    pub duration: f32,
    pub remaining: f32,
}

impl CameraShake {
    pub fn new(intensity: f32, duration: f32) -> Self {
        Self {
            intensity,
            duration,
            remaining: duration,
        }
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0.0 && self.intensity > 0.0
    }

    pub fn current_intensity(&self) -> f32 {
        if self.duration <= 0.0 || self.remaining <= 0.0 {
            0.0
        } else {
            self.intensity * (self.remaining / self.duration)
        }
    }

    /// Advance and return this tick's offset. `noise` as in [`bob_offset`].
    pub fn advance(&mut self, delta: f32, noise: (f32, f32)) -> Vec3 {
        if !self.is_active() {
            return Vec3::ZERO;
        }
        self.remaining = (self.remaining - delta).max(0.0);
        let k = self.current_intensity();
        if self.remaining <= 0.0 {
            self.intensity = 0.0;
        }
        Vec3::new(noise.0 * k, noise.1 * k, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shake_fades_linearly() {
        let mut s = CameraShake::new(1.0, 1.0);
        let a = s.advance(0.25, (0.5, 0.5));
        assert!((a.x - 0.375).abs() < 1e-6);
        s.advance(0.5, (0.0, 0.0));
        assert!((s.current_intensity() - 0.25).abs() < 1e-6);
        s.advance(1.0, (0.5, 0.5));
        assert!(!s.is_active());
        assert_eq!(s.advance(0.1, (0.5, 0.5)), Vec3::ZERO);
    }

    #[test]
    fn outro_pulls_back() {
        assert_eq!(outro_offset(0.0), Vec3::new(0.0, 20.0, 25.0));
        assert!(outro_offset(5.0).z > 25.0);
    }

    #[test]
    fn bob_is_bounded() {
        for i in 0..100 {
            let b = bob_offset(i as f32 * 0.05, (0.49, -0.5));
            assert!(b.y.abs() <= BOB_AMPLITUDE + BOB_JITTER);
        }
    }
}
