use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::gaze::{FramePoint, FrameSignal, Gaze};

/// Random walk between looking at and away from the camera.
///
/// Each frame keeps the current mode with high probability, so contact
/// arrives in runs of a few seconds rather than per-frame flicker.
pub struct SyntheticGaze {
    looking: bool,
    stay_probability: f64,
    blink_probability: f64,
    drop_probability: f64,
    rng: StdRng,
}

impl SyntheticGaze {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            looking: true,
            stay_probability: 0.97,
            blink_probability: 0.03,
            drop_probability: 0.02,
            rng,
        }
    }

    /// `None` stands for a frame the detector did not finish in time.
    pub fn next_frame(&mut self, now: DateTime<Utc>) -> Option<FramePoint> {
        if self.rng.gen_bool(self.drop_probability) {
            return None;
        }
        if !self.rng.gen_bool(self.stay_probability) {
            self.looking = !self.looking;
        }

        let spread = if self.looking { 0.1 } else { 0.6 };
        let gaze = Gaze {
            x: self.rng.gen_range(-spread..spread),
            y: self.rng.gen_range(-spread..spread),
        };

        Some(
            FrameSignal {
                face_detected: true,
                landmarks_detected: true,
                eye_contact: self.looking,
                gaze,
                blink: self.rng.gen_bool(self.blink_probability),
            }
            .at(now),
        )
    }
}

impl Default for SyntheticGaze {
    fn default() -> Self {
        Self::new()
    }
}
