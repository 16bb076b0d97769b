use std::f32::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::noise::BrownNoise;

pub const SAMPLE_RATE: u32 = 16_000;

/// Speech-like test signal: phrases of a gliding tone separated by pauses,
/// over a brown-noise floor.
pub struct SyntheticVoice {
    base_freq: f32,
    glide_hz: f32,
    amplitude: f32,
    num_sample: usize,
    phase: f32,
    phrase_left: usize,
    pause_left: usize,
    noise: BrownNoise,
    rng: StdRng,
}

impl SyntheticVoice {
    pub fn new(base_freq: f32) -> Self {
        Self::build(base_freq, StdRng::from_entropy(), BrownNoise::new(0.02))
    }

    pub fn seeded(base_freq: f32, seed: u64) -> Self {
        Self::build(
            base_freq,
            StdRng::seed_from_u64(seed),
            BrownNoise::seeded(0.02, seed.wrapping_add(1)),
        )
    }

    fn build(base_freq: f32, rng: StdRng, noise: BrownNoise) -> Self {
        let mut voice = Self {
            base_freq,
            glide_hz: 20.0,
            amplitude: 0.4,
            num_sample: 0,
            phase: 0.0,
            phrase_left: 0,
            pause_left: 0,
            noise,
            rng,
        };
        voice.next_phrase();
        voice
    }

    /// Pulls the next `len` samples as one capture window.
    pub fn window(&mut self, len: usize) -> Vec<f32> {
        self.by_ref().take(len).collect()
    }

    fn next_phrase(&mut self) {
        let rate = SAMPLE_RATE as f32;
        self.phrase_left = (self.rng.gen_range(1.5..4.0) * rate) as usize;
        self.pause_left = (self.rng.gen_range(0.3..1.2) * rate) as usize;
    }

    fn is_speaking(&self) -> bool {
        self.phrase_left > 0
    }
}

impl Iterator for SyntheticVoice {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        self.num_sample = self.num_sample.wrapping_add(1);
        let noise = self.noise.next().unwrap_or_default();

        if !self.is_speaking() {
            if self.pause_left == 0 {
                self.next_phrase();
            } else {
                self.pause_left -= 1;
            }
            return Some(noise);
        }
        self.phrase_left -= 1;

        // slow intonation drift around the base pitch
        let t = self.num_sample as f32 / SAMPLE_RATE as f32;
        let freq = self.base_freq + self.glide_hz * (2.0 * PI * 0.5 * t).sin();
        self.phase = (self.phase + 2.0 * PI * freq / SAMPLE_RATE as f32) % (2.0 * PI);

        Some(self.amplitude * self.phase.sin() + noise)
    }
}
