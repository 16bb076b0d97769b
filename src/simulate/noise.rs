use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Brown noise (integrated white noise), used as room tone under the voice.
pub struct BrownNoise {
    last_value: f32,
    amplitude: f32,
    rng: StdRng,
}

impl BrownNoise {
    pub fn new(amplitude: f32) -> Self {
        Self::with_rng(amplitude, StdRng::from_entropy())
    }

    pub fn seeded(amplitude: f32, seed: u64) -> Self {
        Self::with_rng(amplitude, StdRng::seed_from_u64(seed))
    }

    fn with_rng(amplitude: f32, rng: StdRng) -> Self {
        Self {
            last_value: 0.0,
            amplitude,
            rng,
        }
    }
}

impl Iterator for BrownNoise {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let white: f32 = self.rng.gen_range(-1.0..1.0);

        self.last_value += white * 0.02;
        self.last_value = self.last_value.clamp(-1.0, 1.0);
        // leak towards zero so the walk has no DC offset
        self.last_value *= 0.9999;

        Some(self.last_value * self.amplitude)
    }
}
