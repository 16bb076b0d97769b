//! Synthetic camera and microphone producers for the demo binary and tests.

pub mod gaze;
pub mod noise;
pub mod voice;

pub use gaze::SyntheticGaze;
pub use noise::BrownNoise;
pub use voice::{SyntheticVoice, SAMPLE_RATE};

use chrono::{DateTime, Utc};

use crate::{
    gaze::FramePoint,
    runner::{AudioSource, FrameSource},
    signal::AudioBuffer,
};

const WINDOW_LEN: usize = 1024;

impl FrameSource for SyntheticGaze {
    fn poll_frame(&mut self, now: DateTime<Utc>) -> Option<FramePoint> {
        self.next_frame(now)
    }
}

impl AudioSource for SyntheticVoice {
    fn poll_buffer(&mut self, now: DateTime<Utc>) -> Option<AudioBuffer> {
        let window = self.window(WINDOW_LEN);
        Some(AudioBuffer::from_f32(&window, SAMPLE_RATE, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{autocorrelation_pitch, rms_percent};
    use chrono::{Duration, TimeZone};

    #[test]
    fn brown_noise_stays_bounded() {
        let noise = BrownNoise::seeded(0.3, 7);
        assert!(noise.take(50_000).all(|s| s.abs() <= 0.3));
    }

    #[test]
    fn synthetic_voice_has_phrases_and_pauses() {
        let mut voice = SyntheticVoice::seeded(160.0, 42);
        let volumes: Vec<f64> = (0..200)
            .map(|_| {
                let window: Vec<f64> = voice.window(WINDOW_LEN).into_iter().map(f64::from).collect();
                rms_percent(&window)
            })
            .collect();

        assert!(volumes.iter().any(|v| *v > 20.0));
        assert!(volumes.iter().any(|v| *v < 5.0));
    }

    #[test]
    fn synthetic_voice_pitch_is_near_base() {
        let mut voice = SyntheticVoice::seeded(160.0, 3);
        // the first phrase lasts at least 1.5s, so the opening window is voiced
        let window: Vec<f64> = voice.window(WINDOW_LEN).into_iter().map(f64::from).collect();
        let pitch = autocorrelation_pitch(&window, SAMPLE_RATE, 20);
        assert!((120.0..=200.0).contains(&pitch), "pitch {pitch}");
    }

    #[test]
    fn synthetic_gaze_produces_runs() {
        let start = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let mut gaze = SyntheticGaze::seeded(11);
        let frames: Vec<FramePoint> = (0..1000)
            .filter_map(|i| gaze.next_frame(start + Duration::milliseconds(i * 100)))
            .collect();

        assert!(frames.len() > 900);
        let switches = frames
            .windows(2)
            .filter(|pair| pair[0].eye_contact != pair[1].eye_contact)
            .count();
        assert!(switches > 0 && switches < 100);
    }
}
