use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

/// Voice sampling and smoothing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VoiceConfig {
    /// Cadence of audio buffer sampling
    pub sample_interval_ms: u64,

    /// EMA factors; pitch is smoothed harder because raw estimates are noisier
    pub volume_alpha: f64,
    pub pitch_alpha: f64,

    /// Smoothed volume (RMS percent, 0-100) above which the user is speaking
    pub speaking_threshold: f64,
    /// How long volume must stay below threshold before speaking turns off
    pub speaking_hold_ms: u64,

    /// Peak meter hold, then per-tick decay toward the smoothed value
    pub peak_hold_ms: u64,
    pub peak_decay: f64,

    /// Smallest autocorrelation lag considered; excludes DC and very high pitches
    pub min_lag: usize,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 50,
            volume_alpha: 0.3,
            pitch_alpha: 0.2,
            speaking_threshold: 5.0,
            speaking_hold_ms: 500,
            peak_hold_ms: 1000,
            peak_decay: 0.95,
            min_lag: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FrameConfig {
    /// Cadence of eye-contact frames; each contact frame credits this much time
    pub frame_interval_ms: u64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SegmentConfig {
    /// Wall-clock length after which the open segment is closed and a new one opened
    pub segment_length_secs: u64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            segment_length_secs: 60,
        }
    }
}

/// Live score bonuses and final engagement weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoringConfig {
    pub stability_bonus: f64,
    pub duration_bonus_cap: f64,
    pub duration_bonus_divisor: f64,

    /// Final combination weights, must sum to 1
    pub eye_contact_weight: f64,
    pub speech_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            stability_bonus: 5.0,
            duration_bonus_cap: 10.0,
            duration_bonus_divisor: 2.0,
            eye_contact_weight: 0.4,
            speech_weight: 0.6,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoachConfig {
    pub voice: VoiceConfig,
    pub frames: FrameConfig,
    pub segments: SegmentConfig,
    pub scoring: ScoringConfig,
}

impl CoachConfig {
    /// Load from a JSON file. A missing file means defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config in {}", path.display()))?
        } else {
            log::info!("No config at {}, using defaults", path.display());
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, alpha) in [
            ("volumeAlpha", self.voice.volume_alpha),
            ("pitchAlpha", self.voice.pitch_alpha),
        ] {
            if !(alpha > 0.0 && alpha <= 1.0) {
                bail!("{name} must be in (0, 1], got {alpha}");
            }
        }
        if !(self.voice.peak_decay > 0.0 && self.voice.peak_decay < 1.0) {
            bail!("peakDecay must be in (0, 1), got {}", self.voice.peak_decay);
        }
        if self.voice.sample_interval_ms == 0 || self.frames.frame_interval_ms == 0 {
            bail!("sampling intervals must be greater than zero");
        }
        if self.segments.segment_length_secs == 0 {
            bail!("segmentLengthSecs must be greater than zero");
        }
        if self.scoring.duration_bonus_divisor <= 0.0 {
            bail!("durationBonusDivisor must be positive");
        }
        let weights = self.scoring.eye_contact_weight + self.scoring.speech_weight;
        if (weights - 1.0).abs() > 1e-9 {
            bail!("engagement weights must sum to 1, got {weights}");
        }
        Ok(())
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frames.frame_interval_ms)
    }

    pub fn voice_interval(&self) -> Duration {
        Duration::from_millis(self.voice.sample_interval_ms)
    }
}
