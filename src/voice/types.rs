use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One voice sampling tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoicePoint {
    pub timestamp: DateTime<Utc>,
    pub raw_volume: f64,
    pub raw_pitch_hz: f64,
    pub smoothed_volume: f64,
    pub smoothed_pitch_hz: f64,
    pub peak_volume: f64,
    pub speaking: bool,
}

/// What downstream consumers get per voice tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSample {
    pub smoothed_volume: f64,
    pub smoothed_pitch_hz: f64,
    pub speaking: bool,
    pub timestamp: DateTime<Utc>,
}

impl From<&VoicePoint> for VoiceSample {
    fn from(point: &VoicePoint) -> Self {
        Self {
            smoothed_volume: point.smoothed_volume,
            smoothed_pitch_hz: point.smoothed_pitch_hz,
            speaking: point.speaking,
            timestamp: point.timestamp,
        }
    }
}

/// Running mean/variance/min/max without keeping the samples (Welford).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Population variance, matching how the live dashboard reports it.
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }

    pub fn min(&self) -> f64 {
        self.min.unwrap_or(0.0)
    }

    pub fn max(&self) -> f64 {
        self.max.unwrap_or(0.0)
    }

    pub fn range(&self) -> f64 {
        self.max() - self.min()
    }
}

/// Session-wide voice statistics frozen into the summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceAggregates {
    pub tick_count: u64,
    pub speaking_ticks: u64,
    pub voiced_ticks: u64,
    pub mean_volume: f64,
    pub volume_variance: f64,
    pub min_volume: f64,
    pub max_volume: f64,
    /// Raw pitch estimates, only from ticks where a pitch was detected
    pub mean_pitch_hz: f64,
    pub pitch_variance: f64,
    pub pitch_range_hz: f64,
    pub duration_secs: f64,
    pub timeline: Vec<VoiceSample>,
}
