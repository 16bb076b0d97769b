use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{segments::Segment, voice::VoiceAggregates};

/// Everything a session accumulated, frozen when it stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    pub duration_secs: f64,

    pub total_frames: u64,
    pub eye_contact_frames: u64,
    pub eye_contact_percentage: f64,
    pub total_eye_contact_secs: f64,
    /// Sum of every contiguous contact run
    pub continuous_contact_secs: f64,
    pub longest_run_secs: f64,
    pub contact_runs: usize,
    pub blink_count: u64,
    pub blink_rate_per_min: f64,
    /// Frames with a detected face over all frames, 0-1
    pub detection_rate: f64,

    pub segments: Vec<Segment>,
    pub voice: VoiceAggregates,

    pub skipped_frame_ticks: u64,
    pub skipped_voice_ticks: u64,
}
