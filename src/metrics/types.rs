use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TickKind {
    Frame,
    Voice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TickOutcome {
    Processed,
    /// Producer had nothing ready; the tick is not backfilled.
    Missed,
    /// Input was rejected (malformed buffer, out-of-order frame).
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickMetrics {
    pub timestamp: DateTime<Utc>,
    pub kind: TickKind,
    pub outcome: TickOutcome,
    pub processing_us: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickCounts {
    pub processed: u64,
    pub missed: u64,
    pub skipped: u64,
}

impl TickCounts {
    pub fn total(&self) -> u64 {
        self.processed + self.missed + self.skipped
    }

    pub(crate) fn bump(&mut self, outcome: TickOutcome) {
        match outcome {
            TickOutcome::Processed => self.processed += 1,
            TickOutcome::Missed => self.missed += 1,
            TickOutcome::Skipped => self.skipped += 1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetrics {
    pub cpu_percent: f32,
    pub memory_mb: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub system: SystemMetrics,
    pub recent_ticks: Vec<TickMetrics>,
    pub frame_ticks: TickCounts,
    pub voice_ticks: TickCounts,
    /// Mean processing time of processed ticks, microseconds
    pub mean_frame_us: f64,
    pub mean_voice_us: f64,
}
