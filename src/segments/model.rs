use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A sub-window of a session scored on its own.
///
/// While open, only `eye_contact_secs` grows. Closing fixes `end_time` and
/// `score`; closed segments are never mutated again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub index: usize,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub eye_contact_secs: f64,
    pub score: Option<f64>,
}

impl Segment {
    pub fn open(index: usize, start_time: DateTime<Utc>) -> Self {
        Self {
            index,
            start_time,
            end_time: None,
            eye_contact_secs: 0.0,
            score: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Seconds from start to `until`, never negative.
    pub fn duration_until(&self, until: DateTime<Utc>) -> f64 {
        ((until - self.start_time).num_milliseconds() as f64 / 1000.0).max(0.0)
    }

    pub fn duration_secs(&self) -> Option<f64> {
        self.end_time.map(|end| self.duration_until(end))
    }

    pub(crate) fn credit(&mut self, secs: f64) {
        if self.is_open() {
            self.eye_contact_secs += secs;
        }
    }

    /// Freezes the segment at `end_time`.
    ///
    /// Eye contact is credited per frame interval, so jittery frames can credit
    /// slightly more than the wall-clock span; it is capped at the duration.
    pub(crate) fn close(mut self, end_time: DateTime<Utc>) -> Self {
        let end_time = end_time.max(self.start_time);
        let duration = self.duration_until(end_time);

        self.eye_contact_secs = self.eye_contact_secs.min(duration);
        self.score = Some(segment_score(self.eye_contact_secs, duration));
        self.end_time = Some(end_time);
        self
    }
}

/// `100 * eye_contact / duration`, clamped to [0, 100]; zero for an empty span.
pub fn segment_score(eye_contact_secs: f64, duration_secs: f64) -> f64 {
    if duration_secs <= 0.0 {
        return 0.0;
    }
    (100.0 * eye_contact_secs / duration_secs).clamp(0.0, 100.0)
}
