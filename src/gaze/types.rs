use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized gaze offset from the face center, each axis roughly in [-1, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Gaze {
    pub x: f64,
    pub y: f64,
}

/// What the face/gaze detector reports for one frame, before timestamping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSignal {
    pub face_detected: bool,
    pub landmarks_detected: bool,
    pub eye_contact: bool,
    pub gaze: Gaze,
    pub blink: bool,
}

impl FrameSignal {
    pub fn at(self, timestamp: DateTime<Utc>) -> FramePoint {
        FramePoint {
            timestamp,
            face_detected: self.face_detected,
            landmarks_detected: self.landmarks_detected,
            eye_contact: self.eye_contact,
            gaze: self.gaze,
            blink: self.blink,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FramePoint {
    pub timestamp: DateTime<Utc>,
    pub face_detected: bool,
    pub landmarks_detected: bool,
    pub eye_contact: bool,
    pub gaze: Gaze,
    pub blink: bool,
}

impl FramePoint {
    /// Eye contact only counts when the detector actually saw a face with landmarks.
    pub fn has_contact(&self) -> bool {
        self.face_detected && self.landmarks_detected && self.eye_contact
    }
}

/// One uninterrupted stretch of eye contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRun {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_secs: f64,
}

/// Aggregator view after a frame tick; the input for live scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EyeContactState {
    pub timestamp: DateTime<Utc>,
    pub face_detected: bool,
    pub landmarks_detected: bool,
    pub eye_contact: bool,
    pub eye_contact_percentage: f64,
    pub current_eye_contact_secs: f64,
    pub total_eye_contact_secs: f64,
    pub blink_count: u64,
}
