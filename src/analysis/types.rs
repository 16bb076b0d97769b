use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionSummary;

/// Transcript metrics from the speech-to-text side, delivered after the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechMetrics {
    pub word_count: u32,
    pub duration_secs: f64,
    pub speech_rate_wpm: f64,
    /// 0-100 accuracy of the transcript (grammar/spelling/clarity)
    pub clarity_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngagementLevel {
    Low,
    Moderate,
    High,
}

impl EngagementLevel {
    pub fn from_eye_contact(percentage: f64) -> Self {
        if percentage >= 60.0 {
            EngagementLevel::High
        } else if percentage >= 30.0 {
            EngagementLevel::Moderate
        } else {
            EngagementLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementLevel::Low => "Low",
            EngagementLevel::Moderate => "Moderate",
            EngagementLevel::High => "High",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GazeStability {
    Moderate,
    Stable,
}

impl GazeStability {
    pub fn from_eye_contact(percentage: f64) -> Self {
        if percentage >= 50.0 {
            GazeStability::Stable
        } else {
            GazeStability::Moderate
        }
    }
}

/// How lively the voice was, each part normalized to 0-1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceEngagement {
    /// `1 - min(volume_variance / 1000, 1)`
    pub volume_consistency: f64,
    /// `min(pitch_range / 200, 1)`
    pub pitch_variation: f64,
    /// Mean of the two
    pub factor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    EyeContact,
    SpeechClarity,
    Pace,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub priority: Priority,
    pub title: String,
    pub description: String,
}

/// Terminal artifact of a session. Built once, never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub session_id: String,
    pub analyzed_at: DateTime<Utc>,
    pub summary: SessionSummary,
    pub speech: Option<SpeechMetrics>,
    pub overall_engagement: u32,
    pub engagement_level: EngagementLevel,
    /// Eye-contact percentage scaled by 0.8, one decimal
    pub focus_consistency: f64,
    pub gaze_stability: GazeStability,
    /// `None` when no voice tick was recorded
    pub voice_engagement: Option<VoiceEngagement>,
    pub no_speech_detected: bool,
    /// No frame or voice tick was ever recorded
    pub incomplete: bool,
    pub recommendations: Vec<Recommendation>,
}
