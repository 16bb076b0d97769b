use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of one practice attempt.
///
/// `Idle -> Recording -> Active -> Stopped -> Analyzed`. Any unrecoverable
/// failure drops straight back to `Idle`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
    Active,
    Stopped,
    Analyzed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Recording => "recording",
            SessionState::Active => "active",
            SessionState::Stopped => "stopped",
            SessionState::Analyzed => "analyzed",
        }
    }

    /// Stop is accepted (possibly as a no-op) from here on.
    pub fn is_at_or_after_active(&self) -> bool {
        matches!(
            self,
            SessionState::Active | SessionState::Stopped | SessionState::Analyzed
        )
    }
}

/// Point-in-time view of the controller for status queries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub session_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub frame_ticks: u64,
    pub voice_ticks: u64,
    pub eye_contact_percentage: f64,
    pub open_segment: Option<usize>,
    pub closed_segments: usize,
    pub devices_held: bool,
}
