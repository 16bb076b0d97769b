use serde::{Deserialize, Serialize};

use crate::gaze::EyeContactState;

/// Live coaching hint. Exactly one applies to any eye-contact state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CoachingTip {
    NoFace,
    NoLandmarks,
    HoldingBrief,
    HoldingSteady,
    HoldingLong,
    RarelyLooking,
    SometimesLooking,
    LookBack,
}

impl CoachingTip {
    /// Walks the rule table top to bottom; the first matching row wins.
    pub fn select(state: &EyeContactState) -> Self {
        if !state.face_detected {
            return CoachingTip::NoFace;
        }
        if !state.landmarks_detected {
            return CoachingTip::NoLandmarks;
        }

        if state.eye_contact {
            match state.current_eye_contact_secs {
                d if d < 3.0 => CoachingTip::HoldingBrief,
                d if d < 6.0 => CoachingTip::HoldingSteady,
                _ => CoachingTip::HoldingLong,
            }
        } else {
            match state.eye_contact_percentage {
                p if p < 30.0 => CoachingTip::RarelyLooking,
                p if p < 50.0 => CoachingTip::SometimesLooking,
                _ => CoachingTip::LookBack,
            }
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            CoachingTip::NoFace => "Position yourself in front of the camera",
            CoachingTip::NoLandmarks => "Move closer or add light so your face is clearly visible",
            CoachingTip::HoldingBrief => "Good, keep your eyes on the audience",
            CoachingTip::HoldingSteady => "Great eye contact, stay steady",
            CoachingTip::HoldingLong => "Excellent! Shift your gaze naturally between points",
            CoachingTip::RarelyLooking => "Look at the camera more often",
            CoachingTip::SometimesLooking => "Try to return your gaze to the camera",
            CoachingTip::LookBack => "Bring your eyes back to the camera",
        }
    }
}
