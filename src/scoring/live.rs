use serde::Serialize;

use crate::{config::ScoringConfig, gaze::EyeContactState};

use super::tips::CoachingTip;

/// Per-frame feedback for the UI. Derived only from the current aggregator state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveFeedback {
    pub eye_contact: bool,
    pub eye_contact_percentage: f64,
    pub current_eye_contact_secs: f64,
    pub stability_bonus: f64,
    pub duration_bonus: f64,
    pub live_score: f64,
    pub tip: CoachingTip,
    pub coaching_tip: &'static str,
}

/// `clamp(percentage + stability_bonus + duration_bonus, 0, 100)`.
pub fn evaluate(state: &EyeContactState, config: &ScoringConfig) -> LiveFeedback {
    let stability_bonus = if state.eye_contact {
        config.stability_bonus
    } else {
        0.0
    };
    let duration_bonus = (state.current_eye_contact_secs / config.duration_bonus_divisor)
        .clamp(0.0, config.duration_bonus_cap);

    let live_score =
        (state.eye_contact_percentage + stability_bonus + duration_bonus).clamp(0.0, 100.0);
    let tip = CoachingTip::select(state);

    LiveFeedback {
        eye_contact: state.eye_contact,
        eye_contact_percentage: state.eye_contact_percentage,
        current_eye_contact_secs: state.current_eye_contact_secs,
        stability_bonus,
        duration_bonus,
        live_score,
        tip,
        coaching_tip: tip.message(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn state(contact: bool, pct: f64, secs: f64) -> EyeContactState {
        EyeContactState {
            timestamp: Utc::now(),
            face_detected: true,
            landmarks_detected: true,
            eye_contact: contact,
            eye_contact_percentage: pct,
            current_eye_contact_secs: secs,
            total_eye_contact_secs: 0.0,
            blink_count: 0,
        }
    }

    #[test]
    fn seventy_percent_holding_four_seconds_scores_77() {
        let feedback = evaluate(&state(true, 70.0, 4.0), &ScoringConfig::default());
        assert_eq!(feedback.stability_bonus, 5.0);
        assert_eq!(feedback.duration_bonus, 2.0);
        assert_eq!(feedback.live_score, 77.0);
        assert_eq!(feedback.tip, CoachingTip::HoldingSteady);
    }

    #[test]
    fn duration_bonus_is_capped() {
        let feedback = evaluate(&state(true, 10.0, 300.0), &ScoringConfig::default());
        assert_eq!(feedback.duration_bonus, 10.0);
        assert_eq!(feedback.live_score, 25.0);
    }

    #[test]
    fn live_score_stays_in_bounds() {
        let config = ScoringConfig::default();
        for pct in [0.0, 33.3, 92.0, 100.0] {
            for secs in [0.0, 1.0, 7.5, 60.0] {
                for contact in [true, false] {
                    let score = evaluate(&state(contact, pct, secs), &config).live_score;
                    assert!((0.0..=100.0).contains(&score), "{pct} {secs} {contact}: {score}");
                }
            }
        }
    }

    #[test]
    fn no_contact_gets_no_stability_bonus() {
        let feedback = evaluate(&state(false, 40.0, 0.0), &ScoringConfig::default());
        assert_eq!(feedback.live_score, 40.0);
        assert_eq!(feedback.tip, CoachingTip::SometimesLooking);
    }
}
