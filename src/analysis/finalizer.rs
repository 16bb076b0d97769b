use chrono::{DateTime, Utc};

use crate::{config::ScoringConfig, session::SessionSummary, voice::VoiceAggregates};

use super::types::{
    AnalysisResult, EngagementLevel, GazeStability, Priority, Recommendation, RecommendationKind,
    SpeechMetrics, VoiceEngagement,
};

const EYE_CONTACT_TARGET: f64 = 60.0;
const CLARITY_TARGET: f64 = 70.0;
const PACE_BAND_WPM: (f64, f64) = (120.0, 150.0);
const FOCUS_SCALE: f64 = 0.8;
/// Volume variance (RMS-percent squared) at which consistency bottoms out
const VOLUME_VARIANCE_SPAN: f64 = 1000.0;
/// Pitch range in Hz that counts as fully varied
const PITCH_RANGE_SPAN_HZ: f64 = 200.0;

/// Combines the frozen session summary with transcript metrics.
pub struct AnalysisFinalizer {
    config: ScoringConfig,
}

impl AnalysisFinalizer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn finalize(
        &self,
        summary: SessionSummary,
        speech: Option<SpeechMetrics>,
        analyzed_at: DateTime<Utc>,
    ) -> AnalysisResult {
        let incomplete = summary.total_frames == 0 && summary.voice.tick_count == 0;
        let eye = summary.eye_contact_percentage;

        // a transcript with no words is the same as no transcript
        let spoken = speech.filter(|s| s.word_count > 0);
        let no_speech_detected = spoken.is_none();

        let overall_engagement = if incomplete {
            0
        } else {
            let combined = match spoken {
                Some(s) => {
                    eye * self.config.eye_contact_weight
                        + s.clarity_score.clamp(0.0, 100.0) * self.config.speech_weight
                }
                None => eye,
            };
            combined.round().clamp(0.0, 100.0) as u32
        };

        let recommendations = if incomplete {
            Vec::new()
        } else {
            recommendations_for(eye, spoken.as_ref())
        };

        AnalysisResult {
            session_id: summary.session_id.clone(),
            analyzed_at,
            engagement_level: EngagementLevel::from_eye_contact(eye),
            focus_consistency: (eye * FOCUS_SCALE * 10.0).round() / 10.0,
            gaze_stability: GazeStability::from_eye_contact(eye),
            voice_engagement: voice_engagement(&summary.voice),
            summary,
            speech,
            overall_engagement,
            no_speech_detected,
            incomplete,
            recommendations,
        }
    }
}

fn voice_engagement(voice: &VoiceAggregates) -> Option<VoiceEngagement> {
    if voice.tick_count == 0 {
        return None;
    }
    let volume_consistency = 1.0 - (voice.volume_variance / VOLUME_VARIANCE_SPAN).min(1.0);
    let pitch_variation = (voice.pitch_range_hz / PITCH_RANGE_SPAN_HZ).min(1.0);
    Some(VoiceEngagement {
        volume_consistency,
        pitch_variation,
        factor: (volume_consistency + pitch_variation) / 2.0,
    })
}

fn recommendations_for(eye_contact: f64, speech: Option<&SpeechMetrics>) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if eye_contact < EYE_CONTACT_TARGET {
        recommendations.push(Recommendation {
            kind: RecommendationKind::EyeContact,
            priority: Priority::High,
            title: "Improve Eye Contact".into(),
            description: "Practice maintaining eye contact for 50-70% of your speaking time"
                .into(),
        });
    }

    if let Some(speech) = speech {
        if speech.clarity_score < CLARITY_TARGET {
            recommendations.push(Recommendation {
                kind: RecommendationKind::SpeechClarity,
                priority: Priority::Medium,
                title: "Enhance Speech Clarity".into(),
                description: "Work on pronunciation and reduce filler words".into(),
            });
        }

        let (slow, fast) = PACE_BAND_WPM;
        if speech.speech_rate_wpm < slow || speech.speech_rate_wpm > fast {
            recommendations.push(Recommendation {
                kind: RecommendationKind::Pace,
                priority: Priority::Medium,
                title: "Adjust Your Pace".into(),
                description: format!(
                    "You spoke at {:.0} words per minute; aim for {slow:.0}-{fast:.0}",
                    speech.speech_rate_wpm
                ),
            });
        }
    }

    recommendations
}
