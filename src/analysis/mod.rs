pub mod finalizer;
pub mod types;

pub use finalizer::AnalysisFinalizer;
pub use types::{
    AnalysisResult, EngagementLevel, GazeStability, Priority, Recommendation, RecommendationKind, SpeechMetrics,
    VoiceEngagement,
};
