pub mod tracker;
pub mod types;

pub use tracker::{VoiceListener, VoiceTracker};
pub use types::{RunningStats, VoiceAggregates, VoicePoint, VoiceSample};
