pub mod aggregator;
pub mod types;

pub use aggregator::EyeContactAggregator;
pub use types::{ContactRun, EyeContactState, FramePoint, FrameSignal, Gaze};
