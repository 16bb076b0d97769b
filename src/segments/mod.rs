pub mod model;
pub mod tracker;

pub use model::{segment_score, Segment};
pub use tracker::SegmentTracker;
