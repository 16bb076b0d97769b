pub mod live;
pub mod tips;

pub use live::{evaluate, LiveFeedback};
pub use tips::CoachingTip;
