use chrono::{DateTime, Utc};

use crate::{gaze::FramePoint, signal::AudioBuffer};

/// Supplies the latest analyzed camera frame on each frame tick.
///
/// Returning `None` means nothing was ready; the tick is recorded as missed and
/// never backfilled.
pub trait FrameSource: Send + 'static {
    fn poll_frame(&mut self, now: DateTime<Utc>) -> Option<FramePoint>;
}

/// Supplies the latest microphone window on each voice tick.
pub trait AudioSource: Send + 'static {
    fn poll_buffer(&mut self, now: DateTime<Utc>) -> Option<AudioBuffer>;
}
