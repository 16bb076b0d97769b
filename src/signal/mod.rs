pub mod buffer;
pub mod pitch;
pub mod smoother;
pub mod volume;

pub use buffer::AudioBuffer;
pub use pitch::{autocorrelation_pitch, NO_PITCH};
pub use smoother::{Ema, HysteresisGate, PeakHold, SignalSmoother, SmoothedReading};
pub use volume::rms_percent;
