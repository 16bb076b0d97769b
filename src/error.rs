use thiserror::Error;

use crate::session::SessionState;

/// Lifecycle failures surfaced synchronously to whoever drives a session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// Camera or microphone could not be acquired. The controller is back in `Idle`.
    #[error("media acquisition failed: {0}")]
    Acquisition(String),

    /// The requested action is not valid from the current state. Nothing was mutated.
    #[error("cannot {action} while session is {state:?}")]
    InvalidTransition {
        state: SessionState,
        action: &'static str,
    },

    #[error("session {0} is already active")]
    AlreadyActive(String),
}

/// Reasons an audio buffer is rejected before any estimator touches it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BufferError {
    #[error("audio buffer is empty")]
    Empty,

    #[error("audio buffer length {0} is not a power of two")]
    NotPowerOfTwo(usize),

    #[error("audio buffer has a zero sample rate")]
    ZeroSampleRate,

    #[error("audio buffer contains a non-finite sample at index {0}")]
    NonFinite(usize),

    #[error("audio buffer is older than the previous voice tick")]
    OutOfOrder,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error("frame is older than the previous frame tick")]
    OutOfOrder,
}
