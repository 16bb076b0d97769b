use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    analysis::AnalysisResult, scoring::LiveFeedback, segments::Segment, voice::VoiceSample,
};

use super::{state::SessionState, summary::SessionSummary};

/// Everything the core tells the outside world, one variant per payload shape.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    StateChanged {
        state: SessionState,
        session_id: Option<String>,
    },
    Voice {
        session_id: String,
        sample: VoiceSample,
    },
    Frame {
        session_id: String,
        feedback: LiveFeedback,
    },
    SegmentClosed {
        session_id: String,
        segment: Segment,
    },
    Stopped {
        summary: SessionSummary,
    },
    Analyzed {
        result: Box<AnalysisResult>,
    },
    Error {
        message: String,
    },
}

pub type EventSender = UnboundedSender<SessionEvent>;

/// Best effort: a dropped receiver must never fail a tick.
pub(crate) fn emit(sender: Option<&EventSender>, event: SessionEvent) {
    if let Some(sender) = sender {
        let _ = sender.send(event);
    }
}
