use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    analysis::{AnalysisFinalizer, AnalysisResult, SpeechMetrics},
    config::CoachConfig,
    error::SessionError,
    gaze::{EyeContactAggregator, FramePoint},
    scoring::{self, LiveFeedback},
    segments::SegmentTracker,
    signal::AudioBuffer,
    voice::{VoicePoint, VoiceTracker},
};

use super::{
    devices::MediaDevices,
    events::{emit, EventSender, SessionEvent},
    state::{SessionSnapshot, SessionState},
    summary::SessionSummary,
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Per-session trackers; exist from `Active` until reset or error.
struct LiveSession {
    id: String,
    started_at: DateTime<Utc>,
    voice: VoiceTracker,
    eye: EyeContactAggregator,
    segments: SegmentTracker,
    skipped_frame_ticks: u64,
    skipped_voice_ticks: u64,
}

/// Owns one practice session end to end.
///
/// Every tick method is synchronous and never blocks; whoever schedules the
/// ticks (see [`crate::runner::SessionRunner`]) hands in already-captured data.
pub struct SessionController {
    config: CoachConfig,
    devices: Box<dyn MediaDevices>,
    events: Option<EventSender>,
    state: SessionState,
    live: Option<LiveSession>,
    summary: Option<SessionSummary>,
    result: Option<AnalysisResult>,
}

impl SessionController {
    pub fn new(config: CoachConfig, devices: Box<dyn MediaDevices>) -> Self {
        Self {
            config,
            devices,
            events: None,
            state: SessionState::Idle,
            live: None,
            summary: None,
            result: None,
        }
    }

    pub fn with_events(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &CoachConfig {
        &self.config
    }

    pub fn session_id(&self) -> Option<&str> {
        self.live.as_ref().map(|live| live.id.as_str())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let live = self.live.as_ref();
        SessionSnapshot {
            state: self.state,
            session_id: live.map(|l| l.id.clone()),
            started_at: live.map(|l| l.started_at),
            frame_ticks: live.map_or(0, |l| l.eye.total_frames()),
            voice_ticks: live.map_or(0, |l| l.voice.aggregates().tick_count),
            eye_contact_percentage: live.map_or(0.0, |l| l.eye.eye_contact_percentage()),
            open_segment: live.and_then(|l| l.segments.open_segment().map(|s| s.index)),
            closed_segments: live.map_or(0, |l| l.segments.history().len()),
            devices_held: self.devices.is_held(),
        }
    }

    /// `Idle -> Recording`. Acquires camera and microphone.
    pub fn start_recording(&mut self) -> Result<(), SessionError> {
        self.require(SessionState::Idle, "start recording")?;

        if let Err(reason) = self.devices.acquire() {
            log_error!("media acquisition failed: {}", reason);
            emit(
                self.events.as_ref(),
                SessionEvent::Error {
                    message: reason.clone(),
                },
            );
            return Err(SessionError::Acquisition(reason));
        }

        self.transition(SessionState::Recording);
        Ok(())
    }

    /// `Recording -> Active`. Allocates fresh trackers and the first segment.
    pub fn start_session(&mut self, now: DateTime<Utc>) -> Result<String, SessionError> {
        if self.state == SessionState::Active {
            let id = self.session_id().unwrap_or_default().to_string();
            return Err(SessionError::AlreadyActive(id));
        }
        self.require(SessionState::Recording, "start session")?;

        let id = Uuid::new_v4().to_string();
        let mut voice = VoiceTracker::new(self.config.voice.clone());
        if let Some(sender) = self.events.clone() {
            let session_id = id.clone();
            voice.set_listener(Box::new(move |sample| {
                let _ = sender.send(SessionEvent::Voice {
                    session_id: session_id.clone(),
                    sample,
                });
            }));
        }

        self.live = Some(LiveSession {
            id: id.clone(),
            started_at: now,
            voice,
            eye: EyeContactAggregator::new(self.config.frame_interval()),
            segments: SegmentTracker::new(now, self.config.segments.segment_length_secs),
            skipped_frame_ticks: 0,
            skipped_voice_ticks: 0,
        });
        self.summary = None;
        self.result = None;

        log_info!("session {} started", id);
        log_debug!("session {} config: {:?}", id, self.config);
        self.transition(SessionState::Active);
        Ok(id)
    }

    /// One frame tick. Returns `Ok(None)` when the tick was skipped or arrived after stop.
    pub fn ingest_frame(
        &mut self,
        frame: &FramePoint,
    ) -> Result<Option<LiveFeedback>, SessionError> {
        if matches!(self.state, SessionState::Stopped | SessionState::Analyzed) {
            return Ok(None);
        }
        self.require(SessionState::Active, "ingest frame")?;
        let Some(live) = self.live.as_mut() else {
            return Ok(None);
        };

        for closed in live.segments.roll_if_due(frame.timestamp) {
            log_info!(
                "session {} segment {} closed with score {:.1}",
                live.id,
                closed.index,
                closed.score.unwrap_or_default()
            );
            emit(
                self.events.as_ref(),
                SessionEvent::SegmentClosed {
                    session_id: live.id.clone(),
                    segment: closed.clone(),
                },
            );
        }

        let state = match live.eye.ingest(frame, &mut live.segments) {
            Ok(state) => state,
            Err(err) => {
                log_warn!("session {} skipping frame tick: {}", live.id, err);
                live.skipped_frame_ticks += 1;
                return Ok(None);
            }
        };

        let feedback = scoring::evaluate(&state, &self.config.scoring);
        emit(
            self.events.as_ref(),
            SessionEvent::Frame {
                session_id: live.id.clone(),
                feedback,
            },
        );
        Ok(Some(feedback))
    }

    /// One voice tick. Malformed buffers are logged and skipped, never fatal.
    pub fn ingest_audio(
        &mut self,
        buffer: &AudioBuffer,
    ) -> Result<Option<VoicePoint>, SessionError> {
        if matches!(self.state, SessionState::Stopped | SessionState::Analyzed) {
            return Ok(None);
        }
        self.require(SessionState::Active, "ingest audio")?;
        let Some(live) = self.live.as_mut() else {
            return Ok(None);
        };

        match live.voice.sample(buffer) {
            Ok(point) => Ok(point),
            Err(err) => {
                log_warn!("session {} skipping voice tick: {}", live.id, err);
                live.skipped_voice_ticks += 1;
                Ok(None)
            }
        }
    }

    /// `Active -> Stopped`. Repeated calls return the same frozen summary.
    pub fn stop_session(&mut self, now: DateTime<Utc>) -> Result<SessionSummary, SessionError> {
        if !self.state.is_at_or_after_active() {
            return Err(SessionError::InvalidTransition {
                state: self.state,
                action: "stop session",
            });
        }
        // only a completed stop leaves a summary behind
        if let Some(summary) = self.summary.as_ref() {
            return Ok(summary.clone());
        }
        let Some(live) = self.live.as_mut() else {
            return Err(SessionError::InvalidTransition {
                state: self.state,
                action: "stop session",
            });
        };

        let stopped_at = now.max(live.started_at);
        live.eye.finish(stopped_at);
        for closed in live.segments.roll_if_due(stopped_at) {
            emit(
                self.events.as_ref(),
                SessionEvent::SegmentClosed {
                    session_id: live.id.clone(),
                    segment: closed.clone(),
                },
            );
        }
        live.segments.close(stopped_at);
        let summary = summarize(live, stopped_at);
        live.voice.stop();
        self.devices.release();

        log_info!(
            "session {} stopped: {} frames, {:.1}% eye contact, {} segments",
            summary.session_id,
            summary.total_frames,
            summary.eye_contact_percentage,
            summary.segments.len()
        );

        self.summary = Some(summary.clone());
        self.transition(SessionState::Stopped);
        emit(
            self.events.as_ref(),
            SessionEvent::Stopped {
                summary: summary.clone(),
            },
        );
        Ok(summary)
    }

    /// `Stopped -> Analyzed`. A second call returns the cached result.
    pub fn analyze(
        &mut self,
        speech: Option<SpeechMetrics>,
        now: DateTime<Utc>,
    ) -> Result<AnalysisResult, SessionError> {
        if let (SessionState::Analyzed, Some(result)) = (self.state, self.result.as_ref()) {
            return Ok(result.clone());
        }
        self.require(SessionState::Stopped, "analyze")?;
        let Some(summary) = self.summary.clone() else {
            return Err(SessionError::InvalidTransition {
                state: self.state,
                action: "analyze",
            });
        };

        let result = AnalysisFinalizer::new(self.config.scoring.clone()).finalize(summary, speech, now);
        if result.incomplete {
            log_warn!("session {} analyzed with no recorded ticks", result.session_id);
        }
        log_info!(
            "session {} analyzed: engagement {}",
            result.session_id,
            result.overall_engagement
        );

        self.result = Some(result.clone());
        self.transition(SessionState::Analyzed);
        emit(
            self.events.as_ref(),
            SessionEvent::Analyzed {
                result: Box::new(result.clone()),
            },
        );
        Ok(result)
    }

    /// Unrecoverable external failure: report, tear everything down, back to `Idle`.
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        log_error!("session failed in {:?}: {}", self.state, message);

        if let Some(live) = self.live.as_mut() {
            live.voice.stop();
        }
        if self.state != SessionState::Idle {
            self.devices.release();
        }
        self.live = None;
        self.summary = None;
        self.result = None;

        emit(self.events.as_ref(), SessionEvent::Error { message });
        self.transition(SessionState::Idle);
    }

    /// Returns a finished controller to `Idle` so it can host another attempt.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Idle => Ok(()),
            SessionState::Stopped | SessionState::Analyzed => {
                self.live = None;
                self.summary = None;
                self.result = None;
                self.transition(SessionState::Idle);
                Ok(())
            }
            state => Err(SessionError::InvalidTransition {
                state,
                action: "reset",
            }),
        }
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    fn require(&self, expected: SessionState, action: &'static str) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                state: self.state,
                action,
            })
        }
    }

    fn transition(&mut self, next: SessionState) {
        self.state = next;
        emit(
            self.events.as_ref(),
            SessionEvent::StateChanged {
                state: next,
                session_id: self.session_id().map(str::to_string),
            },
        );
    }
}

fn summarize(live: &LiveSession, stopped_at: DateTime<Utc>) -> SessionSummary {
    let duration_secs = (stopped_at - live.started_at).num_milliseconds() as f64 / 1000.0;
    let blink_rate_per_min = if duration_secs > 0.0 {
        live.eye.blink_count() as f64 / (duration_secs / 60.0)
    } else {
        0.0
    };

    SessionSummary {
        session_id: live.id.clone(),
        started_at: live.started_at,
        stopped_at,
        duration_secs,
        total_frames: live.eye.total_frames(),
        eye_contact_frames: live.eye.eye_contact_frames(),
        eye_contact_percentage: live.eye.eye_contact_percentage(),
        total_eye_contact_secs: live.eye.total_eye_contact_secs(),
        continuous_contact_secs: live.eye.continuous_contact_secs(),
        longest_run_secs: live.eye.longest_run_secs(),
        contact_runs: live.eye.runs().len(),
        blink_count: live.eye.blink_count(),
        blink_rate_per_min,
        detection_rate: live.eye.detection_rate(),
        segments: live.segments.history().to_vec(),
        voice: live.voice.aggregates(),
        skipped_frame_ticks: live.skipped_frame_ticks,
        skipped_voice_ticks: live.skipped_voice_ticks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaze::{FrameSignal, Gaze};
    use crate::session::devices::NoopDevices;
    use chrono::TimeZone;
    use std::f32::consts::PI;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap()
    }

    fn frame(ms: i64, eye_contact: bool) -> FramePoint {
        FrameSignal {
            face_detected: true,
            landmarks_detected: true,
            eye_contact,
            gaze: Gaze::default(),
            blink: false,
        }
        .at(at(ms))
    }

    fn active_controller() -> SessionController {
        let mut controller =
            SessionController::new(CoachConfig::default(), Box::new(NoopDevices::default()));
        controller.start_recording().unwrap();
        controller.start_session(at(0)).unwrap();
        controller
    }

    struct DeniedDevices;

    impl MediaDevices for DeniedDevices {
        fn acquire(&mut self) -> Result<(), String> {
            Err("camera permission denied".into())
        }

        fn release(&mut self) {}

        fn is_held(&self) -> bool {
            false
        }
    }

    #[test]
    fn ten_second_session_end_to_end() {
        let mut controller = active_controller();

        for tick in 0..100 {
            let feedback = controller
                .ingest_frame(&frame(tick * 100, tick < 60))
                .unwrap()
                .unwrap();
            if tick == 60 {
                assert_eq!(feedback.current_eye_contact_secs, 0.0);
            }
        }

        let summary = controller.stop_session(at(10_000)).unwrap();
        assert!((summary.eye_contact_percentage - 60.0).abs() < 1e-9);
        assert_eq!(summary.contact_runs, 1);
        assert!((summary.continuous_contact_secs - 6.0).abs() < 1e-9);
        assert_eq!(summary.total_frames, 100);
        assert_eq!(summary.detection_rate, 1.0);
        assert_eq!(summary.segments.len(), 1);
        assert!((summary.segments[0].score.unwrap() - 60.0).abs() < 1e-9);
        assert_eq!(controller.state(), SessionState::Stopped);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut controller = active_controller();
        controller.ingest_frame(&frame(0, true)).unwrap();

        assert!(controller.snapshot().devices_held);
        let first = controller.stop_session(at(1_000)).unwrap();
        let second = controller.stop_session(at(9_000)).unwrap();
        assert_eq!(first, second);
        assert!(!controller.snapshot().devices_held);
        assert!(controller.ingest_frame(&frame(1_100, true)).unwrap().is_none());
    }

    #[test]
    fn invalid_transitions_do_not_mutate() {
        let mut controller =
            SessionController::new(CoachConfig::default(), Box::new(NoopDevices::default()));
        assert_eq!(
            controller.stop_session(at(0)),
            Err(SessionError::InvalidTransition {
                state: SessionState::Idle,
                action: "stop session"
            })
        );
        assert!(controller.start_session(at(0)).is_err());
        assert!(controller.analyze(None, at(0)).is_err());
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn second_start_while_active_is_rejected() {
        let mut controller = active_controller();
        let id = controller.session_id().unwrap().to_string();
        assert_eq!(
            controller.start_session(at(10)),
            Err(SessionError::AlreadyActive(id.clone()))
        );
        assert_eq!(controller.session_id(), Some(id.as_str()));
    }

    #[test]
    fn acquisition_failure_stays_idle() {
        let mut controller =
            SessionController::new(CoachConfig::default(), Box::new(DeniedDevices));
        let err = controller.start_recording().unwrap_err();
        assert!(matches!(err, SessionError::Acquisition(_)));
        assert_eq!(controller.state(), SessionState::Idle);
        assert!(controller.session_id().is_none());
    }

    #[test]
    fn segments_roll_every_minute() {
        let mut controller = active_controller();
        // 125 seconds at 10Hz, always looking
        for tick in 0..1250 {
            controller.ingest_frame(&frame(tick * 100, true)).unwrap();
        }
        let summary = controller.stop_session(at(125_000)).unwrap();

        assert_eq!(summary.segments.len(), 3);
        assert_eq!(summary.segments[0].duration_secs(), Some(60.0));
        assert_eq!(summary.segments[2].duration_secs(), Some(5.0));
        for segment in &summary.segments {
            let score = segment.score.unwrap();
            assert!((0.0..=100.0).contains(&score));
            assert!(segment.eye_contact_secs <= segment.duration_secs().unwrap());
        }
        assert!((summary.segments[0].score.unwrap() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn late_stop_after_frame_gap_keeps_minute_segments() {
        let mut controller = active_controller();
        // frames stop arriving at 49.9s; stop comes at 130s
        for tick in 0..500 {
            controller.ingest_frame(&frame(tick * 100, true)).unwrap();
        }
        let summary = controller.stop_session(at(130_000)).unwrap();

        let durations: Vec<f64> = summary
            .segments
            .iter()
            .map(|s| s.duration_secs().unwrap())
            .collect();
        assert_eq!(durations, vec![60.0, 60.0, 10.0]);
        assert!((summary.segments[0].eye_contact_secs - 50.0).abs() < 1e-6);
        assert!((summary.segments[0].score.unwrap() - 250.0 / 3.0).abs() < 1e-6);
        assert_eq!(summary.segments[1].score, Some(0.0));
        assert_eq!(summary.segments[2].start_time, at(120_000));
    }

    #[test]
    fn malformed_audio_is_skipped_and_counted() {
        let mut controller = active_controller();
        let good: Vec<f32> = (0..1024)
            .map(|i| 0.5 * (2.0 * PI * 200.0 * i as f32 / 16_000.0).sin())
            .collect();

        for tick in 0..10 {
            let point = controller
                .ingest_audio(&AudioBuffer::from_f32(&good, 16_000, at(tick * 50)))
                .unwrap();
            assert!(point.is_some());
        }
        let bad = AudioBuffer::from_f32(&[0.2; 1000], 16_000, at(600));
        assert!(controller.ingest_audio(&bad).unwrap().is_none());

        let summary = controller.stop_session(at(1_000)).unwrap();
        assert_eq!(summary.voice.tick_count, 10);
        assert_eq!(summary.skipped_voice_ticks, 1);
        assert!(summary.voice.speaking_ticks > 0);
    }

    #[test]
    fn analyze_caches_result_and_flags_no_speech() {
        let mut controller = active_controller();
        for tick in 0..10 {
            controller.ingest_frame(&frame(tick * 100, tick < 7)).unwrap();
        }
        controller.stop_session(at(1_000)).unwrap();

        let first = controller
            .analyze(
                Some(SpeechMetrics {
                    word_count: 0,
                    ..SpeechMetrics::default()
                }),
                at(2_000),
            )
            .unwrap();
        assert!(first.no_speech_detected);
        assert_eq!(first.overall_engagement, 70);

        let second = controller.analyze(None, at(5_000)).unwrap();
        assert_eq!(first, second);
        assert_eq!(controller.state(), SessionState::Analyzed);
    }

    #[test]
    fn analyze_without_ticks_is_incomplete() {
        let mut controller = active_controller();
        controller.stop_session(at(500)).unwrap();
        let result = controller.analyze(None, at(600)).unwrap();
        assert!(result.incomplete);
        assert_eq!(result.summary.segments.len(), 1);
    }

    #[test]
    fn fail_returns_to_idle_and_reset_allows_new_session() {
        let mut controller = active_controller();
        controller.fail("microphone unplugged");
        assert_eq!(controller.state(), SessionState::Idle);
        assert!(!controller.snapshot().devices_held);
        assert!(controller.session_id().is_none());

        controller.start_recording().unwrap();
        let id = controller.start_session(at(0)).unwrap();
        controller.stop_session(at(100)).unwrap();
        controller.reset().unwrap();
        assert_eq!(controller.state(), SessionState::Idle);

        controller.start_recording().unwrap();
        assert_ne!(controller.start_session(at(200)).unwrap(), id);
    }

    #[test]
    fn events_are_emitted_in_order() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut controller =
            SessionController::new(CoachConfig::default(), Box::new(NoopDevices::default()))
                .with_events(tx);

        controller.start_recording().unwrap();
        controller.start_session(at(0)).unwrap();
        controller.ingest_frame(&frame(0, true)).unwrap();
        controller
            .ingest_audio(&AudioBuffer::from_f32(&[0.0; 512], 16_000, at(10)))
            .unwrap();
        controller.stop_session(at(100)).unwrap();

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(match event {
                SessionEvent::StateChanged { state, .. } => state.as_str().to_string(),
                SessionEvent::Frame { .. } => "frame".into(),
                SessionEvent::Voice { .. } => "voice".into(),
                SessionEvent::Stopped { .. } => "summary".into(),
                other => format!("{other:?}"),
            });
        }
        assert_eq!(
            kinds,
            vec!["recording", "active", "frame", "voice", "stopped", "summary"]
        );
    }
}
