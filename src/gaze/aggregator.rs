use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::{error::FrameError, segments::SegmentTracker};

use super::types::{ContactRun, EyeContactState, FramePoint};

struct OpenRun {
    started_at: DateTime<Utc>,
    secs: f64,
}

/// Running eye-contact statistics for one session.
///
/// Every counter is updated in place per frame; nothing rescans history, so
/// session length does not affect per-tick cost.
pub struct EyeContactAggregator {
    interval_secs: f64,
    total_frames: u64,
    face_frames: u64,
    eye_contact_frames: u64,
    total_eye_contact_secs: f64,
    open_run: Option<OpenRun>,
    runs: Vec<ContactRun>,
    blink_count: u64,
    blink_active: bool,
    last_frame: Option<FramePoint>,
}

impl EyeContactAggregator {
    pub fn new(frame_interval: Duration) -> Self {
        Self {
            interval_secs: frame_interval.as_secs_f64(),
            total_frames: 0,
            face_frames: 0,
            eye_contact_frames: 0,
            total_eye_contact_secs: 0.0,
            open_run: None,
            runs: Vec::new(),
            blink_count: 0,
            blink_active: false,
            last_frame: None,
        }
    }

    /// Applies one frame tick. Contact time is credited to `segments` as well.
    pub fn ingest(
        &mut self,
        frame: &FramePoint,
        segments: &mut SegmentTracker,
    ) -> Result<EyeContactState, FrameError> {
        if self
            .last_frame
            .is_some_and(|last| frame.timestamp < last.timestamp)
        {
            return Err(FrameError::OutOfOrder);
        }

        self.total_frames += 1;
        if frame.face_detected {
            self.face_frames += 1;
        }

        // edge-triggered: a blink spanning several frames counts once
        if frame.blink && !self.blink_active {
            self.blink_count += 1;
        }
        self.blink_active = frame.blink;

        if frame.has_contact() {
            self.eye_contact_frames += 1;
            self.total_eye_contact_secs += self.interval_secs;
            segments.credit(self.interval_secs);

            let run = self.open_run.get_or_insert(OpenRun {
                started_at: frame.timestamp,
                secs: 0.0,
            });
            run.secs += self.interval_secs;
        } else {
            self.close_run(frame.timestamp);
        }

        self.last_frame = Some(*frame);
        Ok(self.state_after(frame))
    }

    /// Closes any open run so it is included in the totals. Used at stop.
    pub fn finish(&mut self, at: DateTime<Utc>) {
        self.close_run(at);
    }

    fn close_run(&mut self, at: DateTime<Utc>) {
        if let Some(run) = self.open_run.take() {
            self.runs.push(ContactRun {
                started_at: run.started_at,
                ended_at: at,
                duration_secs: run.secs,
            });
        }
    }

    /// View after the latest accepted frame; `None` until the first frame arrives.
    pub fn state(&self) -> Option<EyeContactState> {
        self.last_frame.as_ref().map(|last| self.state_after(last))
    }

    fn state_after(&self, frame: &FramePoint) -> EyeContactState {
        EyeContactState {
            timestamp: frame.timestamp,
            face_detected: frame.face_detected,
            landmarks_detected: frame.landmarks_detected,
            eye_contact: self.open_run.is_some(),
            eye_contact_percentage: self.eye_contact_percentage(),
            current_eye_contact_secs: self.current_eye_contact_secs(),
            total_eye_contact_secs: self.total_eye_contact_secs,
            blink_count: self.blink_count,
        }
    }

    pub fn eye_contact_percentage(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        100.0 * self.eye_contact_frames as f64 / self.total_frames as f64
    }

    pub fn current_eye_contact_secs(&self) -> f64 {
        self.open_run.as_ref().map_or(0.0, |run| run.secs)
    }

    pub fn detection_rate(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        self.face_frames as f64 / self.total_frames as f64
    }

    /// Sum of all contact runs, including one still open.
    pub fn continuous_contact_secs(&self) -> f64 {
        self.runs.iter().map(|r| r.duration_secs).sum::<f64>() + self.current_eye_contact_secs()
    }

    pub fn longest_run_secs(&self) -> f64 {
        self.runs
            .iter()
            .map(|r| r.duration_secs)
            .fold(self.current_eye_contact_secs(), f64::max)
    }

    pub fn runs(&self) -> &[ContactRun] {
        &self.runs
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn eye_contact_frames(&self) -> u64 {
        self.eye_contact_frames
    }

    pub fn face_frames(&self) -> u64 {
        self.face_frames
    }

    pub fn blink_count(&self) -> u64 {
        self.blink_count
    }

    pub fn total_eye_contact_secs(&self) -> f64 {
        self.total_eye_contact_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaze::types::{FrameSignal, Gaze};
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap()
    }

    fn frame(tick: i64, eye_contact: bool) -> FramePoint {
        FrameSignal {
            face_detected: true,
            landmarks_detected: true,
            eye_contact,
            gaze: Gaze::default(),
            blink: false,
        }
        .at(at(tick * 100))
    }

    #[test]
    fn sixty_of_hundred_frames_in_one_run() {
        let mut aggregator = EyeContactAggregator::new(Duration::from_millis(100));
        let mut segments = SegmentTracker::new(at(0), 60);

        for tick in 0..100 {
            let state = aggregator.ingest(&frame(tick, tick < 60), &mut segments).unwrap();
            if tick == 59 {
                assert!((state.current_eye_contact_secs - 6.0).abs() < 1e-9);
            }
            if tick == 60 {
                assert_eq!(state.current_eye_contact_secs, 0.0);
                assert!(!state.eye_contact);
            }
        }

        assert!((aggregator.eye_contact_percentage() - 60.0).abs() < 1e-9);
        assert_eq!(aggregator.runs().len(), 1);
        assert!((aggregator.runs()[0].duration_secs - 6.0).abs() < 1e-9);
        assert_eq!(aggregator.runs()[0].started_at, at(0));
        assert_eq!(aggregator.runs()[0].ended_at, at(6_000));
        assert!((segments.open_segment().unwrap().eye_contact_secs - 6.0).abs() < 1e-9);
    }

    #[test]
    fn contact_requires_face_and_landmarks() {
        let mut aggregator = EyeContactAggregator::new(Duration::from_millis(100));
        let mut segments = SegmentTracker::new(at(0), 60);

        let mut no_landmarks = frame(0, true);
        no_landmarks.landmarks_detected = false;
        let state = aggregator.ingest(&no_landmarks, &mut segments).unwrap();
        assert!(!state.eye_contact);

        let mut no_face = frame(1, true);
        no_face.face_detected = false;
        aggregator.ingest(&no_face, &mut segments).unwrap();

        assert_eq!(aggregator.eye_contact_frames(), 0);
        assert_eq!(aggregator.detection_rate(), 0.5);
    }

    #[test]
    fn multi_frame_blink_counts_once() {
        let mut aggregator = EyeContactAggregator::new(Duration::from_millis(100));
        let mut segments = SegmentTracker::new(at(0), 60);
        let pattern = [false, true, true, true, false, true, false, false, true];

        for (tick, blink) in pattern.iter().enumerate() {
            let mut point = frame(tick as i64, true);
            point.blink = *blink;
            aggregator.ingest(&point, &mut segments).unwrap();
        }
        assert_eq!(aggregator.blink_count(), 3);
    }

    #[test]
    fn out_of_order_frame_is_rejected_without_counting() {
        let mut aggregator = EyeContactAggregator::new(Duration::from_millis(100));
        let mut segments = SegmentTracker::new(at(0), 60);
        aggregator.ingest(&frame(5, true), &mut segments).unwrap();
        assert_eq!(
            aggregator.ingest(&frame(4, true), &mut segments),
            Err(FrameError::OutOfOrder)
        );
        assert_eq!(aggregator.total_frames(), 1);
    }

    #[test]
    fn finish_folds_open_run_into_totals() {
        let mut aggregator = EyeContactAggregator::new(Duration::from_millis(100));
        let mut segments = SegmentTracker::new(at(0), 60);
        for tick in 0..30 {
            aggregator.ingest(&frame(tick, tick % 10 >= 5), &mut segments).unwrap();
        }
        aggregator.finish(at(3_000));

        // runs of 0.5s starting at ticks 5, 15, 25; the last one closed by finish
        assert_eq!(aggregator.runs().len(), 3);
        assert!((aggregator.continuous_contact_secs() - 1.5).abs() < 1e-9);
        assert!((aggregator.longest_run_secs() - 0.5).abs() < 1e-9);
        assert_eq!(aggregator.current_eye_contact_secs(), 0.0);
    }

    #[test]
    fn state_is_stamped_by_the_last_frame_only() {
        let mut aggregator = EyeContactAggregator::new(Duration::from_millis(100));
        let mut segments = SegmentTracker::new(at(0), 60);
        assert!(aggregator.state().is_none());

        aggregator.ingest(&frame(3, true), &mut segments).unwrap();
        let state = aggregator.state().unwrap();
        assert_eq!(state.timestamp, at(300));
        assert!(state.eye_contact);
        assert_eq!(state.eye_contact_percentage, 100.0);
    }
}
