use chrono::{DateTime, Duration, Utc};

use super::model::Segment;

/// Owns the open segment and the closed history for one session.
#[derive(Debug, Clone)]
pub struct SegmentTracker {
    length: Duration,
    open: Option<Segment>,
    history: Vec<Segment>,
}

impl SegmentTracker {
    pub fn new(start: DateTime<Utc>, length_secs: u64) -> Self {
        Self {
            length: Duration::seconds(length_secs as i64),
            open: Some(Segment::open(0, start)),
            history: Vec::new(),
        }
    }

    /// Closes every segment whose boundary has passed by `now`.
    ///
    /// Each closes exactly at `start + length` and the next opens there, so a
    /// gap in frames still yields fixed-length segments. Returns the segments
    /// closed by this call, oldest first.
    pub fn roll_if_due(&mut self, now: DateTime<Utc>) -> &[Segment] {
        let first_closed = self.history.len();
        if self.length <= Duration::zero() {
            return &[];
        }

        while let Some(open) = self.open.take() {
            let boundary = open.start_time + self.length;
            if now < boundary {
                self.open = Some(open);
                break;
            }
            let closed = open.close(boundary);
            self.open = Some(Segment::open(closed.index + 1, boundary));
            self.history.push(closed);
        }

        &self.history[first_closed..]
    }

    pub fn credit(&mut self, secs: f64) {
        if let Some(segment) = self.open.as_mut() {
            segment.credit(secs);
        }
    }

    /// Closes the open segment for good. No segment is open afterwards.
    ///
    /// A segment that was opened by a roll at exactly `end_time` is dropped
    /// rather than recorded with zero length.
    pub fn close(&mut self, end_time: DateTime<Utc>) {
        if let Some(segment) = self.open.take() {
            if segment.duration_until(end_time) <= 0.0 && !self.history.is_empty() {
                return;
            }
            self.history.push(segment.close(end_time));
        }
    }

    pub fn open_segment(&self) -> Option<&Segment> {
        self.open.as_ref()
    }

    pub fn history(&self) -> &[Segment] {
        &self.history
    }
}
