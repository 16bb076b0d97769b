use chrono::{DateTime, Duration, Utc};

use crate::{
    config::VoiceConfig,
    error::BufferError,
    signal::{autocorrelation_pitch, rms_percent, AudioBuffer, SignalSmoother, NO_PITCH},
};

use super::types::{RunningStats, VoiceAggregates, VoicePoint, VoiceSample};

/// Every Nth point goes into the charting timeline.
const TIMELINE_STRIDE: usize = 10;

pub type VoiceListener = Box<dyn FnMut(VoiceSample) + Send>;

/// Turns audio windows into smoothed volume/pitch and a debounced speaking flag.
pub struct VoiceTracker {
    config: VoiceConfig,
    volume: SignalSmoother,
    pitch: SignalSmoother,
    history: Vec<VoicePoint>,
    volume_stats: RunningStats,
    pitch_stats: RunningStats,
    speaking_ticks: u64,
    first_at: Option<DateTime<Utc>>,
    last_at: Option<DateTime<Utc>>,
    listener: Option<VoiceListener>,
    stopped: bool,
}

impl VoiceTracker {
    pub fn new(config: VoiceConfig) -> Self {
        let gate_hold = Duration::milliseconds(config.speaking_hold_ms as i64);
        let peak_hold = Duration::milliseconds(config.peak_hold_ms as i64);

        let volume = SignalSmoother::new(
            config.volume_alpha,
            config.speaking_threshold,
            gate_hold,
            peak_hold,
            config.peak_decay,
        );
        // pitch gate is unused; any detected pitch counts as active
        let pitch = SignalSmoother::new(
            config.pitch_alpha,
            NO_PITCH,
            gate_hold,
            peak_hold,
            config.peak_decay,
        );

        Self {
            config,
            volume,
            pitch,
            history: Vec::new(),
            volume_stats: RunningStats::default(),
            pitch_stats: RunningStats::default(),
            speaking_ticks: 0,
            first_at: None,
            last_at: None,
            listener: None,
            stopped: false,
        }
    }

    /// Registers the consumer of per-tick samples, replacing any previous one.
    pub fn set_listener(&mut self, listener: VoiceListener) {
        self.listener = Some(listener);
    }

    /// Processes one sampling tick. Returns `Ok(None)` once the tracker is stopped.
    pub fn sample(&mut self, buffer: &AudioBuffer) -> Result<Option<VoicePoint>, BufferError> {
        if self.stopped {
            return Ok(None);
        }
        buffer.validate()?;

        let timestamp = buffer.captured_at();
        if self.last_at.is_some_and(|last| timestamp < last) {
            return Err(BufferError::OutOfOrder);
        }

        let raw_volume = rms_percent(buffer.samples());
        let raw_pitch_hz =
            autocorrelation_pitch(buffer.samples(), buffer.sample_rate(), self.config.min_lag);

        let volume = self.volume.observe(raw_volume, timestamp);
        let pitch = self.pitch.observe(raw_pitch_hz, timestamp);

        let point = VoicePoint {
            timestamp,
            raw_volume,
            raw_pitch_hz,
            smoothed_volume: volume.smoothed,
            smoothed_pitch_hz: pitch.smoothed,
            peak_volume: volume.peak,
            speaking: volume.active,
        };

        self.volume_stats.push(point.smoothed_volume);
        // raw, not smoothed: the pitch EMA is still climbing out of silence
        // on the first voiced ticks and would drag the stats down
        if raw_pitch_hz > NO_PITCH {
            self.pitch_stats.push(raw_pitch_hz);
        }
        if point.speaking {
            self.speaking_ticks += 1;
        }
        self.first_at.get_or_insert(timestamp);
        self.last_at = Some(timestamp);
        self.history.push(point);

        if let Some(listener) = self.listener.as_mut() {
            listener(VoiceSample::from(&point));
        }

        Ok(Some(point))
    }

    pub fn is_speaking(&self) -> bool {
        self.volume.is_active()
    }

    pub fn latest(&self) -> Option<&VoicePoint> {
        self.history.last()
    }

    pub fn history(&self) -> &[VoicePoint] {
        &self.history
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn aggregates(&self) -> VoiceAggregates {
        let duration_secs = match (self.first_at, self.last_at) {
            (Some(first), Some(last)) => (last - first).num_milliseconds() as f64 / 1000.0,
            _ => 0.0,
        };

        VoiceAggregates {
            tick_count: self.volume_stats.count(),
            speaking_ticks: self.speaking_ticks,
            voiced_ticks: self.pitch_stats.count(),
            mean_volume: self.volume_stats.mean(),
            volume_variance: self.volume_stats.variance(),
            min_volume: self.volume_stats.min(),
            max_volume: self.volume_stats.max(),
            mean_pitch_hz: self.pitch_stats.mean(),
            pitch_variance: self.pitch_stats.variance(),
            pitch_range_hz: self.pitch_stats.range(),
            duration_secs,
            timeline: self
                .history
                .iter()
                .step_by(TIMELINE_STRIDE)
                .map(VoiceSample::from)
                .collect(),
        }
    }

    /// Stops sampling and drops buffered points. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.listener = None;
        self.history.clear();
        self.history.shrink_to_fit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::f32::consts::PI;
    use std::sync::{Arc, Mutex};

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap()
    }

    fn tone(freq: f32, amplitude: f32, captured_at: DateTime<Utc>) -> AudioBuffer {
        let samples: Vec<f32> = (0..1024)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / 16_000.0).sin())
            .collect();
        AudioBuffer::from_f32(&samples, 16_000, captured_at)
    }

    fn silence(captured_at: DateTime<Utc>) -> AudioBuffer {
        AudioBuffer::from_f32(&[0.0; 1024], 16_000, captured_at)
    }

    #[test]
    fn silent_buffer_yields_zero_volume_and_pitch() {
        let mut tracker = VoiceTracker::new(VoiceConfig::default());
        let point = tracker.sample(&silence(at(0))).unwrap().unwrap();
        assert_eq!(point.raw_volume, 0.0);
        assert_eq!(point.raw_pitch_hz, NO_PITCH);
        assert!(!point.speaking);
        assert!(point.smoothed_pitch_hz.is_finite());
    }

    #[test]
    fn loud_tone_turns_speaking_on_and_smooths_pitch() {
        let mut tracker = VoiceTracker::new(VoiceConfig::default());
        let mut last = None;
        for tick in 0..40 {
            last = tracker.sample(&tone(200.0, 0.5, at(tick * 50))).unwrap();
        }
        let point = last.unwrap();
        assert!(point.speaking);
        assert!((point.raw_pitch_hz - 200.0).abs() < 10.0);
        assert!((point.smoothed_pitch_hz - 200.0).abs() < 10.0);
        assert!(point.smoothed_volume > 30.0);
    }

    #[test]
    fn short_pause_keeps_speaking_flag() {
        let mut tracker = VoiceTracker::new(VoiceConfig {
            volume_alpha: 1.0,
            ..VoiceConfig::default()
        });
        tracker.sample(&tone(200.0, 0.5, at(0))).unwrap();
        assert!(tracker.is_speaking());

        // 400ms of silence is shorter than the 500ms hold
        for tick in 1..=8 {
            tracker.sample(&silence(at(tick * 50))).unwrap();
        }
        assert!(tracker.is_speaking());

        for tick in 9..=12 {
            tracker.sample(&silence(at(tick * 50))).unwrap();
        }
        assert!(!tracker.is_speaking());
    }

    #[test]
    fn malformed_and_out_of_order_buffers_are_rejected() {
        let mut tracker = VoiceTracker::new(VoiceConfig::default());
        let odd = AudioBuffer::from_f32(&[0.1; 300], 16_000, at(0));
        assert_eq!(tracker.sample(&odd).unwrap_err(), BufferError::NotPowerOfTwo(300));

        tracker.sample(&silence(at(100))).unwrap();
        assert_eq!(
            tracker.sample(&silence(at(50))).unwrap_err(),
            BufferError::OutOfOrder
        );
        assert_eq!(tracker.history().len(), 1);
    }

    #[test]
    fn listener_receives_each_tick() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);

        let mut tracker = VoiceTracker::new(VoiceConfig::default());
        tracker.set_listener(Box::new(move |sample| sink.lock().unwrap().push(sample)));

        for tick in 0..3 {
            tracker.sample(&tone(150.0, 0.3, at(tick * 50))).unwrap();
        }
        let received = received.lock().unwrap();
        assert_eq!(received.len(), 3);
        assert_eq!(received[2].timestamp, at(100));
    }

    #[test]
    fn aggregates_cover_all_ticks_and_stop_is_final() {
        let mut tracker = VoiceTracker::new(VoiceConfig::default());
        for tick in 0..25 {
            let buffer = if tick < 20 {
                tone(180.0, 0.4, at(tick * 50))
            } else {
                silence(at(tick * 50))
            };
            tracker.sample(&buffer).unwrap();
        }

        let aggregates = tracker.aggregates();
        assert_eq!(aggregates.tick_count, 25);
        assert_eq!(aggregates.voiced_ticks, 20);
        assert!(aggregates.speaking_ticks > 0);
        assert!((aggregates.duration_secs - 1.2).abs() < 1e-9);
        assert_eq!(aggregates.timeline.len(), 3);
        assert!(aggregates.max_volume >= aggregates.mean_volume);
        assert!((aggregates.mean_pitch_hz - 180.0).abs() < 2.0);
        assert!(aggregates.pitch_range_hz < 1.0);

        tracker.stop();
        tracker.stop();
        assert!(tracker.history().is_empty());
        assert!(tracker.sample(&silence(at(5_000))).unwrap().is_none());
    }

    #[test]
    fn pitch_stats_ignore_smoother_ramp_after_pauses() {
        let mut tracker = VoiceTracker::new(VoiceConfig::default());
        for tick in 0..60 {
            let buffer = if (20..40).contains(&tick) {
                silence(at(tick * 50))
            } else {
                tone(200.0, 0.5, at(tick * 50))
            };
            tracker.sample(&buffer).unwrap();
        }

        let aggregates = tracker.aggregates();
        assert_eq!(aggregates.voiced_ticks, 40);
        assert!((aggregates.mean_pitch_hz - 200.0).abs() < 1.0);
        assert!(aggregates.pitch_range_hz < 1.0);
        assert!(aggregates.pitch_variance < 1.0);
    }
}
