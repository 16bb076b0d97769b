//! Exponential smoothing with a peak meter and a hysteresis gate.
//!
//! All three pieces are driven by the caller's timestamps rather than a wall
//! clock, so replaying a recorded tick stream gives the same result every time.

use chrono::{DateTime, Duration, Utc};

/// `s_t = alpha * x_t + (1 - alpha) * s_{t-1}`, starting from zero.
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f64,
    value: f64,
}

impl Ema {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(f64::MIN_POSITIVE, 1.0),
            value: 0.0,
        }
    }

    pub fn update(&mut self, raw: f64) -> f64 {
        self.value = self.alpha * raw + (1.0 - self.alpha) * self.value;
        self.value
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
    }
}

/// Holds the highest smoothed value for `hold`, then decays toward the current one.
#[derive(Debug, Clone)]
pub struct PeakHold {
    hold: Duration,
    decay: f64,
    peak: f64,
    last_peak_at: Option<DateTime<Utc>>,
}

impl PeakHold {
    pub fn new(hold: Duration, decay: f64) -> Self {
        Self {
            hold,
            decay,
            peak: 0.0,
            last_peak_at: None,
        }
    }

    pub fn update(&mut self, smoothed: f64, now: DateTime<Utc>) -> f64 {
        if smoothed >= self.peak || self.last_peak_at.is_none() {
            self.peak = smoothed;
            self.last_peak_at = Some(now);
        } else if let Some(last) = self.last_peak_at {
            if now - last > self.hold {
                // never decays below the live value
                self.peak = (self.peak * self.decay).max(smoothed);
            }
        }
        self.peak
    }

    pub fn peak(&self) -> f64 {
        self.peak
    }

    pub fn reset(&mut self) {
        self.peak = 0.0;
        self.last_peak_at = None;
    }
}

/// Turns on immediately above `threshold`, turns off only after `hold` with no
/// sample above it.
#[derive(Debug, Clone)]
pub struct HysteresisGate {
    threshold: f64,
    hold: Duration,
    active: bool,
    last_above_at: Option<DateTime<Utc>>,
}

impl HysteresisGate {
    pub fn new(threshold: f64, hold: Duration) -> Self {
        Self {
            threshold,
            hold,
            active: false,
            last_above_at: None,
        }
    }

    pub fn update(&mut self, smoothed: f64, now: DateTime<Utc>) -> bool {
        if smoothed > self.threshold {
            self.active = true;
            self.last_above_at = Some(now);
        } else if self.active {
            let expired = self
                .last_above_at
                .map(|last| now - last > self.hold)
                .unwrap_or(true);
            if expired {
                self.active = false;
            }
        }
        self.active
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn reset(&mut self) {
        self.active = false;
        self.last_above_at = None;
    }
}

/// Result of feeding one raw value through a [`SignalSmoother`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedReading {
    pub smoothed: f64,
    pub peak: f64,
    pub active: bool,
}

/// EMA + peak hold + hysteresis gate, shared by the volume and pitch channels.
#[derive(Debug, Clone)]
pub struct SignalSmoother {
    ema: Ema,
    peak: PeakHold,
    gate: HysteresisGate,
}

impl SignalSmoother {
    pub fn new(
        alpha: f64,
        threshold: f64,
        gate_hold: Duration,
        peak_hold: Duration,
        peak_decay: f64,
    ) -> Self {
        Self {
            ema: Ema::new(alpha),
            peak: PeakHold::new(peak_hold, peak_decay),
            gate: HysteresisGate::new(threshold, gate_hold),
        }
    }

    /// Plain EMA step, no peak or gate bookkeeping.
    pub fn update(&mut self, raw: f64) -> f64 {
        self.ema.update(raw)
    }

    pub fn observe(&mut self, raw: f64, now: DateTime<Utc>) -> SmoothedReading {
        let smoothed = self.ema.update(raw);
        SmoothedReading {
            smoothed,
            peak: self.peak.update(smoothed, now),
            active: self.gate.update(smoothed, now),
        }
    }

    pub fn smoothed(&self) -> f64 {
        self.ema.value()
    }

    pub fn peak(&self) -> f64 {
        self.peak.peak()
    }

    pub fn is_active(&self) -> bool {
        self.gate.is_active()
    }

    pub fn reset(&mut self) {
        self.ema.reset();
        self.peak.reset();
        self.gate.reset();
    }
}
