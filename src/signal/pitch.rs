/// Returned when no lag correlates positively: silence, noise, or nothing periodic.
pub const NO_PITCH: f64 = 0.0;

/// Fundamental frequency by time-domain autocorrelation.
///
/// Scans lags `min_lag..=len/2` and picks the one with the largest
/// `sum(x[i] * x[i + lag])`. Samples must already be centered on zero.
/// Cost is O(len * len/2), which stays well under a millisecond for the
/// 256-2048 sample windows the voice tracker uses.
pub fn autocorrelation_pitch(samples: &[f64], sample_rate: u32, min_lag: usize) -> f64 {
    let len = samples.len();
    let max_lag = len / 2;
    if sample_rate == 0 || len == 0 || min_lag.max(1) > max_lag {
        return NO_PITCH;
    }

    let mut best_lag = 0usize;
    let mut best_corr = 0.0f64;

    for lag in min_lag.max(1)..=max_lag {
        let corr: f64 = samples[..len - lag]
            .iter()
            .zip(&samples[lag..])
            .map(|(a, b)| a * b)
            .sum();

        if corr > best_corr {
            best_corr = corr;
            best_lag = lag;
        }
    }

    if best_lag > 0 {
        sample_rate as f64 / best_lag as f64
    } else {
        NO_PITCH
    }
}
