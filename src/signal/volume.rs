/// Loudness of a centered, normalized window as RMS x 100.
///
/// The whole pipeline works in this 0-100 unit: the speaking threshold,
/// voice aggregates, and emitted samples all use it. Silence maps to 0.
pub fn rms_percent(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_sq: f64 = samples.iter().map(|s| s * s).sum();
    let rms = (sum_sq / samples.len() as f64).sqrt();

    (rms * 100.0).clamp(0.0, 100.0)
}
