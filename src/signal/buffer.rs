use chrono::{DateTime, Utc};

use crate::error::BufferError;

/// One fixed-length window of mono audio, normalized to [-1, 1] and centered on zero.
///
/// Producers hand over whatever their capture API gives them; the constructors
/// below take care of the midpoint shift so estimators only ever see centered
/// samples.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    samples: Vec<f64>,
    sample_rate: u32,
    captured_at: DateTime<Utc>,
}

impl AudioBuffer {
    /// Samples already in [-1, 1].
    pub fn from_f32(samples: &[f32], sample_rate: u32, captured_at: DateTime<Utc>) -> Self {
        Self {
            samples: samples.iter().map(|&s| s as f64).collect(),
            sample_rate,
            captured_at,
        }
    }

    /// Signed 16-bit PCM.
    pub fn from_i16(samples: &[i16], sample_rate: u32, captured_at: DateTime<Utc>) -> Self {
        Self {
            samples: samples
                .iter()
                .map(|&s| s as f64 / i16::MAX as f64)
                .collect(),
            sample_rate,
            captured_at,
        }
    }

    /// Unsigned 8-bit time-domain bytes with the midpoint at 128.
    pub fn from_u8(samples: &[u8], sample_rate: u32, captured_at: DateTime<Utc>) -> Self {
        Self {
            samples: samples.iter().map(|&s| (s as f64 - 128.0) / 128.0).collect(),
            sample_rate,
            captured_at,
        }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Rejects buffers the estimators cannot handle. Called once per tick before analysis.
    pub fn validate(&self) -> Result<(), BufferError> {
        if self.samples.is_empty() {
            return Err(BufferError::Empty);
        }
        if !self.samples.len().is_power_of_two() {
            return Err(BufferError::NotPowerOfTwo(self.samples.len()));
        }
        if self.sample_rate == 0 {
            return Err(BufferError::ZeroSampleRate);
        }
        if let Some(index) = self.samples.iter().position(|s| !s.is_finite()) {
            return Err(BufferError::NonFinite(index));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u8_midpoint_is_silence() {
        let buffer = AudioBuffer::from_u8(&[128; 256], 16_000, Utc::now());
        assert!(buffer.samples().iter().all(|&s| s == 0.0));
        assert!(buffer.validate().is_ok());
    }

    #[test]
    fn i16_is_normalized() {
        let buffer = AudioBuffer::from_i16(&[i16::MAX, 0], 16_000, Utc::now());
        assert_eq!(buffer.samples(), &[1.0, 0.0]);
    }

    #[test]
    fn validation_failures() {
        let now = Utc::now();
        assert_eq!(
            AudioBuffer::from_f32(&[], 16_000, now).validate(),
            Err(BufferError::Empty)
        );
        assert_eq!(
            AudioBuffer::from_f32(&[0.0; 300], 16_000, now).validate(),
            Err(BufferError::NotPowerOfTwo(300))
        );
        assert_eq!(
            AudioBuffer::from_f32(&[0.0; 256], 0, now).validate(),
            Err(BufferError::ZeroSampleRate)
        );

        let mut samples = vec![0.0f32; 256];
        samples[7] = f32::NAN;
        assert_eq!(
            AudioBuffer::from_f32(&samples, 16_000, now).validate(),
            Err(BufferError::NonFinite(7))
        );
    }
}
