//! Configuration errors and the validated sample-rate type.
//!
//! Nothing on the per-sample path returns an error. The only fallible
//! operations are the ones a host calls out of band: constructing a unit and
//! notifying it of a new sample rate.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DspError {
    #[error("invalid sample rate: {0} Hz (must be finite and greater than zero)")]
    InvalidSampleRate(f32),
}

/// A sample rate in Hz that is known to be finite and strictly positive.
///
/// Units store this instead of a bare `f32` so coefficient code can divide by
/// it without re-checking.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct SampleRate(f32);

impl SampleRate {
    pub fn new(hz: f32) -> Result<Self, DspError> {
        if hz.is_finite() && hz > 0.0 {
            Ok(Self(hz))
        } else {
            Err(DspError::InvalidSampleRate(hz))
        }
    }

    #[inline]
    pub fn hz(self) -> f32 {
        self.0
    }

    /// Rate seen by a stage running `factor` times faster than this one.
    #[inline]
    pub fn oversampled(self, factor: usize) -> Self {
        Self(self.0 * factor.max(1) as f32)
    }
}

impl Default for SampleRate {
    fn default() -> Self {
        Self(crate::DEFAULT_SAMPLE_RATE)
    }
}

impl TryFrom<f32> for SampleRate {
    type Error = DspError;

    fn try_from(hz: f32) -> Result<Self, Self::Error> {
        Self::new(hz)
    }
}
