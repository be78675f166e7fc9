//! Spectrum analysis
//!
//! Hann-windowed FFT of a rendered buffer, reduced to the strongest peaks.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Quietest level reported.
const FLOOR_DB: f32 = -160.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub frequency_hz: f32,
    /// Level relative to a full-scale sine.
    pub magnitude_db: f32,
}

pub struct SpectrumAnalyzer {
    /// Hann window coefficients
    window: Vec<f32>,
    /// Sum of the window, for amplitude normalization
    window_gain: f32,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    /// Magnitude per bin up to Nyquist (dBFS)
    magnitudes: Vec<f32>,
    sample_rate: f32,
}

impl SpectrumAnalyzer {
    /// # Arguments
    /// * `len` - FFT size
    /// * `sample_rate` - Audio sample rate in Hz
    pub fn new(len: usize, sample_rate: f32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(len);

        // Hann window - reduces spectral leakage
        let window: Vec<f32> = (0..len)
            .map(|i| {
                if len > 1 {
                    let denom = (len - 1) as f32;
                    0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / denom).cos())
                } else {
                    1.0
                }
            })
            .collect();
        let window_gain = window.iter().sum::<f32>().max(f32::EPSILON);

        Self {
            window,
            window_gain,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); len],
            magnitudes: vec![FLOOR_DB; len / 2],
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Analyze the last `len()` samples of `buffer` (zero padded if shorter).
    pub fn analyze(&mut self, buffer: &[f32]) -> &[f32] {
        let len = self.len();
        let tail = &buffer[buffer.len().saturating_sub(len)..];

        for (i, slot) in self.scratch.iter_mut().enumerate() {
            let sample = tail.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.scratch);

        for (magnitude, bin) in self.magnitudes.iter_mut().zip(&self.scratch) {
            let amplitude = 2.0 * bin.norm() / self.window_gain;
            *magnitude = (20.0 * amplitude.max(1e-12).log10()).max(FLOOR_DB);
        }

        &self.magnitudes
    }

    #[inline]
    pub fn bin_frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate / self.len() as f32
    }

    /// Up to `count` local maxima of the last analysis, loudest first.
    pub fn peaks(&self, count: usize) -> Vec<Peak> {
        let m = &self.magnitudes;
        let mut peaks: Vec<Peak> = (1..m.len().saturating_sub(1))
            .filter(|&i| m[i] > m[i - 1] && m[i] >= m[i + 1] && m[i] > FLOOR_DB)
            .map(|i| Peak {
                frequency_hz: self.bin_frequency(i),
                magnitude_db: m[i],
            })
            .collect();

        peaks.sort_by(|a, b| b.magnitude_db.total_cmp(&a.magnitude_db));
        peaks.truncate(count);
        peaks
    }
}
