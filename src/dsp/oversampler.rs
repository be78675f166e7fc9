//! Oversampling wrapper for nonlinear stages.
//!
//! Saturators, multiplicative loops and wavefolders generate harmonics far
//! above the input bandwidth. At the host rate anything past Nyquist folds
//! back into the audible band as inharmonic aliasing. Running the stage at
//! `N ×` the host rate and lowpassing before decimation pushes those products
//! out of the way:
//!
//! ```text
//!   x[n] ──► linear interp ──► stage.tick() ×N ──► Butterworth LP ──► pick last ──► y[n]
//!            (N sub-samples)    (at N·fs)          (0.45·fs, per channel)
//! ```
//!
//! Linear interpolation adds no energy beyond what the host signal already
//! carries between two samples. The decimator is a 4th order Butterworth
//! (two biquads) designed with the bilinear transform at the oversampled rate.

use crate::error::SampleRate;

use super::trig::MAX_CUTOFF_RATIO;

/// A nonlinear stage that can run inside an [`Oversampler`].
///
/// `CH` is the number of outputs produced per tick (e.g. lowpass + highpass).
pub trait Oversampled<const CH: usize> {
    /// Called with the *internal* rate (`N × host`).
    fn set_sample_rate(&mut self, sample_rate: SampleRate);

    fn tick(&mut self, input: f32) -> [f32; CH];

    fn reset(&mut self);
}

const SECTIONS: usize = 2;

/// Butterworth lowpass as cascaded biquads, `[b0, b1, b2, a1, a2]`.
#[derive(Debug, Clone, Copy)]
struct Decimator {
    coeffs: [[f32; 5]; SECTIONS],
    state: [[f32; 4]; SECTIONS],
}

impl Decimator {
    fn new(cutoff_ratio: f32) -> Self {
        Self {
            coeffs: Self::design(cutoff_ratio),
            state: [[0.0; 4]; SECTIONS],
        }
    }

    /// `cutoff_ratio` is fc / fs of the oversampled stream.
    fn design(cutoff_ratio: f32) -> [[f32; 5]; SECTIONS] {
        let order = 2 * SECTIONS;
        let wc = (std::f64::consts::PI * cutoff_ratio as f64).tan();
        let wc2 = wc * wc;

        let mut coeffs = [[0.0; 5]; SECTIONS];
        for (k, section) in coeffs.iter_mut().enumerate() {
            let theta = (2 * k + 1) as f64 * std::f64::consts::PI / (2.0 * order as f64);
            let bw = 2.0 * theta.cos();

            let a0 = 1.0 + bw * wc + wc2;
            *section = [
                (wc2 / a0) as f32,
                (2.0 * wc2 / a0) as f32,
                (wc2 / a0) as f32,
                (2.0 * (wc2 - 1.0) / a0) as f32,
                ((1.0 - bw * wc + wc2) / a0) as f32,
            ];
        }
        coeffs
    }

    #[inline]
    fn tick(&mut self, input: f32) -> f32 {
        let mut x = input;
        for (coeffs, state) in self.coeffs.iter().zip(self.state.iter_mut()) {
            let [b0, b1, b2, a1, a2] = *coeffs;
            let [x1, x2, y1, y2] = *state;

            let y = b0 * x + b1 * x1 + b2 * x2 - a1 * y1 - a2 * y2;

            *state = [x, x1, y, y1];
            x = y;
        }
        x
    }

    fn reset(&mut self) {
        self.state = [[0.0; 4]; SECTIONS];
    }
}

/// Runs stage `S` at `N ×` the host rate and decimates its `CH` outputs.
#[derive(Debug, Clone)]
pub struct Oversampler<S, const N: usize, const CH: usize> {
    stage: S,
    host_rate: SampleRate,
    previous: f32,
    decimators: [Decimator; CH],
}

impl<S: Oversampled<CH>, const N: usize, const CH: usize> Oversampler<S, N, CH> {
    pub const FACTOR: usize = N;

    pub fn new(mut stage: S, host_rate: SampleRate) -> Self {
        assert!(N >= 1, "oversampling factor must be at least 1");

        stage.set_sample_rate(host_rate.oversampled(N));

        Self {
            stage,
            host_rate,
            previous: 0.0,
            decimators: [Decimator::new(Self::cutoff_ratio()); CH],
        }
    }

    /// Decimator cutoff relative to the oversampled rate.
    #[inline]
    fn cutoff_ratio() -> f32 {
        MAX_CUTOFF_RATIO / N as f32
    }

    /// Host rate change: the stage is retuned to `N × host`. The decimator
    /// cutoff is a fixed fraction of the internal rate, so it needs no update.
    pub fn set_sample_rate(&mut self, host_rate: SampleRate) {
        self.host_rate = host_rate;
        self.stage.set_sample_rate(host_rate.oversampled(N));
    }

    pub fn host_rate(&self) -> SampleRate {
        self.host_rate
    }

    /// Rate the wrapped stage is running at.
    pub fn internal_rate(&self) -> SampleRate {
        self.host_rate.oversampled(N)
    }

    /// One host sample in, one decimated sample per channel out.
    #[inline]
    pub fn process(&mut self, input: f32) -> [f32; CH] {
        if N == 1 {
            return self.stage.tick(input);
        }

        let step = (input - self.previous) / N as f32;
        let mut out = [0.0; CH];

        for i in 1..=N {
            let sub = self.previous + step * i as f32;
            let y = self.stage.tick(sub);
            for ((o, d), v) in out.iter_mut().zip(self.decimators.iter_mut()).zip(y) {
                *o = d.tick(v);
            }
        }

        self.previous = input;
        out
    }

    pub fn reset(&mut self) {
        self.previous = 0.0;
        for decimator in &mut self.decimators {
            decimator.reset();
        }
        self.stage.reset();
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut S {
        &mut self.stage
    }
}
