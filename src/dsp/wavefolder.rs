//! Wavefolders.
//!
//! Two folding shapers behind one interface so a host can swap them at run
//! time. Both follow the same protocol as the filters: set gain, bias and
//! input, call `process()`, read `out()`. Gain and bias are applied to the
//! input inside `process()`:
//!
//! ```text
//!   in ──► × gain ──► + bias ──► [ 4× oversampled fold ] ──► tanh ──► out
//! ```
//!
//! Lockhart: four cascaded stages of the Lockhart diode/transistor folder.
//! The static curve is solved with the Lambert W function and each stage is
//! antialiased with its first antiderivative (ADAA), in f64 since the curve
//! divides differences of nearly equal numbers.
//!
//! Serge: six cascaded folding cells `2·soft_clip(x) − x`.

use crate::{
    dsp::{
        distortion::soft_clip,
        effect::{Effect, EffectState},
        oversampler::{Oversampled, Oversampler},
        trig::fast_tanh,
    },
    error::{DspError, SampleRate},
};

pub const OVERSAMPLE: usize = 4;

/// Wavefolder call contract shared by [`LockhartWavefolder`] and
/// [`SergeWavefolder`].
pub trait Wavefolder: Effect {
    fn set_gain(&mut self, gain: f32);

    fn set_bias(&mut self, bias: f32);

    fn set_in(&mut self, input: f32);

    /// Result of the last `process()`.
    fn out(&self) -> f32;
}

// Lockhart circuit values
const LOAD_RESISTANCE: f64 = 7.5e3;
const INPUT_RESISTANCE: f64 = 15e3;
const THERMAL_VOLTAGE: f64 = 0.026;
const SATURATION_CURRENT: f64 = 1e-16;

const ALPHA: f64 = 2.0 * LOAD_RESISTANCE / INPUT_RESISTANCE;
const BETA: f64 = (INPUT_RESISTANCE + 2.0 * LOAD_RESISTANCE) / (THERMAL_VOLTAGE * INPUT_RESISTANCE);

/// Below this input step the ADAA quotient is replaced by the curve itself.
const ADAA_EPSILON: f64 = 1e-5;

const OMEGA_ITERATIONS: usize = 8;

/// Wright omega function, `ω(l) = W(e^l)`, for any real `l`.
///
/// Working on the log of the Lambert W argument keeps `e^l` from overflowing
/// for the large exponents the Lockhart curve produces at high gain.
pub fn wright_omega(l: f64) -> f64 {
    if l < 1.0 {
        // Halley on w·e^w = u
        let u = l.exp();
        let mut w = u.ln_1p();
        for _ in 0..OMEGA_ITERATIONS {
            let ew = w.exp();
            let f = w * ew - u;
            let step = f / (ew * (w + 1.0) - (w + 2.0) * f / (2.0 * w + 2.0));
            w -= step;
            if step.abs() < 1e-12 * (1.0 + w.abs()) {
                break;
            }
        }
        w
    } else {
        // Newton on w + ln(w) = l
        let mut w = l - l.ln();
        for _ in 0..OMEGA_ITERATIONS {
            let step = (w + w.ln() - l) / (1.0 + 1.0 / w);
            w -= step;
            if step.abs() < 1e-12 * (1.0 + w.abs()) {
                break;
            }
        }
        w
    }
}

/// `ln(Δ)` with `Δ = RL·Is / Vt`.
#[inline]
fn log_delta() -> f64 {
    (LOAD_RESISTANCE * SATURATION_CURRENT / THERMAL_VOLTAGE).ln()
}

#[inline]
fn omega_at(x: f64) -> (f64, f64) {
    let lambda = if x >= 0.0 { 1.0 } else { -1.0 };
    (lambda, wright_omega(log_delta() + lambda * BETA * x))
}

/// Static Lockhart curve `λ·Vt·W(Δ·e^{λβx}) − αx`.
pub fn lockhart(x: f64) -> f64 {
    let (lambda, w) = omega_at(x);
    lambda * THERMAL_VOLTAGE * w - ALPHA * x
}

/// First antiderivative of [`lockhart`].
pub fn lockhart_antiderivative(x: f64) -> f64 {
    let (_, w) = omega_at(x);
    THERMAL_VOLTAGE / (2.0 * BETA) * w * (w + 2.0) - 0.5 * ALPHA * x * x
}

/// One ADAA Lockhart stage.
#[derive(Debug, Clone, Copy)]
struct LockhartStage {
    x1: f64,
    f1: f64,
}

impl LockhartStage {
    fn new() -> Self {
        Self {
            x1: 0.0,
            f1: lockhart_antiderivative(0.0),
        }
    }

    #[inline]
    fn process(&mut self, x: f64) -> f64 {
        let f = lockhart_antiderivative(x);
        let dx = x - self.x1;

        let y = if dx.abs() < ADAA_EPSILON {
            lockhart(0.5 * (x + self.x1))
        } else {
            (f - self.f1) / dx
        };

        self.x1 = x;
        self.f1 = f;
        y
    }
}

#[derive(Debug, Clone)]
struct LockhartCore {
    stages: [LockhartStage; 4],
}

impl Oversampled<1> for LockhartCore {
    fn set_sample_rate(&mut self, _sample_rate: SampleRate) {}

    #[inline]
    fn tick(&mut self, input: f32) -> [f32; 1] {
        let y = self
            .stages
            .iter_mut()
            .fold(input as f64, |x, stage| stage.process(x));
        [y.tanh() as f32]
    }

    fn reset(&mut self) {
        self.stages = [LockhartStage::new(); 4];
    }
}

const SERGE_CELLS: usize = 6;

#[derive(Debug, Clone, Copy)]
struct SergeCore;

impl Oversampled<1> for SergeCore {
    fn set_sample_rate(&mut self, _sample_rate: SampleRate) {}

    #[inline]
    fn tick(&mut self, input: f32) -> [f32; 1] {
        let mut x = input;
        for _ in 0..SERGE_CELLS {
            x = 2.0 * soft_clip(x, 1.0) - x;
        }
        [fast_tanh(x)]
    }

    fn reset(&mut self) {}
}

macro_rules! wavefolder {
    ($(#[$meta:meta])* $name:ident, $core:ty, $make:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            state: EffectState,
            gain: f32,
            bias: f32,
            input: f32,
            out: f32,
            os: Oversampler<$core, OVERSAMPLE, 1>,
        }

        impl $name {
            pub fn new(sample_rate: f32) -> Result<Self, DspError> {
                let rate = SampleRate::new(sample_rate)?;
                Ok(Self {
                    state: EffectState::new(rate),
                    gain: 1.0,
                    bias: 0.0,
                    input: 0.0,
                    out: 0.0,
                    os: Oversampler::new($make, rate),
                })
            }

            pub fn gain(&self) -> f32 {
                self.gain
            }

            pub fn bias(&self) -> f32 {
                self.bias
            }

            pub fn reset(&mut self) {
                self.os.reset();
                self.input = 0.0;
                self.out = 0.0;
            }
        }

        impl Effect for $name {
            fn init(&mut self) {
                self.reset();
            }

            fn invalidate(&mut self) {
                self.state.clear_dirty();
            }

            #[inline]
            fn process(&mut self) {
                if self.state.is_dirty() {
                    self.invalidate();
                }
                let [y] = self.os.process(self.input * self.gain + self.bias);
                self.out = y;
            }

            fn set_sample_rate(&mut self, sample_rate: f32) -> Result<(), DspError> {
                let rate = self.state.set_sample_rate(sample_rate)?;
                self.os.set_sample_rate(rate);
                self.invalidate();
                Ok(())
            }

            fn sample_rate(&self) -> f32 {
                self.state.rate().hz()
            }
        }

        impl Wavefolder for $name {
            #[inline]
            fn set_gain(&mut self, gain: f32) {
                self.gain = gain;
            }

            #[inline]
            fn set_bias(&mut self, bias: f32) {
                self.bias = bias;
            }

            #[inline]
            fn set_in(&mut self, input: f32) {
                self.input = input;
            }

            #[inline]
            fn out(&self) -> f32 {
                self.out
            }
        }
    };
}

wavefolder!(
    /// Four-stage Lockhart wavefolder with antiderivative antialiasing.
    LockhartWavefolder,
    LockhartCore,
    LockhartCore {
        stages: [LockhartStage::new(); 4],
    }
);

wavefolder!(
    /// Six-cell Serge-style wavefolder.
    SergeWavefolder,
    SergeCore,
    SergeCore
);
