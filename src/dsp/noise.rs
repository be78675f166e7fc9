//! Low-level noise floor for feedback loops.
//!
//! A filter that sits at exactly zero input decays its integrators toward
//! zero forever: the states drift into the subnormal range (slow on most
//! CPUs) and a loop tuned for self-oscillation never starts because there is
//! nothing to amplify. Summing a tiny uniform noise into the loop solves both.
//!
//! The generator is a 32-bit LCG. The sequence only has to be uncorrelated
//! from sample to sample; it is reproducible so that `reset()` on a filter
//! gives the same output as a freshly built one.

/// Gain of the noise summed into the filter loops (-160 dBFS).
pub const NOISE_GAIN: f32 = 1e-8;

const DEFAULT_SEED: u32 = 0x2545_f491;

#[derive(Debug, Clone)]
pub struct Noise {
    state: u32,
    seed: u32,
    gain: f32,
}

impl Noise {
    pub fn new(gain: f32) -> Self {
        Self::with_seed(gain, DEFAULT_SEED)
    }

    pub fn with_seed(gain: f32, seed: u32) -> Self {
        Self {
            state: seed,
            seed,
            gain: gain.abs(),
        }
    }

    /// Uniform value in `[-gain, gain]`.
    #[inline]
    pub fn next(&mut self) -> f32 {
        // Numerical Recipes constants
        self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let unit = (self.state >> 8) as f32 / (1u32 << 24) as f32; // [0, 1)
        (2.0 * unit - 1.0) * self.gain
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.abs();
    }

    /// Restart the sequence from the construction seed.
    pub fn reset(&mut self) {
        self.state = self.seed;
    }
}

impl Default for Noise {
    fn default() -> Self {
        Self::new(NOISE_GAIN)
    }
}
