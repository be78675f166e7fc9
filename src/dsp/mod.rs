//! Low-level DSP units.
//!
//! Everything here runs one sample at a time, allocation-free, from the audio
//! thread. Filters and wavefolders share the [`effect::Effect`] lifecycle;
//! the remaining modules are the building blocks they are made of.

/// Memoryless clippers and shapers.
pub mod distortion;
/// init / invalidate / process lifecycle and the dirty-flag state.
pub mod effect;
/// Four-stage diode-ladder lowpass with highpass tap.
pub mod ladder;
/// Tiny noise floor summed into feedback loops.
pub mod noise;
/// Run a nonlinear stage at a multiple of the host rate.
pub mod oversampler;
/// Polynomial / Padé sin, cos, tan and tanh plus cutoff warping.
pub mod trig;
/// Lockhart and Serge wavefolders.
pub mod wavefolder;
/// Zero-delay feedback integrators and the MS-20 style filter.
pub mod zdf;

pub use effect::Effect;
pub use ladder::DiodeLadderFilter;
pub use wavefolder::{LockhartWavefolder, SergeWavefolder, Wavefolder};
pub use zdf::Ms20Filter;
