//! Realtime-safe filter and waveshaper engines: a diode-ladder lowpass, an
//! MS-20 style zero-delay feedback two-pole, and two wavefolders.
//!
//! [`dsp`] holds the per-sample units. [`graph`] wraps them into block
//! nodes with knob/CV style modulation, and [`control`] (feature `rtrb`)
//! moves parameter changes onto the audio thread without locking.

pub mod config;
#[cfg(feature = "rtrb")]
pub mod control;
pub mod dsp;
pub mod error;
pub mod graph; // Block nodes wrapping the dsp units

pub use error::{DspError, SampleRate};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub const DEFAULT_SAMPLE_RATE: f32 = 48_000.0;
