//! Lifecycle shared by every DSP unit.
//!
//! A unit is created once with the host sample rate, fed one sample at a time
//! from the audio callback, and reconfigured in place when the host rate
//! changes. The three operations mirror that:
//!
//!   init()        zero every delay element
//!   invalidate()  recompute coefficients from parameters + sample rate
//!   process()     advance exactly one sample
//!
//! Parameter setters only store values and mark the unit dirty; `process()`
//! runs `invalidate()` first when needed, so a host that moves a knob every
//! sample pays for one coefficient update per sample and never reads stale
//! coefficients. Hosts that prefer the explicit order (set, invalidate,
//! process) can call `invalidate()` themselves; it is idempotent.

use crate::error::{DspError, SampleRate};

pub trait Effect {
    /// Clear all stored state. Coefficients are left alone.
    fn init(&mut self);

    /// Recompute derived coefficients. Must not touch audio state.
    fn invalidate(&mut self);

    /// Advance one sample: read the input field(s), write the output field(s).
    fn process(&mut self);

    /// Host sample-rate notification. An invalid rate is rejected and the
    /// previous coefficients stay in place.
    fn set_sample_rate(&mut self, sample_rate: f32) -> Result<(), DspError>;

    fn sample_rate(&self) -> f32;
}

/// Sample rate and dirty flag embedded in each unit.
#[derive(Debug, Clone, Copy)]
pub struct EffectState {
    sample_rate: SampleRate,
    dirty: bool,
}

impl EffectState {
    pub fn new(sample_rate: SampleRate) -> Self {
        Self {
            sample_rate,
            dirty: true,
        }
    }

    #[inline]
    pub fn rate(&self) -> SampleRate {
        self.sample_rate
    }

    /// Validate and store a new host rate. On error nothing changes.
    pub fn set_sample_rate(&mut self, hz: f32) -> Result<SampleRate, DspError> {
        match SampleRate::new(hz) {
            Ok(rate) => {
                if rate != self.sample_rate {
                    log::debug!(
                        "sample rate {} Hz -> {} Hz",
                        self.sample_rate.hz(),
                        rate.hz()
                    );
                }
                self.sample_rate = rate;
                self.dirty = true;
                Ok(rate)
            }
            Err(err) => {
                log::warn!("{}; keeping {} Hz", err, self.sample_rate.hz());
                Err(err)
            }
        }
    }

    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

/// Store `value` into `slot` and report whether it changed.
#[inline]
pub(crate) fn update(slot: &mut f32, value: f32) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}
