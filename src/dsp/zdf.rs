use crate::{
    dsp::{
        effect::{update, Effect, EffectState},
        noise::{Noise, NOISE_GAIN},
        oversampler::{Oversampled, Oversampler},
        trig::{clamp_cutoff, cutoff_from_fraction, fast_tan, fast_tanh},
    },
    error::{DspError, SampleRate},
};
use std::f32::consts::PI;

/*
MS-20 Style Two-Pole
====================

Two integrator loops in series. Each loop is a one-pole built from a
multiplier (the OTA) and a trapezoidal integrator, with its output fed back
to its own input inside the same sample:

         in1 ──►(−)──► × in2 ──► TPT ──┐
                 ▲                     │ s
                 └──── y = in1·in2 + s ◄┘

The second loop's input adds the resonance signal back, the first loop
subtracts it; together they form the Sallen-Key-like peak of the Korg
circuit:

    x ──► tanh(drive) ──►(−)──► loop1 ──►(+)──► loop2 ──► lowpass
                          ▲ ky         ▲ ky
                          └────────────┴── k·tanh(y)

The resonance path has a tanh in it, so the loop has no closed form. `y` is
first estimated from the linear version of the same loop (zero delay, no
tanh), then the nonlinearity is applied to that estimate. At 8× oversampling
the estimate is close enough that the peak stays stable up to
self-oscillation.

    highpass = x − 2·y1 + y2
*/

pub const OVERSAMPLE: usize = 8;

/// Input gain at full drive.
pub const DRIVE_GAIN: f32 = 20.0;

/// Trapezoidal integrator driven by a product of two inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tpt {
    z: f32,
}

impl Tpt {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn process(&mut self, a: f32, b: f32) -> f32 {
        let p = a * b;
        self.z = p + self.z + p;
        self.z
    }

    pub fn state(&self) -> f32 {
        self.z
    }

    pub fn reset(&mut self) {
        self.z = 0.0;
    }
}

/// One zero-delay feedback loop around a [`Tpt`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ZdfLoop {
    s: f32,
    tpt: Tpt,
}

impl ZdfLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output for this sample. `s` is read before it is replaced, so the
    /// feedback arrives in the same sample.
    #[inline]
    pub fn process(&mut self, in1: f32, in2: f32) -> f32 {
        let y = in1 * in2 + self.s;
        self.s = self.tpt.process(in1 - y, in2);
        y
    }

    /// Feedback state consumed by the next call.
    pub fn state(&self) -> f32 {
        self.s
    }

    pub fn reset(&mut self) {
        self.s = 0.0;
        self.tpt.reset();
    }
}

#[derive(Debug, Clone)]
struct Ms20Core {
    sample_rate: SampleRate,
    loop1: ZdfLoop,
    loop2: ZdfLoop,
    b: f32,
    g: f32,
    g2: f32,
    k: f32,
    gain: f32,
    noise: Noise,
}

impl Ms20Core {
    fn new(sample_rate: SampleRate) -> Self {
        Self {
            sample_rate,
            loop1: ZdfLoop::new(),
            loop2: ZdfLoop::new(),
            b: 0.0,
            g: 0.0,
            g2: 0.0,
            k: 0.0,
            gain: 1.0,
            noise: Noise::new(NOISE_GAIN),
        }
    }

    fn update(&mut self, cutoff_hz: f32, peak: f32, drive: f32) {
        self.b = fast_tan(PI * cutoff_hz / self.sample_rate.hz());
        self.g = self.b / (1.0 + self.b);
        self.g2 = self.g * self.g;
        self.k = 2.0 * peak;
        self.gain = 1.0 + drive * (DRIVE_GAIN - 1.0);
    }
}

impl Oversampled<2> for Ms20Core {
    fn set_sample_rate(&mut self, sample_rate: SampleRate) {
        self.sample_rate = sample_rate;
    }

    #[inline]
    fn tick(&mut self, input: f32) -> [f32; 2] {
        let (g, g2, k) = (self.g, self.g2, self.k);
        let x = fast_tanh(input * self.gain) + self.noise.next();

        let y = (g2 * x + g * self.loop1.state() + self.loop2.state()) / (1.0 - k * (g - g2));
        let ky = k * fast_tanh(y);

        let y1 = self.loop1.process(x - ky, g);
        let y2 = self.loop2.process(y1 + ky, g);

        [y2, x - 2.0 * y1 + y2]
    }

    fn reset(&mut self) {
        self.loop1.reset();
        self.loop2.reset();
        self.noise.reset();
    }
}

/// Two-pole lowpass/highpass with a driven input and a resonant peak that
/// reaches self-oscillation at `peak = 1`.
#[derive(Debug, Clone)]
pub struct Ms20Filter {
    state: EffectState,
    frequency: f32,
    peak: f32,
    drive: f32,
    frequency_hz: f32,
    os: Oversampler<Ms20Core, OVERSAMPLE, 2>,
    input: f32,
    lp: f32,
    hp: f32,
}

impl Ms20Filter {
    pub fn new(sample_rate: f32) -> Result<Self, DspError> {
        let rate = SampleRate::new(sample_rate)?;
        let mut filter = Self {
            state: EffectState::new(rate),
            frequency: 1.0,
            peak: 0.0,
            drive: 0.0,
            frequency_hz: 0.0,
            os: Oversampler::new(Ms20Core::new(rate), rate),
            input: 0.0,
            lp: 0.0,
            hp: 0.0,
        };
        filter.invalidate();
        Ok(filter)
    }

    /// Normalized cutoff, 0..1 over ten octaves from 20 Hz.
    pub fn set_frequency(&mut self, frequency: f32) {
        if update(&mut self.frequency, frequency.clamp(0.0, 1.0)) {
            self.state.mark_dirty();
        }
    }

    /// Resonance, 0..1.
    pub fn set_peak(&mut self, peak: f32) {
        if update(&mut self.peak, peak.clamp(0.0, 1.0)) {
            self.state.mark_dirty();
        }
    }

    /// Input drive, 0..1.
    pub fn set_drive(&mut self, drive: f32) {
        if update(&mut self.drive, drive.clamp(0.0, 1.0)) {
            self.state.mark_dirty();
        }
    }

    #[inline]
    pub fn set_in(&mut self, input: f32) {
        self.input = input;
    }

    #[inline]
    pub fn lp_out(&self) -> f32 {
        self.lp
    }

    #[inline]
    pub fn hp_out(&self) -> f32 {
        self.hp
    }

    pub fn frequency_hz(&self) -> f32 {
        self.frequency_hz
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn peak(&self) -> f32 {
        self.peak
    }

    pub fn drive(&self) -> f32 {
        self.drive
    }

    pub fn reset(&mut self) {
        self.os.reset();
        self.input = 0.0;
        self.lp = 0.0;
        self.hp = 0.0;
    }
}

impl Effect for Ms20Filter {
    fn init(&mut self) {
        self.reset();
    }

    fn invalidate(&mut self) {
        // The loop runs at 8× but the cutoff is still bounded by the host band
        self.frequency_hz = clamp_cutoff(
            cutoff_from_fraction(self.frequency),
            self.os.host_rate().hz(),
        );
        let (hz, peak, drive) = (self.frequency_hz, self.peak, self.drive);
        self.os.stage_mut().update(hz, peak, drive);

        self.state.clear_dirty();
    }

    #[inline]
    fn process(&mut self) {
        if self.state.is_dirty() {
            self.invalidate();
        }
        let [lp, hp] = self.os.process(self.input);
        self.lp = lp;
        self.hp = hp;
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
