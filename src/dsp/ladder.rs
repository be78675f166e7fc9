use crate::{
    dsp::{
        effect::{update, Effect, EffectState},
        noise::{Noise, NOISE_GAIN},
        oversampler::{Oversampled, Oversampler},
        trig::{clamp_cutoff, cutoff_from_fraction, fast_tanh, warp},
    },
    error::{DspError, SampleRate},
};

/*
Diode-Ladder Filter
===================

Four one-pole sections in series, like the transistor ladder, but coupled
the way a diode ladder is: every stage also sees the state of the stage
after it, and the last three run at half gain. The whole chain is wrapped in
a global negative feedback loop whose gain `k` is the resonance.

    x ──►(+)──► tanh ──► LPF1 ◄──► LPF2 ◄──► LPF3 ◄──► LPF4 ──┬──► lowpass
          ▲ -k                                                │
          └───────────────────── Σ ◄──────────────────────────┘

Each section is a trapezoidal (TPT) one-pole. The coupling and the global
loop are resolved algebraically inside the sample, so there is no unit delay
in either path:

    Σ   weighted sum of what every stage would output with zero input
    Γ   gain from the loop input to the last stage
    u = tanh((drive·x - k·Σ) / (1 + k·Γ))

The saturator sits inside the loop: more drive pushes the input further into
tanh, which leaves less headroom for the resonant component and flattens the
peak, the way the analog circuit does.

Resonance
---------
The linearized loop sits exactly on the edge of stability at k = 17 (at
roughly fc/√2, the resonant frequency of the coupled ladder). tanh only ever
lowers the loop gain, so the filter needs some headroom above that edge to
sing on its own. `MAX_RESONANCE` leaves that headroom: at the limit the
noise floor grows into a steady sine and tanh keeps it bounded.

Noise
-----
A -160 dB noise floor is summed into the loop input. It seeds
self-oscillation when there is no input and keeps the stage memories out of
the subnormal range.

Quality
-------
`low == true` runs the loop at the host rate. `low == false` ("hidef") runs
it through a 2× oversampler so the saturator aliases less. The choice is
left to the caller.
*/

/// Highest usable loop gain. Past 17 the linear loop is unstable and only
/// the saturator holds the oscillation.
pub const MAX_RESONANCE: f32 = 20.0;

pub const MIN_SATURATION: f32 = 1.0;
pub const MAX_SATURATION: f32 = 15.0;

/// Oversampling factor of the hidef path.
pub const OVERSAMPLE: usize = 2;

/// One trapezoidal one-pole section of the ladder.
///
/// `feedback` carries the neighbour's contribution for the current sample and
/// is refreshed by the ladder before every tick.
#[derive(Debug, Clone, Copy)]
pub struct LadderStage {
    alpha: f32,
    beta: f32,
    gamma: f32,
    delta: f32,
    epsilon: f32,
    a0: f32,
    feedback: f32,
    z1: f32,
}

impl Default for LadderStage {
    fn default() -> Self {
        Self::new()
    }
}

impl LadderStage {
    pub fn new() -> Self {
        Self {
            alpha: 1.0,
            beta: 0.0,
            gamma: 1.0,
            delta: 0.0,
            epsilon: 0.0,
            a0: 1.0,
            feedback: 0.0,
            z1: 0.0,
        }
    }

    /// What this stage contributes to the stage before it (and to Σ).
    #[inline]
    pub fn feedback_output(&self) -> f32 {
        self.beta * (self.z1 + self.feedback * self.delta)
    }

    #[inline]
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback;
    }

    pub fn z1(&self) -> f32 {
        self.z1
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Clear the memory and the pending feedback together.
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.feedback = 0.0;
    }

    #[inline]
    pub fn tick(&mut self, input: f32) -> f32 {
        let x = input * self.gamma + self.feedback + self.epsilon * self.feedback_output();
        let v = (self.a0 * x - self.z1) * self.alpha;
        let lp = v + self.z1;
        self.z1 = v + lp;
        lp
    }
}

/// The feedback loop proper. Runs at whatever rate it is given: host rate in
/// low mode, `OVERSAMPLE ×` host inside the oversampler otherwise.
#[derive(Debug, Clone)]
struct LadderCore {
    stages: [LadderStage; 4],
    sample_rate: SampleRate,
    k: f32,
    drive: f32,
    gamma: f32,
    sigma_gains: [f32; 4],
    noise: Noise,
}

impl LadderCore {
    fn new(sample_rate: SampleRate) -> Self {
        Self {
            stages: [LadderStage::new(); 4],
            sample_rate,
            k: 0.0,
            drive: MIN_SATURATION,
            gamma: 0.0,
            sigma_gains: [0.0; 4],
            noise: Noise::new(NOISE_GAIN),
        }
    }

    /// Bilinear-transform coefficients of the coupled ladder for `cutoff_hz`.
    fn update(&mut self, cutoff_hz: f32, k: f32, drive: f32) {
        self.k = k;
        self.drive = drive;

        let g = warp(cutoff_hz, self.sample_rate.hz());

        // Instantaneous gains of each section given the one after it
        let g4 = 0.5 * g / (1.0 + g);
        let g3 = 0.5 * g / (1.0 + g - 0.5 * g * g4);
        let g2 = 0.5 * g / (1.0 + g - 0.5 * g * g3);
        let g1 = g / (1.0 + g - g * g2);

        self.gamma = g4 * g3 * g2 * g1;
        self.sigma_gains = [g4 * g3 * g2, g4 * g3, g4, 1.0];

        let alpha = g / (1.0 + g);
        let [s1, s2, s3, s4] = &mut self.stages;

        for stage in [&mut *s1, &mut *s2, &mut *s3, &mut *s4] {
            stage.alpha = alpha;
        }

        s1.beta = 1.0 / (1.0 + g - g * g2);
        s2.beta = 1.0 / (1.0 + g - 0.5 * g * g3);
        s3.beta = 1.0 / (1.0 + g - 0.5 * g * g4);
        s4.beta = 1.0 / (1.0 + g);

        s1.gamma = 1.0 + g1 * g2;
        s2.gamma = 1.0 + g2 * g3;
        s3.gamma = 1.0 + g3 * g4;
        s4.gamma = 1.0;

        s1.delta = g;
        s2.delta = 0.5 * g;
        s3.delta = 0.5 * g;
        s4.delta = 0.0;

        s1.epsilon = g2;
        s2.epsilon = g3;
        s3.epsilon = g4;
        s4.epsilon = 0.0;

        s1.a0 = 1.0;
        s2.a0 = 0.5;
        s3.a0 = 0.5;
        s4.a0 = 0.5;
    }
}

impl Oversampled<2> for LadderCore {
    fn set_sample_rate(&mut self, sample_rate: SampleRate) {
        self.sample_rate = sample_rate;
    }

    #[inline]
    fn tick(&mut self, input: f32) -> [f32; 2] {
        let [s1, s2, s3, s4] = &mut self.stages;
        s4.set_feedback(0.0);
        s3.set_feedback(s4.feedback_output());
        s2.set_feedback(s3.feedback_output());
        s1.set_feedback(s2.feedback_output());

        let [w1, w2, w3, w4] = self.sigma_gains;
        let sigma = w1 * s1.feedback_output()
            + w2 * s2.feedback_output()
            + w3 * s3.feedback_output()
            + w4 * s4.feedback_output();

        let x = self.drive * input + self.noise.next();
        let u = fast_tanh((x - self.k * sigma) / (1.0 + self.k * self.gamma));

        let lp = s4.tick(s3.tick(s2.tick(s1.tick(u))));
        [lp, u - lp]
    }

    fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
        self.noise.reset();
    }
}

/// Diode-ladder lowpass with a complementary highpass tap.
///
/// ```ignore
/// let mut vcf = DiodeLadderFilter::new(48_000.0)?;
/// vcf.set_frequency(0.6);
/// vcf.set_resonance(8.0);
/// vcf.set_in(sample);
/// vcf.process();
/// let lp = vcf.out();
/// ```
#[derive(Debug, Clone)]
pub struct DiodeLadderFilter {
    state: EffectState,
    fc: f32,
    k: f32,
    saturation: f32,
    freq_hz: f32,
    low: bool,
    os: Oversampler<LadderCore, OVERSAMPLE, 2>,
    input: f32,
    out: f32,
    out2: f32,
}

impl DiodeLadderFilter {
    pub fn new(sample_rate: f32) -> Result<Self, DspError> {
        let rate = SampleRate::new(sample_rate)?;
        let mut filter = Self {
            state: EffectState::new(rate),
            fc: 1.0,
            k: 0.0,
            saturation: MIN_SATURATION,
            freq_hz: 0.0,
            low: true,
            os: Oversampler::new(LadderCore::new(rate), rate),
            input: 0.0,
            out: 0.0,
            out2: 0.0,
        };
        filter.retune();
        filter.invalidate();
        Ok(filter)
    }

    /// Normalized cutoff, 0..1 over ten octaves from 20 Hz.
    pub fn set_frequency(&mut self, fc: f32) {
        if update(&mut self.fc, fc.clamp(0.0, 1.0)) {
            self.state.mark_dirty();
        }
    }

    pub fn set_resonance(&mut self, k: f32) {
        if update(&mut self.k, k.clamp(0.0, MAX_RESONANCE)) {
            self.state.mark_dirty();
        }
    }

    pub fn set_saturation(&mut self, saturation: f32) {
        if update(
            &mut self.saturation,
            saturation.clamp(MIN_SATURATION, MAX_SATURATION),
        ) {
            self.state.mark_dirty();
        }
    }

    /// `true` runs at the host rate, `false` runs the loop 2× oversampled.
    pub fn set_low(&mut self, low: bool) {
        if self.low != low {
            log::debug!(
                "diode ladder switching to {} mode",
                if low { "low" } else { "hidef" }
            );
            self.low = low;
            self.retune();
            self.state.mark_dirty();
        }
    }

    pub fn is_low(&self) -> bool {
        self.low
    }

    #[inline]
    pub fn set_in(&mut self, input: f32) {
        self.input = input;
    }

    /// Lowpass output of the last processed sample.
    #[inline]
    pub fn out(&self) -> f32 {
        self.out
    }

    /// Highpass output: loop input minus the lowpass.
    #[inline]
    pub fn out2(&self) -> f32 {
        self.out2
    }

    /// Cutoff in Hz actually used by the loop.
    pub fn freq_hz(&self) -> f32 {
        self.freq_hz
    }

    pub fn frequency(&self) -> f32 {
        self.fc
    }

    pub fn resonance(&self) -> f32 {
        self.k
    }

    pub fn saturation(&self) -> f32 {
        self.saturation
    }

    /// Zero all four stage memories and their feedback terms at once,
    /// together with the oversampler history and the noise sequence.
    pub fn reset(&mut self) {
        log::trace!("diode ladder reset");
        self.os.reset();
        self.input = 0.0;
        self.out = 0.0;
        self.out2 = 0.0;
    }

    /// Stage memories, first to last.
    pub fn stage_states(&self) -> [f32; 4] {
        self.os.stage().stages.map(|s| s.z1())
    }

    /// Pending feedback terms, first to last.
    pub fn stage_feedbacks(&self) -> [f32; 4] {
        self.os.stage().stages.map(|s| s.feedback())
    }

    /// Push the current host rate to the loop for the active mode.
    fn retune(&mut self) {
        let rate = self.state.rate();
        if self.low {
            self.os.stage_mut().set_sample_rate(rate);
        } else {
            self.os.set_sample_rate(rate);
        }
    }
}

impl Effect for DiodeLadderFilter {
    fn init(&mut self) {
        self.reset();
    }

    fn invalidate(&mut self) {
        // Clamped against the host rate in both modes
        let rate = self.state.rate().hz();
        self.freq_hz = clamp_cutoff(cutoff_from_fraction(self.fc), rate);

        let (freq_hz, k, saturation) = (self.freq_hz, self.k, self.saturation);
        self.os.stage_mut().update(freq_hz, k, saturation);
        self.state.clear_dirty();
    }

    #[inline]
    fn process(&mut self) {
        if self.state.is_dirty() {
            self.invalidate();
        }

        let [lp, hp] = if self.low {
            self.os.stage_mut().tick(self.input)
        } else {
            self.os.process(self.input)
        };

        self.out = lp;
        self.out2 = hp;
    }

    fn set_sample_rate(&mut self, sample_rate: f32) -> Result<(), DspError> {
        self.state.set_sample_rate(sample_rate)?;
        self.retune();
        self.invalidate();
        Ok(())
    }

    fn sample_rate(&self) -> f32 {
        self.state.rate().hz()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    const SR: f32 = 48_000.0;

    /// Knob position that lands on `hz`.
    fn fraction_for(hz: f32) -> f32 {
        (hz / 20.0).log2() / 10.0
    }

    fn run(filter: &mut DiodeLadderFilter, input: impl IntoIterator<Item = f32>) -> Vec<f32> {
        input
            .into_iter()
            .map(|x| {
                filter.set_in(x);
                filter.process();
                filter.out()
            })
            .collect()
    }

    fn peak(buffer: &[f32]) -> f32 {
        buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    #[test]
    fn test_dc_passes_without_resonance() {
        let mut vcf = DiodeLadderFilter::new(SR).unwrap();
        vcf.set_frequency(0.5);

        let out = run(&mut vcf, std::iter::repeat(0.1).take(9_600));
        let last = *out.last().unwrap();
        assert!((last - 0.1).abs() < 0.005, "dc settled at {}", last);
    }

    #[test]
    fn test_resonance_lowers_passband() {
        let mut open = DiodeLadderFilter::new(SR).unwrap();
        open.set_frequency(0.5);
        let mut resonant = open.clone();
        resonant.set_resonance(10.0);

        let a = *run(&mut open, std::iter::repeat(0.1).take(9_600)).last().unwrap();
        let b = *run(&mut resonant, std::iter::repeat(0.1).take(9_600))
            .last()
            .unwrap();
        assert!(b < a * 0.5, "open={}, resonant={}", a, b);
    }

    #[test]
    fn test_attenuates_above_cutoff() {
        let mut vcf = DiodeLadderFilter::new(SR).unwrap();
        vcf.set_frequency(fraction_for(500.0));

        let tone = (0..9_600).map(|n| 0.1 * (TAU * 8_000.0 * n as f32 / SR).sin());
        let out = run(&mut vcf, tone);
        assert!(peak(&out[4_800..]) < 0.001, "peak {}", peak(&out[4_800..]));
    }

    #[test]
    fn test_decays_to_noise_floor_below_max_resonance() {
        let mut vcf = DiodeLadderFilter::new(SR).unwrap();
        vcf.set_frequency(fraction_for(1_000.0));
        vcf.set_resonance(12.0);

        run(&mut vcf, [0.5]);
        let out = run(&mut vcf, std::iter::repeat(0.0).take(48_000));
        assert!(out.iter().all(|x| x.is_finite()));
        assert!(peak(&out[46_000..]) < 1e-4);
    }

    #[test]
    fn test_self_oscillation_stays_bounded() {
        let mut vcf = DiodeLadderFilter::new(SR).unwrap();
        vcf.set_frequency(fraction_for(1_000.0));
        vcf.set_resonance(MAX_RESONANCE);
        vcf.set_saturation(MAX_SATURATION);

        let out = run(&mut vcf, std::iter::repeat(0.0).take(96_000));
        assert!(out.iter().all(|x| x.is_finite()));
        assert!(peak(&out) < 2.0);
    }

    #[test]
    fn test_max_resonance_sings_without_input() {
        for low in [true, false] {
            let mut vcf = DiodeLadderFilter::new(SR).unwrap();
            vcf.set_low(low);
            vcf.set_frequency(fraction_for(1_000.0));
            vcf.set_resonance(MAX_RESONANCE);

            // Only the noise floor drives the loop
            let out = run(&mut vcf, std::iter::repeat(0.0).take(48_000));
            assert!(out.iter().all(|x| x.is_finite()));
            let tail = peak(&out[36_000..]);
            assert!(tail > 0.01 && tail < 2.0, "low={}, tail peak {}", low, tail);
        }
    }

    #[test]
    fn test_hidef_cutoff_is_clamped_to_host_rate() {
        let sr = 32_000.0;
        let mut vcf = DiodeLadderFilter::new(sr).unwrap();
        vcf.set_low(false);
        vcf.set_frequency(1.0);
        vcf.invalidate();
        assert!(vcf.freq_hz() <= 0.45 * sr, "freq_hz {}", vcf.freq_hz());

        let mut low = DiodeLadderFilter::new(sr).unwrap();
        low.set_frequency(1.0);
        low.invalidate();
        assert_eq!(vcf.freq_hz(), low.freq_hz());
    }

    #[test]
    fn test_resonance_is_clamped() {
        let mut vcf = DiodeLadderFilter::new(SR).unwrap();
        vcf.set_resonance(100.0);
        assert_eq!(vcf.resonance(), MAX_RESONANCE);
        vcf.set_resonance(-3.0);
        assert_eq!(vcf.resonance(), 0.0);

        vcf.set_saturation(0.0);
        assert_eq!(vcf.saturation(), MIN_SATURATION);
        vcf.set_saturation(40.0);
        assert_eq!(vcf.saturation(), MAX_SATURATION);
    }

    #[test]
    fn test_saturation_compresses_resonant_peak() {
        let tone: Vec<f32> = (0..9_600)
            .map(|n| 0.2 * (TAU * 700.0 * n as f32 / SR).sin())
            .collect();

        let gain = |saturation: f32| {
            let mut vcf = DiodeLadderFilter::new(SR).unwrap();
            vcf.set_frequency(fraction_for(1_000.0));
            vcf.set_resonance(10.0);
            vcf.set_saturation(saturation);
            let out = run(&mut vcf, tone.iter().copied());
            peak(&out[4_800..]) / (0.2 * saturation)
        };

        let clean = gain(1.0);
        let driven = gain(15.0);
        assert!(
            driven < clean * 0.5,
            "expected drive to flatten the peak: clean={}, driven={}",
            clean,
            driven
        );
    }

    #[test]
    fn test_freq_hz_tracks_knob() {
        let mut vcf = DiodeLadderFilter::new(SR).unwrap();
        vcf.set_frequency(0.5);
        vcf.invalidate();
        assert!((vcf.freq_hz() - 640.0).abs() < 0.1);

        vcf.set_frequency(1.0);
        vcf.invalidate();
        assert!(vcf.freq_hz() <= 0.45 * SR);
    }

    #[test]
    fn test_hidef_mode_runs_at_double_rate() {
        let mut vcf = DiodeLadderFilter::new(SR).unwrap();
        vcf.set_low(false);
        assert_eq!(vcf.os.stage().sample_rate.hz(), 2.0 * SR);

        vcf.set_frequency(0.5);
        let out = run(&mut vcf, std::iter::repeat(0.1).take(9_600));
        let last = *out.last().unwrap();
        assert!((last - 0.1).abs() < 0.005, "dc settled at {}", last);

        vcf.set_low(true);
        assert_eq!(vcf.os.stage().sample_rate.hz(), SR);
    }

    #[test]
    fn test_reset_clears_stages_and_feedback_together() {
        let mut vcf = DiodeLadderFilter::new(SR).unwrap();
        vcf.set_frequency(0.7);
        vcf.set_resonance(15.0);
        run(&mut vcf, (0..512).map(|n| (n as f32 * 0.1).sin()));

        assert!(vcf.stage_states().iter().any(|&z| z != 0.0));
        assert!(vcf.stage_feedbacks().iter().any(|&f| f != 0.0));

        vcf.reset();
        assert_eq!(vcf.stage_states(), [0.0; 4]);
        assert_eq!(vcf.stage_feedbacks(), [0.0; 4]);
        assert_eq!(vcf.out(), 0.0);
    }

    #[test]
    fn test_invalid_sample_rate_keeps_coefficients() {
        let mut vcf = DiodeLadderFilter::new(SR).unwrap();
        vcf.set_frequency(0.6);
        vcf.set_resonance(5.0);
        vcf.invalidate();
        let mut twin = vcf.clone();
        let hz = vcf.freq_hz();

        assert_eq!(
            vcf.set_sample_rate(0.0),
            Err(DspError::InvalidSampleRate(0.0))
        );
        assert!(vcf.set_sample_rate(-48_000.0).is_err());
        assert_eq!(vcf.sample_rate(), SR);
        assert_eq!(vcf.freq_hz(), hz);

        let input: Vec<f32> = (0..256).map(|n| (n as f32 * 0.05).sin()).collect();
        assert_eq!(
            run(&mut vcf, input.iter().copied()),
            run(&mut twin, input.iter().copied())
        );
    }
}
