use crate::{
    config::{DiodeVcfConfig, FilterTap},
    dsp::{
        effect::Effect,
        ladder::{DiodeLadderFilter, MAX_RESONANCE, MAX_SATURATION, MIN_SATURATION},
    },
    error::DspError,
    graph::node::{quartic_bipolar, GraphNode, Modulatable, RateTracker, RenderCtx},
};

/*
Diode-Ladder VCF Node
=====================

Block wrapper around `DiodeLadderFilter` with the knob layout of a modular
filter panel. Every parameter is a knob position in 0..1; modulation is
added to the knob and the sum is mapped onto the filter's own range:

  Frequency   0..1 → 20 Hz .. 20.48 kHz (ten octaves, exponential)
  Resonance   0..1 → k = 0 .. MAX_RESONANCE (linear; self-oscillation
              starts around 0.85)
  Saturation  0..1 → drive 1 .. 15, quartic so most of the knob travel
              stays near clean

Taps
----
Lowpass is the ladder output. Highpass is the loop input minus the lowpass,
scaled down so both taps sit at similar loudness.

Hidef
-----
Runs the saturating loop at twice the host rate. Costs about twice the CPU
and removes most of the aliasing at high drive.

Example usage:

  let mut vcf = DiodeVcfNode::lowpass(48_000.0)?;
  vcf.apply_modulation(DiodeVcfParam::Frequency, 0.6, lfo_value);
  vcf.render_block(&mut block, &ctx);
*/

/// Highpass tap level relative to the lowpass.
pub const HIGHPASS_GAIN: f32 = 0.65;

#[derive(Clone, Copy, Debug)]
pub enum DiodeVcfParam {
    Frequency,
    Resonance,
    Saturation,
}

#[derive(Debug, Clone)]
pub struct DiodeVcfNode {
    filter: DiodeLadderFilter,
    config: DiodeVcfConfig,
    rate: RateTracker,
    base_frequency: f32,
    base_resonance: f32,
    base_saturation: f32,
}

impl DiodeVcfNode {
    pub fn new(sample_rate: f32, config: DiodeVcfConfig) -> Result<Self, DspError> {
        let mut filter = DiodeLadderFilter::new(sample_rate)?;
        filter.set_low(!config.hidef);

        Ok(Self {
            filter,
            config,
            rate: RateTracker::new(sample_rate),
            base_frequency: 1.0,
            base_resonance: 0.0,
            base_saturation: 0.0,
        })
    }

    pub fn lowpass(sample_rate: f32) -> Result<Self, DspError> {
        Self::new(sample_rate, DiodeVcfConfig::default())
    }

    pub fn highpass(sample_rate: f32) -> Result<Self, DspError> {
        Self::new(
            sample_rate,
            DiodeVcfConfig {
                tap: FilterTap::Highpass,
                ..DiodeVcfConfig::default()
            },
        )
    }

    pub fn with_hidef(mut self, hidef: bool) -> Self {
        self.set_hidef(hidef);
        self
    }

    pub fn set_hidef(&mut self, hidef: bool) {
        self.config.hidef = hidef;
        self.filter.set_low(!hidef);
    }

    pub fn set_tap(&mut self, tap: FilterTap) {
        self.config.tap = tap;
    }

    pub fn config(&self) -> DiodeVcfConfig {
        self.config
    }

    /// Resolved cutoff for display.
    pub fn freq_hz(&self) -> f32 {
        self.filter.freq_hz()
    }

    pub fn filter(&self) -> &DiodeLadderFilter {
        &self.filter
    }
}

impl Modulatable for DiodeVcfNode {
    type Param = DiodeVcfParam;

    fn get_param(&self, param: Self::Param) -> f32 {
        match param {
            DiodeVcfParam::Frequency => self.base_frequency,
            DiodeVcfParam::Resonance => self.base_resonance,
            DiodeVcfParam::Saturation => self.base_saturation,
        }
    }

    fn apply_modulation(&mut self, param: Self::Param, base: f32, modulation: f32) {
        let final_value = base + modulation;
        match param {
            DiodeVcfParam::Frequency => {
                self.base_frequency = base;
                self.filter.set_frequency(final_value.clamp(0.0, 1.0));
            }
            DiodeVcfParam::Resonance => {
                self.base_resonance = base;
                self.filter
                    .set_resonance((final_value * MAX_RESONANCE).clamp(0.0, MAX_RESONANCE));
            }
            DiodeVcfParam::Saturation => {
                self.base_saturation = base;
                let drive = quartic_bipolar(final_value) * (MAX_SATURATION - MIN_SATURATION)
                    + MIN_SATURATION;
                self.filter
                    .set_saturation(drive.clamp(MIN_SATURATION, MAX_SATURATION));
            }
        }
    }
}

impl GraphNode for DiodeVcfNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.rate.follow(&mut self.filter, ctx);

        for sample in out.iter_mut() {
            self.filter.set_in(*sample);
            self.filter.process();
            *sample = match self.config.tap {
                FilterTap::Lowpass => self.filter.out(),
                FilterTap::Highpass => self.filter.out2() * HIGHPASS_GAIN,
            };
        }
    }

    fn reset(&mut self) {
        self.filter.reset();
    }
}
