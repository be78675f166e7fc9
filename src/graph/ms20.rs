use crate::{
    config::{FilterTap, Ms20Config},
    dsp::{effect::Effect, zdf::Ms20Filter},
    error::DspError,
    graph::node::{GraphNode, Modulatable, RateTracker, RenderCtx},
};

/*
MS-20 Filter Node
=================

Block wrapper around `Ms20Filter`. All three parameters are 0..1:

  Frequency  ten octaves from 20 Hz, same map as the diode ladder
  Peak       resonance; screams at 1
  Drive      input gain 1..20 into the tanh ahead of the loops

The filter always runs 8× oversampled, so there is no quality switch.
*/

#[derive(Clone, Copy, Debug)]
pub enum Ms20Param {
    Frequency,
    Peak,
    Drive,
}

#[derive(Debug, Clone)]
pub struct Ms20Node {
    filter: Ms20Filter,
    config: Ms20Config,
    rate: RateTracker,
    base_frequency: f32,
    base_peak: f32,
    base_drive: f32,
}

impl Ms20Node {
    pub fn new(sample_rate: f32, config: Ms20Config) -> Result<Self, DspError> {
        Ok(Self {
            filter: Ms20Filter::new(sample_rate)?,
            config,
            rate: RateTracker::new(sample_rate),
            base_frequency: 1.0,
            base_peak: 0.0,
            base_drive: 0.0,
        })
    }

    pub fn lowpass(sample_rate: f32) -> Result<Self, DspError> {
        Self::new(sample_rate, Ms20Config::default())
    }

    pub fn highpass(sample_rate: f32) -> Result<Self, DspError> {
        Self::new(
            sample_rate,
            Ms20Config {
                tap: FilterTap::Highpass,
            },
        )
    }

    pub fn set_tap(&mut self, tap: FilterTap) {
        self.config.tap = tap;
    }

    pub fn config(&self) -> Ms20Config {
        self.config
    }

    pub fn frequency_hz(&self) -> f32 {
        self.filter.frequency_hz()
    }

    pub fn filter(&self) -> &Ms20Filter {
        &self.filter
    }
}

impl Modulatable for Ms20Node {
    type Param = Ms20Param;

    fn get_param(&self, param: Self::Param) -> f32 {
        match param {
            Ms20Param::Frequency => self.base_frequency,
            Ms20Param::Peak => self.base_peak,
            Ms20Param::Drive => self.base_drive,
        }
    }

    fn apply_modulation(&mut self, param: Self::Param, base: f32, modulation: f32) {
        let final_value = (base + modulation).clamp(0.0, 1.0);
        match param {
            Ms20Param::Frequency => {
                self.base_frequency = base;
                self.filter.set_frequency(final_value);
            }
            Ms20Param::Peak => {
                self.base_peak = base;
                self.filter.set_peak(final_value);
            }
            Ms20Param::Drive => {
                self.base_drive = base;
                self.filter.set_drive(final_value);
            }
        }
    }
}

impl GraphNode for Ms20Node {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.rate.follow(&mut self.filter, ctx);

        for sample in out.iter_mut() {
            self.filter.set_in(*sample);
            self.filter.process();
            *sample = match self.config.tap {
                FilterTap::Lowpass => self.filter.lp_out(),
                FilterTap::Highpass => self.filter.hp_out(),
            };
        }
    }

    fn reset(&mut self) {
        self.filter.reset();
    }
}
