use crate::{
    config::{WestcoastConfig, WestcoastMode},
    dsp::{
        distortion::{hard_clip, overdrive, polynom, saturate, soft_clip},
        effect::Effect,
        wavefolder::{LockhartWavefolder, SergeWavefolder, Wavefolder},
    },
    error::DspError,
    graph::node::{GraphNode, Modulatable, RateTracker, RenderCtx},
};

/*
Westcoast Complex Shaper
========================

One input, one output, a selector and two knobs. The selector picks the
shaping stage at run time:

  Overdrive  asymmetric exponential clipper
  Lockhart   diode/transistor wavefolder (4 stages, ADAA, 4× oversampled)
  Serge      soft-clip wavefolder (6 cells, 4× oversampled)
  Saturate   tanh
  Polynom    cubic knee
  SoftClip   x / (1 + |x|)
  HardClip   clamp to ±1

Every stage sees the same pre-scaled signal:

  x = input · gain + bias

Gain (0..20) sets how far into the curve the signal goes; for the
wavefolders it is the number of folds. Bias (-6..6) shifts the signal
against the curve and makes the folds asymmetric.

Both wavefolders are kept alive so switching modes never allocates; the
inactive one simply is not processed.
*/

pub const MAX_GAIN: f32 = 20.0;
pub const MAX_BIAS: f32 = 6.0;

#[derive(Clone, Copy, Debug)]
pub enum WestcoastParam {
    Gain,
    Bias,
}

#[derive(Debug, Clone)]
pub struct WestcoastNode {
    config: WestcoastConfig,
    lockhart: LockhartWavefolder,
    serge: SergeWavefolder,
    rate: RateTracker,
    base_gain: f32,
    base_bias: f32,
    gain: f32,
    bias: f32,
}

impl WestcoastNode {
    pub fn new(sample_rate: f32, config: WestcoastConfig) -> Result<Self, DspError> {
        Ok(Self {
            config,
            lockhart: LockhartWavefolder::new(sample_rate)?,
            serge: SergeWavefolder::new(sample_rate)?,
            rate: RateTracker::new(sample_rate),
            base_gain: 1.0,
            base_bias: 0.0,
            gain: 1.0,
            bias: 0.0,
        })
    }

    pub fn with_mode(sample_rate: f32, mode: WestcoastMode) -> Result<Self, DspError> {
        Self::new(sample_rate, WestcoastConfig { mode })
    }

    pub fn set_mode(&mut self, mode: WestcoastMode) {
        if self.config.mode != mode {
            log::debug!("westcoast mode {} -> {}", self.config.mode.name(), mode.name());
            self.config.mode = mode;
        }
    }

    pub fn mode(&self) -> WestcoastMode {
        self.config.mode
    }

    pub fn config(&self) -> WestcoastConfig {
        self.config
    }

    /// Effective gain after modulation and clamping.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Effective bias after modulation and clamping.
    pub fn bias(&self) -> f32 {
        self.bias
    }

    fn folder(&mut self) -> Option<&mut dyn Wavefolder> {
        match self.config.mode {
            WestcoastMode::Lockhart => Some(&mut self.lockhart),
            WestcoastMode::Serge => Some(&mut self.serge),
            _ => None,
        }
    }

    #[inline]
    fn shape(&self, x: f32) -> f32 {
        let x = x * self.gain + self.bias;
        match self.config.mode {
            WestcoastMode::Overdrive => overdrive(x, 1.0),
            WestcoastMode::Saturate => saturate(x, 1.0),
            WestcoastMode::Polynom => polynom(x, 1.0),
            WestcoastMode::SoftClip => soft_clip(x, 1.0),
            WestcoastMode::HardClip => hard_clip(x, 1.0, 1.0),
            // Folders are handled in render_block
            WestcoastMode::Lockhart | WestcoastMode::Serge => x,
        }
    }
}

impl Modulatable for WestcoastNode {
    type Param = WestcoastParam;

    fn get_param(&self, param: Self::Param) -> f32 {
        match param {
            WestcoastParam::Gain => self.base_gain,
            WestcoastParam::Bias => self.base_bias,
        }
    }

    /// Gain and bias take CV in their own units, not as knob travel.
    fn cv_scale(&self, param: Self::Param) -> f32 {
        match param {
            WestcoastParam::Gain => 4.0,
            WestcoastParam::Bias => 2.0,
        }
    }

    fn apply_modulation(&mut self, param: Self::Param, base: f32, modulation: f32) {
        let final_value = base + modulation;
        match param {
            WestcoastParam::Gain => {
                self.base_gain = base;
                self.gain = final_value.clamp(0.0, MAX_GAIN);
            }
            WestcoastParam::Bias => {
                self.base_bias = base;
                self.bias = final_value.clamp(-MAX_BIAS, MAX_BIAS);
            }
        }
    }
}

impl GraphNode for WestcoastNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        if let Some(rate) = self.rate.changed(ctx) {
            // Rejected rates are logged by the folders
            let _ = self.lockhart.set_sample_rate(rate);
            let _ = self.serge.set_sample_rate(rate);
        }

        if !self.config.mode.is_wavefolder() {
            for sample in out.iter_mut() {
                *sample = self.shape(*sample);
            }
            return;
        }

        let (gain, bias) = (self.gain, self.bias);
        if let Some(folder) = self.folder() {
            folder.set_gain(gain);
            folder.set_bias(bias);
            for sample in out.iter_mut() {
                folder.set_in(*sample);
                folder.process();
                *sample = folder.out();
            }
        }
    }

    fn reset(&mut self) {
        self.lockhart.reset();
        self.serge.reset();
    }
}
