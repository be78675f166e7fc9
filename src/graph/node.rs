use crate::dsp::effect::Effect;

/// Per-block render information.
///
/// The host rate travels with every block; nodes compare it against their
/// unit's rate and forward changes before processing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderCtx {
    pub sample_rate: f32,
}

impl RenderCtx {
    pub fn new(sample_rate: f32) -> Self {
        Self { sample_rate }
    }
}

impl Default for RenderCtx {
    fn default() -> Self {
        Self::new(crate::DEFAULT_SAMPLE_RATE)
    }
}

/// Knob + CV parameter access.
///
/// `base` is the knob position, `modulation` the already scaled CV. The sum is
/// clamped to the parameter's range here, before it reaches the DSP unit.
pub trait Modulatable: Send {
    type Param: Copy + Send;

    fn get_param(&self, param: Self::Param) -> f32;

    fn apply_modulation(&mut self, param: Self::Param, base: f32, modulation: f32);

    /// Knob travel per volt of CV at full attenuverter. A 10 V swing covers
    /// the whole knob by default.
    fn cv_scale(&self, _param: Self::Param) -> f32 {
        0.1
    }

    /// Apply a raw CV voltage through a bipolar attenuverter in `[-1, 1]`.
    fn apply_cv(&mut self, param: Self::Param, knob: f32, voltage: f32, attenuverter: f32) {
        let modulation = scaled_cv(voltage, attenuverter, self.cv_scale(param));
        self.apply_modulation(param, knob, modulation);
    }
}

/// A block processor.
///
/// `render_block` processes `out` in place: the input block is read and
/// replaced by the node's output.
pub trait GraphNode: Send {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx);

    /// Clear all audio state, keeping parameters.
    fn reset(&mut self) {}
}

/// Lets an engine be picked at run time, e.g. from a command line.
impl GraphNode for Box<dyn GraphNode> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        (**self).render_block(out, ctx)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Remembers the last host rate a node was handed, so a rate change (valid
/// or not) is forwarded to the units once instead of on every block.
///
/// Compared bit for bit: a NaN rate repeated across blocks counts as
/// unchanged.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RateTracker {
    seen: u32,
}

impl RateTracker {
    pub(crate) fn new(sample_rate: f32) -> Self {
        Self {
            seen: sample_rate.to_bits(),
        }
    }

    /// The context rate, if it differs from the one seen on the last block.
    #[inline]
    pub(crate) fn changed(&mut self, ctx: &RenderCtx) -> Option<f32> {
        let bits = ctx.sample_rate.to_bits();
        if bits == self.seen {
            return None;
        }
        self.seen = bits;
        Some(ctx.sample_rate)
    }

    /// Forward a changed host rate to `effect`. Invalid rates are rejected
    /// (and logged) by the effect, which keeps its previous coefficients.
    #[inline]
    pub(crate) fn follow<E: Effect + ?Sized>(&mut self, effect: &mut E, ctx: &RenderCtx) {
        if let Some(rate) = self.changed(ctx) {
            let _ = effect.set_sample_rate(rate);
        }
    }
}

/// `x²` with the sign of `x`. Fine control near the center of a bipolar
/// attenuverter.
#[inline]
pub fn quadratic_bipolar(x: f32) -> f32 {
    x * x.abs()
}

/// `x⁴` with the sign of `x`.
#[inline]
pub fn quartic_bipolar(x: f32) -> f32 {
    let x2 = x * x;
    (x2 * x2).copysign(x)
}

/// CV contribution of `voltage` through a bipolar attenuverter in `[-1, 1]`.
#[inline]
pub fn scaled_cv(voltage: f32, attenuverter: f32, scale: f32) -> f32 {
    voltage * quadratic_bipolar(attenuverter) * scale
}
