//! Block-based nodes built on the DSP units.
//!
//! Graph nodes wrap the per-sample units with what a host needs around them:
//! block rendering, sample-rate tracking from the render context, and
//! knob + CV modulation with the clamping done before values reach the DSP.

/// Diode-ladder VCF with frequency, resonance and saturation knobs.
pub mod diode_vcf;
/// MS-20 style filter with frequency, peak and drive knobs.
pub mod ms20;
/// Core traits shared by all graph nodes.
pub mod node;
/// Mode-switched complex shaper (wavefolders and static curves).
pub mod westcoast;

pub use diode_vcf::{DiodeVcfNode, DiodeVcfParam};
pub use ms20::{Ms20Node, Ms20Param};
pub use node::{GraphNode, Modulatable, RenderCtx};
pub use westcoast::{WestcoastNode, WestcoastParam};
