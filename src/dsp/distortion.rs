//! Memoryless shaping curves.
//!
//! The complex shaper offers these next to its two wavefolders. Every curve
//! takes `sample · drive` as its argument and leaves small signals untouched
//! (slope 1 through the origin), so the drive alone decides how hard a
//! signal hits the knee.
//!
//! ```text
//!   soft_clip   x / (1 + |x|)                   never reaches ±1; Serge fold cell
//!   hard_clip   clamp(x, ±t)                    flat tops
//!   saturate    tanh(x)                         rounded, bounded at ±1
//!   overdrive   1 − e^(−x)          x ≥ 0       negative half gives up earlier,
//!               −0.8 · (1 − e^(1.25x))  x < 0   adding even harmonics
//!   polynom     x − 4x³/27 on ±1.5, ±1 beyond   cubic knee, flat at the clip point
//!   foldback    triangle of period 4t           reflects instead of flattening
//! ```

use super::trig::fast_tanh;

#[inline]
pub fn soft_clip(sample: f32, drive: f32) -> f32 {
    let x = sample * drive;
    x / (1.0 + x.abs())
}

/// Clamp to `±threshold`.
#[inline]
pub fn hard_clip(sample: f32, drive: f32, threshold: f32) -> f32 {
    let t = threshold.abs();
    (sample * drive).clamp(-t, t)
}

/// Reflects the signal back toward zero each time it passes `±threshold`.
/// A zero threshold silences the output.
#[inline]
pub fn foldback(sample: f32, drive: f32, threshold: f32) -> f32 {
    let t = threshold.abs();
    if t == 0.0 {
        return 0.0;
    }

    let x = sample * drive;
    let phase = (x + t).rem_euclid(4.0 * t);
    if phase < 2.0 * t {
        phase - t
    } else {
        3.0 * t - phase
    }
}

/// tanh saturation.
#[inline]
pub fn saturate(sample: f32, drive: f32) -> f32 {
    fast_tanh(sample * drive)
}

/// Asymmetric exponential clipper, bounded to `[-0.8, 1]`.
#[inline]
pub fn overdrive(sample: f32, drive: f32) -> f32 {
    let x = sample * drive;
    if x >= 0.0 {
        1.0 - (-x).exp()
    } else {
        -0.8 * (1.0 - (1.25 * x).exp())
    }
}

/// Cubic soft clipper.
#[inline]
pub fn polynom(sample: f32, drive: f32) -> f32 {
    let x = (sample * drive).clamp(-1.5, 1.5);
    x - 4.0 / 27.0 * x * x * x
}
