//! Fast trigonometric approximations.
//!
//! Coefficient updates happen once per sample whenever a cutoff is driven by
//! CV, so the frequency warping `tan(π·f/fs)` sits on the audio path. These
//! polynomial and Padé forms keep the error bounded over the ranges the
//! filters actually use without calling into libm.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Highest cutoff, as a fraction of the sample rate, that gets warped.
/// `tan` diverges at 0.5, so the last few percent below Nyquist are clamped.
pub const MAX_CUTOFF_RATIO: f32 = 0.45;

/// Lowest cutoff produced by [`cutoff_from_fraction`].
pub const MIN_CUTOFF_HZ: f32 = 20.0;

/// Number of octaves swept by a normalized cutoff knob.
pub const CUTOFF_OCTAVES: f32 = 10.0;

/// Sine approximation, |error| < 1e-5 for any finite input.
#[inline]
pub fn fast_sin(x: f32) -> f32 {
    // Wrap to [-π, π]
    let mut x = x - TAU * (x / TAU).round();

    // Fold to [-π/2, π/2] using sin(π - x) = sin(x)
    if x > FRAC_PI_2 {
        x = PI - x;
    } else if x < -FRAC_PI_2 {
        x = -PI - x;
    }

    let x2 = x * x;
    x * (1.0
        + x2 * (-1.0 / 6.0
            + x2 * (1.0 / 120.0 + x2 * (-1.0 / 5_040.0 + x2 * (1.0 / 362_880.0)))))
}

#[inline]
pub fn fast_cos(x: f32) -> f32 {
    fast_sin(x + FRAC_PI_2)
}

/// Padé [5/4] tangent. Relative error stays below 2e-4 up to 1.5 rad, which
/// covers every argument [`warp`] can produce.
#[inline]
pub fn fast_tan(x: f32) -> f32 {
    let x2 = x * x;
    x * (945.0 - 105.0 * x2 + x2 * x2) / (945.0 - 420.0 * x2 + 15.0 * x2 * x2)
}

/// Padé [3/2] hyperbolic tangent, hard limited to ±1 past |x| = 3 where the
/// rational form reaches 1. Rounding just below 3 can overshoot, so the
/// result is clamped as well.
#[inline]
pub fn fast_tanh(x: f32) -> f32 {
    if x > 3.0 {
        1.0
    } else if x < -3.0 {
        -1.0
    } else {
        let x2 = x * x;
        (x * (27.0 + x2) / (27.0 + 9.0 * x2)).clamp(-1.0, 1.0)
    }
}

/// Bilinear-transform prewarp: the integrator gain `g = tan(π·fc/fs)` that
/// places the digital cutoff on the analog one.
///
/// `cutoff_hz` is clamped to `[0, MAX_CUTOFF_RATIO · sample_rate]`.
#[inline]
pub fn warp(cutoff_hz: f32, sample_rate: f32) -> f32 {
    let fc = clamp_cutoff(cutoff_hz, sample_rate);
    fast_tan(PI * fc / sample_rate)
}

/// Cutoff actually realised for `cutoff_hz` at `sample_rate`.
#[inline]
pub fn clamp_cutoff(cutoff_hz: f32, sample_rate: f32) -> f32 {
    cutoff_hz.clamp(0.0, MAX_CUTOFF_RATIO * sample_rate)
}

/// Map a normalized knob position to Hz: 20 Hz at 0, ten octaves up at 1.
#[inline]
pub fn cutoff_from_fraction(fraction: f32) -> f32 {
    MIN_CUTOFF_HZ * (CUTOFF_OCTAVES * fraction.clamp(0.0, 1.0)).exp2()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_sin_matches_std() {
        let mut x = -20.0f32;
        while x < 20.0 {
            let err = (fast_sin(x) - x.sin()).abs();
            assert!(err < 1e-5, "sin({}) off by {}", x, err);
            x += 0.013;
        }
    }

    #[test]
    fn test_fast_cos_matches_std() {
        for i in 0..1_000 {
            let x = i as f32 * 0.01 - 5.0;
            assert!((fast_cos(x) - x.cos()).abs() < 1e-5);
        }
    }

    #[test]
    fn test_fast_tan_relative_error() {
        for i in 1..150 {
            let x = i as f32 * 0.01;
            let exact = x.tan();
            let rel = ((fast_tan(x) - exact) / exact).abs();
            assert!(rel < 2e-4, "tan({}) relative error {}", x, rel);
        }
    }

    #[test]
    fn test_fast_tanh_is_bounded_and_odd() {
        for i in -600..600 {
            let x = i as f32 * 0.01;
            let y = fast_tanh(x);
            assert!(y.abs() <= 1.0);
            assert_eq!(y, -fast_tanh(-x));
            assert!((y - x.tanh()).abs() < 0.03);
        }
    }

    #[test]
    fn test_fast_tanh_never_exceeds_one_near_the_knee() {
        // Every f32 in [2.9, 3.0]
        let mut x = 2.9f32;
        while x <= 3.0 {
            assert!(fast_tanh(x) <= 1.0, "fast_tanh({}) = {}", x, fast_tanh(x));
            assert!(fast_tanh(-x) >= -1.0);
            x = f32::from_bits(x.to_bits() + 1);
        }
    }

    #[test]
    fn test_warp_clamps_near_nyquist() {
        let sr = 48_000.0;
        assert_eq!(warp(30_000.0, sr), warp(MAX_CUTOFF_RATIO * sr, sr));
        assert!(warp(MAX_CUTOFF_RATIO * sr, sr).is_finite());
        assert_eq!(warp(0.0, sr), 0.0);
    }

    #[test]
    fn test_cutoff_from_fraction_range() {
        assert!((cutoff_from_fraction(0.0) - 20.0).abs() < 1e-3);
        assert!((cutoff_from_fraction(0.5) - 640.0).abs() < 0.1);
        assert!((cutoff_from_fraction(1.0) - 20_480.0).abs() < 1.0);
        assert_eq!(cutoff_from_fraction(2.0), cutoff_from_fraction(1.0));
    }
}
