//! Construction-time settings for the graph nodes.
//!
//! These replace per-module global flags: a node is built from a config value
//! and the config can be changed later through the node's setters. With the
//! `serde` feature they round-trip through any serde format so a host can
//! store them next to its own preset data.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Which filter output a node writes into its block.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterTap {
    #[default]
    Lowpass,
    Highpass,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiodeVcfConfig {
    /// Run the ladder loop 2× oversampled.
    pub hidef: bool,
    pub tap: FilterTap,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ms20Config {
    pub tap: FilterTap,
}

/// Shaping stage of the complex shaper, in selector order.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WestcoastMode {
    Overdrive,
    #[default]
    Lockhart,
    Serge,
    Saturate,
    Polynom,
    SoftClip,
    HardClip,
}

impl WestcoastMode {
    pub const ALL: [WestcoastMode; 7] = [
        WestcoastMode::Overdrive,
        WestcoastMode::Lockhart,
        WestcoastMode::Serge,
        WestcoastMode::Saturate,
        WestcoastMode::Polynom,
        WestcoastMode::SoftClip,
        WestcoastMode::HardClip,
    ];

    /// Mode for a stepped selector position, counting from 1.
    pub fn from_selector(position: f32) -> Option<Self> {
        let index = position.round() as i64 - 1;
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn name(self) -> &'static str {
        match self {
            WestcoastMode::Overdrive => "overdrive",
            WestcoastMode::Lockhart => "lockhart",
            WestcoastMode::Serge => "serge",
            WestcoastMode::Saturate => "saturate",
            WestcoastMode::Polynom => "polynom",
            WestcoastMode::SoftClip => "softclip",
            WestcoastMode::HardClip => "hardclip",
        }
    }

    pub fn is_wavefolder(self) -> bool {
        matches!(self, WestcoastMode::Lockhart | WestcoastMode::Serge)
    }
}

impl fmt::Display for WestcoastMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown shaper mode `{0}` (expected one of overdrive, lockhart, serge, saturate, polynom, softclip, hardclip)")]
pub struct UnknownMode(pub String);

impl FromStr for WestcoastMode {
    type Err = UnknownMode;

    /// Accepts a mode name or a selector position (`"1"` .. `"7"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', '_'], "");
        let found = match wanted.parse::<u8>() {
            Ok(position) => Self::from_selector(f32::from(position)),
            Err(_) => Self::ALL.into_iter().find(|mode| mode.name() == wanted),
        };
        found.ok_or_else(|| UnknownMode(s.to_string()))
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WestcoastConfig {
    pub mode: WestcoastMode,
}
