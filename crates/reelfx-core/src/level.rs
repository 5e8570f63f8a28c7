//! Discrete effect intensity and encoder quality knobs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Effect intensity. Every effect maps a level to one entry of a fixed
/// three-point parameter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    #[default]
    Medium,
    High,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Low, Level::Medium, Level::High];

    /// Pick this level's entry from a `[low, medium, high]` table.
    #[inline]
    pub fn pick<T: Copy>(self, table: [T; 3]) -> T {
        match self {
            Self::Low => table[0],
            Self::Medium => table[1],
            Self::High => table[2],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for Level {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoder speed/quality trade-off for video output. Images always encode
/// losslessly and ignore this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderQuality {
    Draft,
    #[default]
    Final,
}

impl FromStr for RenderQuality {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "final" => Ok(Self::Final),
            _ => Err(()),
        }
    }
}
