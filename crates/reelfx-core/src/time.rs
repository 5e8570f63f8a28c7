//! Frame timing.
//!
//! Frame timestamps are kept as rational numbers so that sampling a clip at
//! `i / fps` never drifts, even at NTSC rates like 30000/1001.

use num_rational::Rational64;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Exact clip time in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RationalTime(Rational64);

impl RationalTime {
    /// Microsecond grid used when converting from float seconds.
    const MICROS: i64 = 1_000_000;

    /// `numerator / denominator` seconds.
    #[inline]
    pub fn new(numerator: i64, denominator: i64) -> Self {
        Self(Rational64::new(numerator, denominator))
    }

    /// Start time of frame `index` at `rate`.
    #[inline]
    pub fn from_frames(index: i64, rate: FrameRate) -> Self {
        Self::new(index * rate.denominator as i64, rate.numerator as i64)
    }

    /// Float seconds, rounded to the nearest microsecond.
    pub fn from_seconds_f64(seconds: f64) -> Self {
        Self::new((seconds * Self::MICROS as f64).round() as i64, Self::MICROS)
    }

    #[inline]
    pub fn to_seconds_f64(self) -> f64 {
        *self.0.numer() as f64 / *self.0.denom() as f64
    }

    /// Index of the frame showing at this time (floor).
    #[inline]
    pub fn to_frames(self, rate: FrameRate) -> i64 {
        let frames = self.0 * Rational64::new(rate.numerator as i64, rate.denominator as i64);
        frames.floor().to_integer()
    }
}

impl fmt::Display for RationalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.to_seconds_f64())
    }
}

/// Frame rate as a rational number (e.g., 24000/1001 for 23.976 fps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRate {
    pub numerator: u32,
    pub denominator: u32,
}

impl FrameRate {
    #[inline]
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    #[inline]
    pub fn to_fps_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Parse an FFmpeg rate string such as `"30000/1001"`, `"25/1"` or `"24"`.
    ///
    /// Returns `None` for malformed or zero rates (ffprobe reports `"0/0"`
    /// for streams without a known rate).
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (num, den) = match text.split_once('/') {
            Some((n, d)) => (n.trim().parse::<u32>().ok()?, d.trim().parse::<u32>().ok()?),
            None => {
                let fps: f64 = text.parse().ok()?;
                if !fps.is_finite() || fps <= 0.0 {
                    return None;
                }
                ((fps * 1000.0).round() as u32, 1000)
            }
        };
        if num == 0 || den == 0 {
            return None;
        }
        Some(Self::new(num, den))
    }

    /// Timestamp in seconds of frame `index`.
    #[inline]
    pub fn frame_time(self, index: u64) -> f64 {
        RationalTime::from_frames(index as i64, self).to_seconds_f64()
    }

    /// Number of whole frames that fit in `seconds`.
    pub fn frames_in(self, seconds: f64) -> u64 {
        if !seconds.is_finite() || seconds <= 0.0 {
            return 0;
        }
        RationalTime::from_seconds_f64(seconds).to_frames(self).max(0) as u64
    }

    pub const FPS_23_976: Self = Self::new(24000, 1001);
    pub const FPS_24: Self = Self::new(24, 1);
    pub const FPS_25: Self = Self::new(25, 1);
    pub const FPS_29_97: Self = Self::new(30000, 1001);
    pub const FPS_30: Self = Self::new(30, 1);
    pub const FPS_60: Self = Self::new(60, 1);
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FPS_24
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_round_trip_at_ntsc_rate() {
        let rate = FrameRate::FPS_29_97;
        let t = RationalTime::from_frames(30_000, rate);
        assert_eq!(t, RationalTime::new(1001, 1));
        assert_eq!(t.to_frames(rate), 30_000);
        assert!((FrameRate::FPS_23_976.to_fps_f64() - 23.976).abs() < 0.001);
    }

    #[test]
    fn test_parse_ffprobe_rates() {
        assert_eq!(FrameRate::parse("30000/1001"), Some(FrameRate::FPS_29_97));
        assert_eq!(FrameRate::parse("25/1"), Some(FrameRate::FPS_25));
        assert_eq!(FrameRate::parse("24"), Some(FrameRate::new(24000, 1000)));
        assert_eq!(FrameRate::parse("0/0"), None);
        assert_eq!(FrameRate::parse("abc"), None);
    }

    #[test]
    fn test_frames_in_floors() {
        assert_eq!(FrameRate::FPS_24.frames_in(5.0), 120);
        assert_eq!(FrameRate::FPS_24.frames_in(1.99), 47);
        assert_eq!(FrameRate::FPS_30.frames_in(0.0), 0);
        assert_eq!(FrameRate::FPS_30.frames_in(f64::NAN), 0);
        assert!((FrameRate::FPS_25.frame_time(50) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_frame_rate_display_is_ffmpeg_syntax() {
        assert_eq!(FrameRate::FPS_29_97.to_string(), "30000/1001");
        assert_eq!(RationalTime::new(5, 2).to_string(), "2.500s");
    }
}
