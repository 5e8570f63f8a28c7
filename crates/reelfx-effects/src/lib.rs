//! ReelFX Effects - per-frame effect catalog and chain executor
//!
//! Provides the closed catalog of visual effects (color, distortion,
//! noise, stylize and time-based effects), the read-only registry that maps
//! display names onto them, and the executor that folds an ordered chain
//! over a still frame or a stream of video frames.

pub mod adjust;
pub mod chain;
pub mod distort;
pub mod lut;
pub mod noise;
pub mod render;
pub mod stylize;
pub mod temporal;

pub use chain::{
    ChainEntry, EffectChain, EffectExtra, EffectSpec, PreparedChain, PreparedEffect,
    UnknownEffectPolicy,
};
pub use render::{render_video, FrameSink, FrameSource, RenderStats, SequentialSource, Timeline};

use reelfx_core::{Frame, MediumKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Every effect the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    Lut,
    Grayscale,
    Saturation,
    ContrastBrightness,
    ChromaticAberration,
    Pixelate,
    Invert,
    FilmGrain,
    Glitch,
    NeonGlow,
    Cartoon,
    Vignette,
    Rotate,
    KenBurns,
    FadeInOut,
    SpeedControl,
    RollingShutter,
    VhsLook,
}

/// Whether an effect depends on time as well as on the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectClass {
    Spatial,
    Temporal,
}

/// Static description of one catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct EffectDescriptor {
    pub kind: EffectKind,
    /// Display name used in effect chains.
    pub name: &'static str,
    pub class: EffectClass,
    /// Only meaningful for clips; skipped in image chains.
    pub video_only: bool,
    /// Draws from the random source on every application.
    pub randomized: bool,
}

impl EffectKind {
    pub const ALL: [EffectKind; 18] = [
        Self::Lut,
        Self::Grayscale,
        Self::Saturation,
        Self::ContrastBrightness,
        Self::ChromaticAberration,
        Self::Pixelate,
        Self::Invert,
        Self::FilmGrain,
        Self::Glitch,
        Self::NeonGlow,
        Self::Cartoon,
        Self::Vignette,
        Self::Rotate,
        Self::KenBurns,
        Self::FadeInOut,
        Self::SpeedControl,
        Self::RollingShutter,
        Self::VhsLook,
    ];

    pub fn descriptor(self) -> EffectDescriptor {
        use EffectClass::{Spatial, Temporal};
        let (name, class, video_only, randomized) = match self {
            Self::Lut => ("look-up table", Spatial, false, false),
            Self::Grayscale => ("Black & White", Spatial, false, false),
            Self::Saturation => ("Color Saturation", Spatial, false, false),
            Self::ContrastBrightness => ("Contrast / Brightness", Spatial, false, false),
            Self::ChromaticAberration => ("Chromatic Aberration", Spatial, false, false),
            Self::Pixelate => ("Pixelated Effect", Spatial, false, false),
            Self::Invert => ("Invert Colors", Spatial, false, false),
            Self::FilmGrain => ("Film Grain", Spatial, false, true),
            Self::Glitch => ("Glitch", Spatial, false, true),
            Self::NeonGlow => ("Neon Glow", Spatial, false, false),
            Self::Cartoon => ("Cartoon / Painterly", Spatial, false, false),
            Self::Vignette => ("Vignette", Spatial, false, false),
            Self::Rotate => ("Rotate", Spatial, false, false),
            Self::KenBurns => ("Ken Burns", Temporal, true, false),
            Self::FadeInOut => ("Fade In/Out", Temporal, true, false),
            Self::SpeedControl => ("Speed Control", Temporal, true, false),
            Self::RollingShutter => ("Rolling Shutter", Temporal, true, false),
            Self::VhsLook => ("VHS Look", Spatial, true, true),
        };
        EffectDescriptor {
            kind: self,
            name,
            class,
            video_only,
            randomized,
        }
    }

    #[inline]
    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    /// `[low, medium, high]` parameter table, if the effect has one.
    pub fn params(self, medium: MediumKind) -> Option<[f32; 3]> {
        match self {
            Self::Saturation => Some(adjust::SATURATION_FACTORS),
            Self::ContrastBrightness => Some(if medium.is_temporal() {
                adjust::VIDEO_CONTRAST_FACTORS
            } else {
                adjust::IMAGE_CONTRAST_FACTORS
            }),
            Self::ChromaticAberration => Some(distort::CHROMATIC_SHIFTS),
            Self::Pixelate => Some(distort::PIXEL_WIDTHS),
            Self::FilmGrain => Some(noise::FILM_GRAIN_SCALES),
            Self::Glitch => Some(noise::GLITCH_PROBABILITIES),
            Self::NeonGlow => Some(stylize::NEON_THRESHOLDS),
            Self::Cartoon => Some(stylize::CARTOON_WINDOWS),
            Self::Vignette => Some(adjust::VIGNETTE_STRENGTHS),
            Self::Rotate => Some(distort::ROTATE_ANGLES),
            Self::KenBurns => Some(distort::KEN_BURNS_ZOOM),
            Self::FadeInOut => Some(temporal::FADE_DURATIONS),
            Self::SpeedControl => Some(temporal::SPEED_FACTORS),
            Self::RollingShutter => Some(distort::ROLLING_SHUTTER_INTENSITY),
            Self::Lut | Self::Grayscale | Self::Invert | Self::VhsLook => None,
        }
    }

    /// Inclusive bounds a numeric override is clamped to before rendering.
    pub fn param_range(self) -> (f32, f32) {
        match self {
            Self::Saturation | Self::ContrastBrightness => (0.0, 10.0),
            Self::ChromaticAberration | Self::RollingShutter => (0.0, 1000.0),
            Self::Pixelate => (1.0, 4096.0),
            Self::FilmGrain => (0.0, 10.0),
            Self::Glitch => (0.0, 1.0),
            Self::NeonGlow => (0.0, 255.0),
            Self::Cartoon => (1.0, 51.0),
            Self::Vignette => (0.0, 5.0),
            Self::Rotate => (-360.0, 360.0),
            Self::KenBurns => (1.0, 10.0),
            Self::FadeInOut => (0.0, 60.0),
            Self::SpeedControl => (0.1, 16.0),
            Self::Lut | Self::Grayscale | Self::Invert | Self::VhsLook => (0.0, 0.0),
        }
    }

    /// Whether the effect may appear in a chain for this medium.
    pub fn supports(self, medium: MediumKind) -> bool {
        medium.is_temporal() || !self.descriptor().video_only
    }
}

/// Per-frame inputs of time-dependent effects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    pub medium: MediumKind,
    /// Elapsed time of this frame in seconds.
    pub time: f64,
    /// Duration of the clip at this point of the chain, in seconds.
    pub duration: f64,
    /// Wobble frequency of the rolling shutter, in Hz.
    pub shutter_frequency: f64,
}

impl FrameContext {
    pub const DEFAULT_SHUTTER_FREQUENCY: f64 = 5.0;

    /// Context for a still image.
    pub fn still() -> Self {
        Self {
            medium: MediumKind::Image,
            time: 0.0,
            duration: 0.0,
            shutter_frequency: Self::DEFAULT_SHUTTER_FREQUENCY,
        }
    }

    /// Context for a video frame at `time` in a clip lasting `duration`.
    pub fn at(time: f64, duration: f64) -> Self {
        Self {
            medium: MediumKind::Video,
            time,
            duration,
            shutter_frequency: Self::DEFAULT_SHUTTER_FREQUENCY,
        }
    }
}

/// Read-only mapping from display names to effects, built once.
pub struct EffectsRegistry {
    by_name: HashMap<&'static str, EffectKind>,
    by_folded_name: HashMap<String, EffectKind>,
}

static REGISTRY: LazyLock<EffectsRegistry> = LazyLock::new(EffectsRegistry::new);

impl EffectsRegistry {
    fn new() -> Self {
        let mut by_name = HashMap::new();
        let mut by_folded_name = HashMap::new();
        for kind in EffectKind::ALL {
            by_name.insert(kind.name(), kind);
            by_folded_name.insert(kind.name().to_lowercase(), kind);
        }
        Self {
            by_name,
            by_folded_name,
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static EffectsRegistry {
        &REGISTRY
    }

    /// Find an effect by display name: exact match first, then case-insensitive.
    pub fn find(&self, name: &str) -> Option<EffectKind> {
        let name = name.trim();
        self.by_name
            .get(name)
            .or_else(|| self.by_folded_name.get(&name.to_lowercase()))
            .copied()
    }

    /// Descriptors of every registered effect, in catalog order.
    pub fn effects(&self) -> impl Iterator<Item = EffectDescriptor> {
        EffectKind::ALL.into_iter().map(EffectKind::descriptor)
    }

    /// Descriptors of the effects usable on `medium`.
    pub fn effects_for(&self, medium: MediumKind) -> impl Iterator<Item = EffectDescriptor> {
        self.effects().filter(move |d| d.kind.supports(medium))
    }
}

/// Apply a single effect to a frame. `param` is the already resolved
/// level parameter (ignored by effects without a table).
pub(crate) fn apply_kind<R: rand::Rng>(
    kind: EffectKind,
    frame: &Frame,
    param: f32,
    ctx: &FrameContext,
    lut: Option<&reelfx_color::Lut3D>,
    rng: &mut R,
) -> Frame {
    match kind {
        EffectKind::Lut => match lut {
            Some(lut) => lut::apply_lut(frame, lut),
            None => frame.clone(),
        },
        EffectKind::Grayscale => adjust::grayscale(frame),
        EffectKind::Saturation => adjust::saturation(frame, param),
        EffectKind::ContrastBrightness => adjust::contrast(frame, param),
        EffectKind::ChromaticAberration => {
            distort::chromatic_aberration(frame, param.max(0.0) as u32)
        }
        EffectKind::Pixelate => distort::pixelate(frame, param.max(1.0) as u32),
        EffectKind::Invert => adjust::invert(frame),
        EffectKind::FilmGrain => noise::film_grain(frame, param, rng),
        EffectKind::Glitch => noise::glitch(frame, param, rng),
        EffectKind::NeonGlow => stylize::neon_glow(frame, param),
        EffectKind::Cartoon => stylize::cartoon(frame, param.max(1.0) as u32),
        EffectKind::Vignette => adjust::vignette(frame, param),
        // Clips turn clockwise, stills counter-clockwise.
        EffectKind::Rotate if ctx.medium.is_temporal() => distort::rotate(frame, -param),
        EffectKind::Rotate => distort::rotate(frame, param),
        EffectKind::KenBurns => distort::ken_burns(frame, param, ctx.time, ctx.duration),
        EffectKind::FadeInOut => temporal::fade_in_out(frame, param, ctx.time, ctx.duration),
        // Time remapping happens in the timeline; frames pass through.
        EffectKind::SpeedControl => frame.clone(),
        EffectKind::RollingShutter => {
            distort::rolling_shutter(frame, param, ctx.shutter_frequency, ctx.time)
        }
        EffectKind::VhsLook => noise::vhs_look(frame, rng),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
