//! Effect chain model and the per-frame chain executor.
//!
//! An [`EffectChain`] is the ordered, validated list of effects a caller
//! asked for. Before any pixels are touched it is turned into a
//! [`PreparedChain`] for one medium: level tables are resolved to numbers,
//! LUT files are parsed once, and effects that do not apply to the medium
//! are dropped. The prepared chain is then folded over frames in order,
//! output of one effect feeding the next.

use crate::render::Timeline;
use crate::{apply_kind, EffectKind, EffectsRegistry, FrameContext};
use rand::Rng;
use reelfx_color::Lut3D;
use reelfx_core::{Frame, FxError, Level, MediumKind, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Extra data attached to an effect besides its level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectExtra {
    /// `.cube` file for the look-up table effect.
    LutPath(PathBuf),
    /// Replaces the value the level would pick from the effect's table.
    Value(f32),
}

/// One requested effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSpec {
    pub kind: EffectKind,
    #[serde(default)]
    pub level: Level,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<EffectExtra>,
}

impl EffectSpec {
    pub fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            level: Level::default(),
            extra: None,
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_extra(mut self, extra: EffectExtra) -> Self {
        self.extra = Some(extra);
        self
    }

    /// Look-up table effect reading `path`.
    pub fn lut(path: impl Into<PathBuf>) -> Self {
        Self::new(EffectKind::Lut).with_extra(EffectExtra::LutPath(path.into()))
    }
}

/// Chain element as the front-end sends it: a bare display name or a
/// `(name, level-or-extra)` pair.
///
/// ```json
/// ["Invert Colors", ["Vignette", "high"], ["look-up table", "grade.cube"]]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChainEntry {
    Name(String),
    Pair(String, String),
}

impl ChainEntry {
    /// Parse the command-line form `name` or `name:level-or-path`.
    pub fn parse_arg(arg: &str) -> Self {
        match arg.split_once(':') {
            Some((name, value)) if !value.is_empty() => {
                Self::Pair(name.trim().to_string(), value.trim().to_string())
            }
            _ => Self::Name(arg.trim().trim_end_matches(':').to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Pair(name, _) => name,
        }
    }
}

/// What to do with chain entries that name no registered effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownEffectPolicy {
    /// Log a warning and continue with the rest of the chain.
    #[default]
    Skip,
    /// Fail the whole chain before anything is processed.
    Reject,
}

/// Ordered list of effects. Order is significant and never changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectChain {
    specs: Vec<EffectSpec>,
}

impl EffectChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, spec: EffectSpec) {
        self.specs.push(spec);
    }

    pub fn specs(&self) -> &[EffectSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Resolve front-end entries against the global registry.
    pub fn from_entries(entries: &[ChainEntry], policy: UnknownEffectPolicy) -> Result<Self> {
        let registry = EffectsRegistry::global();
        let mut chain = Self::new();
        for entry in entries {
            let Some(kind) = registry.find(entry.name()) else {
                match policy {
                    UnknownEffectPolicy::Skip => {
                        warn!(effect = entry.name(), "unknown effect, skipping");
                        continue;
                    }
                    UnknownEffectPolicy::Reject => {
                        return Err(FxError::UnknownEffect(entry.name().to_string()));
                    }
                }
            };
            chain.push(match entry {
                ChainEntry::Name(_) => EffectSpec::new(kind),
                ChainEntry::Pair(_, value) => spec_with_value(kind, value),
            });
        }
        Ok(chain)
    }

    /// Parse the JSON chain representation (see [`ChainEntry`]).
    pub fn from_json(json: &str, policy: UnknownEffectPolicy) -> Result<Self> {
        let entries: Vec<ChainEntry> = serde_json::from_str(json)
            .map_err(|e| FxError::Parse(format!("effect chain: {}", e)))?;
        Self::from_entries(&entries, policy)
    }
}

/// Interpret the second half of a pair: a level, a LUT path, or a numeric
/// override. Anything else falls back to the default level.
fn spec_with_value(kind: EffectKind, value: &str) -> EffectSpec {
    let spec = EffectSpec::new(kind);
    if kind == EffectKind::Lut {
        return spec.with_extra(EffectExtra::LutPath(PathBuf::from(value)));
    }
    if let Ok(level) = value.parse::<Level>() {
        return spec.with_level(level);
    }
    if let Ok(v) = value.trim().parse::<f32>() {
        if v.is_finite() {
            return spec.with_extra(EffectExtra::Value(v));
        }
    }
    warn!(effect = kind.name(), value, "unrecognized level, using medium");
    spec
}

impl FromIterator<EffectSpec> for EffectChain {
    fn from_iter<T: IntoIterator<Item = EffectSpec>>(iter: T) -> Self {
        Self {
            specs: iter.into_iter().collect(),
        }
    }
}

/// An effect with its parameter resolved for a specific medium.
#[derive(Debug, Clone)]
pub struct PreparedEffect {
    pub kind: EffectKind,
    pub level: Level,
    /// Numeric parameter picked from the level table or overridden.
    pub param: f32,
    lut: Option<Arc<Lut3D>>,
}

impl PreparedEffect {
    pub fn lut(&self) -> Option<&Lut3D> {
        self.lut.as_deref()
    }

    /// Playback speed multiplier, `1.0` for everything but Speed Control.
    pub fn speed_factor(&self) -> f64 {
        match self.kind {
            EffectKind::SpeedControl if self.param > 0.0 => self.param as f64,
            _ => 1.0,
        }
    }
}

/// A chain ready to run over frames of one medium.
#[derive(Debug, Clone)]
pub struct PreparedChain {
    medium: MediumKind,
    effects: Vec<PreparedEffect>,
    shutter_frequency: f64,
}

impl PreparedChain {
    /// Resolve parameters and load resources for `medium`.
    ///
    /// Every LUT file is read once here, shared between repeated uses in
    /// the chain, and never again per frame. A LUT that cannot be loaded
    /// fails the whole chain.
    pub fn prepare(chain: &EffectChain, medium: MediumKind) -> Result<Self> {
        let mut luts: HashMap<PathBuf, Arc<Lut3D>> = HashMap::new();
        let mut effects = Vec::with_capacity(chain.len());

        for spec in chain.specs() {
            if !spec.kind.supports(medium) {
                warn!(
                    effect = spec.kind.name(),
                    ?medium,
                    "effect not available for this medium, skipping"
                );
                continue;
            }

            let lut = if spec.kind == EffectKind::Lut {
                let Some(EffectExtra::LutPath(path)) = &spec.extra else {
                    return Err(FxError::InvalidParameter(
                        "look-up table effect needs a .cube file path".into(),
                    ));
                };
                let lut = match luts.get(path) {
                    Some(lut) => lut.clone(),
                    None => {
                        let lut = Arc::new(Lut3D::load(path).map_err(|e| {
                            warn!(path = %path.display(), error = %e, "failed to load LUT");
                            FxError::from(e)
                        })?);
                        luts.insert(path.clone(), lut.clone());
                        lut
                    }
                };
                Some(lut)
            } else {
                None
            };

            let param = match &spec.extra {
                Some(EffectExtra::Value(v)) => {
                    let (lo, hi) = spec.kind.param_range();
                    let clamped = v.clamp(lo, hi);
                    if clamped != *v {
                        warn!(effect = spec.kind.name(), value = *v, clamped, "override out of range");
                    }
                    clamped
                }
                _ => spec
                    .kind
                    .params(medium)
                    .map(|table| spec.level.pick(table))
                    .unwrap_or(0.0),
            };
            debug!(effect = spec.kind.name(), level = %spec.level, param, "prepared effect");
            effects.push(PreparedEffect {
                kind: spec.kind,
                level: spec.level,
                param,
                lut,
            });
        }

        Ok(Self {
            medium,
            effects,
            shutter_frequency: FrameContext::DEFAULT_SHUTTER_FREQUENCY,
        })
    }

    /// Override the rolling shutter wobble frequency (Hz).
    pub fn with_shutter_frequency(mut self, hz: f64) -> Self {
        self.shutter_frequency = hz;
        self
    }

    pub fn medium(&self) -> MediumKind {
        self.medium
    }

    pub fn effects(&self) -> &[PreparedEffect] {
        &self.effects
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Fold the chain over a still image.
    pub fn apply_image<R: Rng>(&self, frame: &Frame, rng: &mut R) -> Frame {
        let ctx = FrameContext {
            medium: self.medium,
            shutter_frequency: self.shutter_frequency,
            ..FrameContext::still()
        };
        self.fold(frame, |_| ctx, rng)
    }

    /// Fold the chain over one video frame. `stage_times[i]` is the clip
    /// time effect `i` sees, as computed by [`Timeline::stage_times`].
    pub fn apply_frame<R: Rng>(
        &self,
        frame: &Frame,
        timeline: &Timeline,
        stage_times: &[f64],
        rng: &mut R,
    ) -> Frame {
        self.fold(
            frame,
            |i| FrameContext {
                medium: self.medium,
                time: stage_times.get(i).copied().unwrap_or(0.0),
                duration: timeline.stage_duration(i),
                shutter_frequency: self.shutter_frequency,
            },
            rng,
        )
    }

    fn fold<R: Rng>(&self, frame: &Frame, ctx: impl Fn(usize) -> FrameContext, rng: &mut R) -> Frame {
        let mut current: Option<Frame> = None;
        for (i, effect) in self.effects.iter().enumerate() {
            let input = current.as_ref().unwrap_or(frame);
            let next = apply_kind(effect.kind, input, effect.param, &ctx(i), effect.lut(), rng);
            current = Some(next);
        }
        current.unwrap_or_else(|| frame.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Write;

    fn chain_of(kinds: &[EffectKind]) -> EffectChain {
        kinds.iter().copied().map(EffectSpec::new).collect()
    }

    #[test]
    fn test_order_matters() {
        let frame = Frame::test_pattern(64, 48);
        let mut rng = StdRng::seed_from_u64(0);
        let a = PreparedChain::prepare(&chain_of(&[EffectKind::Invert, EffectKind::Vignette]), MediumKind::Image)
            .unwrap()
            .apply_image(&frame, &mut rng);
        let b = PreparedChain::prepare(&chain_of(&[EffectKind::Vignette, EffectKind::Invert]), MediumKind::Image)
            .unwrap()
            .apply_image(&frame, &mut rng);
        assert_eq!(a.dimensions(), b.dimensions());
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let frame = Frame::test_pattern(16, 16);
        let chain = PreparedChain::prepare(&EffectChain::new(), MediumKind::Image).unwrap();
        assert!(chain.is_empty());
        assert_eq!(chain.apply_image(&frame, &mut StdRng::seed_from_u64(1)), frame);
    }

    #[test]
    fn test_parse_json_chain() {
        let json = r#"["Invert Colors", ["Vignette", "high"], ["look-up table", "grade.cube"], ["Rotate", "30"]]"#;
        let chain = EffectChain::from_json(json, UnknownEffectPolicy::Reject).unwrap();
        assert_eq!(chain.len(), 4);
        assert_eq!(chain.specs()[0], EffectSpec::new(EffectKind::Invert));
        assert_eq!(chain.specs()[1].level, Level::High);
        assert_eq!(
            chain.specs()[2].extra,
            Some(EffectExtra::LutPath(PathBuf::from("grade.cube")))
        );
        assert_eq!(chain.specs()[3].extra, Some(EffectExtra::Value(30.0)));
    }

    #[test]
    fn test_bad_level_defaults_to_medium() {
        let entries = [ChainEntry::Pair("Film Grain".into(), "extreme".into())];
        let chain = EffectChain::from_entries(&entries, UnknownEffectPolicy::Skip).unwrap();
        assert_eq!(chain.specs()[0].level, Level::Medium);
        assert_eq!(chain.specs()[0].extra, None);
    }

    #[test]
    fn test_unknown_effect_policies() {
        let entries = [
            ChainEntry::Name("Invert Colors".into()),
            ChainEntry::Name("Sepia Dream".into()),
            ChainEntry::Pair("glitch".into(), "low".into()),
        ];
        let chain = EffectChain::from_entries(&entries, UnknownEffectPolicy::Skip).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.specs()[1].kind, EffectKind::Glitch);

        let err = EffectChain::from_entries(&entries, UnknownEffectPolicy::Reject).unwrap_err();
        assert!(matches!(err, FxError::UnknownEffect(name) if name == "Sepia Dream"));
    }

    #[test]
    fn test_parse_arg_forms() {
        assert_eq!(ChainEntry::parse_arg("Glitch"), ChainEntry::Name("Glitch".into()));
        assert_eq!(
            ChainEntry::parse_arg("Vignette:high"),
            ChainEntry::Pair("Vignette".into(), "high".into())
        );
        assert_eq!(
            ChainEntry::parse_arg("look-up table:/tmp/a.cube"),
            ChainEntry::Pair("look-up table".into(), "/tmp/a.cube".into())
        );
    }

    #[test]
    fn test_video_only_effects_dropped_for_images() {
        let chain = chain_of(&[EffectKind::FadeInOut, EffectKind::Invert, EffectKind::VhsLook]);
        let image = PreparedChain::prepare(&chain, MediumKind::Image).unwrap();
        assert_eq!(image.effects().len(), 1);
        let video = PreparedChain::prepare(&chain, MediumKind::Video).unwrap();
        assert_eq!(video.effects().len(), 3);
    }

    #[test]
    fn test_params_follow_level_and_override() {
        let chain: EffectChain = [
            EffectSpec::new(EffectKind::ContrastBrightness).with_level(Level::High),
            EffectSpec::new(EffectKind::Pixelate).with_extra(EffectExtra::Value(40.0)),
        ]
        .into_iter()
        .collect();
        let image = PreparedChain::prepare(&chain, MediumKind::Image).unwrap();
        assert_eq!(image.effects()[0].param, 1.8);
        assert_eq!(image.effects()[1].param, 40.0);
        let video = PreparedChain::prepare(&chain, MediumKind::Video).unwrap();
        assert_eq!(video.effects()[0].param, 2.0);
    }

    #[test]
    fn test_extreme_overrides_are_clamped() {
        let entries: Vec<ChainEntry> = [
            "Pixelated Effect:1e9",
            "Cartoon / Painterly:1e9",
            "Speed Control:1e-12",
            "Vignette:-3",
        ]
        .iter()
        .map(|arg| ChainEntry::parse_arg(arg))
        .collect();
        let chain = EffectChain::from_entries(&entries, UnknownEffectPolicy::Reject).unwrap();
        let video = PreparedChain::prepare(&chain, MediumKind::Video).unwrap();
        let effects = video.effects();
        assert_eq!(effects[0].param, 4096.0);
        assert_eq!(effects[1].param, 51.0);
        assert_eq!(effects[2].param, 0.1);
        assert!((effects[2].speed_factor() - 0.1).abs() < 1e-6);
        assert_eq!(effects[3].param, 0.0);
    }

    #[test]
    fn test_lut_without_path_is_rejected() {
        let chain = chain_of(&[EffectKind::Lut]);
        let err = PreparedChain::prepare(&chain, MediumKind::Image).unwrap_err();
        assert!(matches!(err, FxError::InvalidParameter(_)));
    }

    #[test]
    fn test_missing_lut_fails_chain() {
        let chain: EffectChain = [EffectSpec::lut("/no/such/grade.cube")].into_iter().collect();
        let err = PreparedChain::prepare(&chain, MediumKind::Image).unwrap_err();
        assert!(matches!(err, FxError::Io(_)));
    }

    #[test]
    fn test_lut_loaded_once_and_shared() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "LUT_3D_SIZE 2").unwrap();
        for r in 0..2 {
            for g in 0..2 {
                for b in 0..2 {
                    writeln!(file, "{} {} {}", 1 - r, 1 - g, 1 - b).unwrap();
                }
            }
        }
        let chain: EffectChain = [EffectSpec::lut(file.path()), EffectSpec::lut(file.path())]
            .into_iter()
            .collect();
        let prepared = PreparedChain::prepare(&chain, MediumKind::Image).unwrap();
        let (a, b) = (&prepared.effects()[0].lut, &prepared.effects()[1].lut);
        assert!(Arc::ptr_eq(a.as_ref().unwrap(), b.as_ref().unwrap()));

        // An inverting LUT applied twice is the identity on 0/255 values.
        let frame = Frame::test_pattern(16, 2);
        assert_eq!(prepared.apply_image(&frame, &mut StdRng::seed_from_u64(0)), frame);
    }
}
