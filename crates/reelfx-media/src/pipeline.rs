//! `apply_effects`: decode a medium, run an effect chain over it and write
//! the artifact.

use crate::config::EngineConfig;
use crate::decoder::VideoDecoder;
use crate::export::{check_output_container, ExportJob, VideoEncoder};
use crate::image_io::{read_image, write_image};
use crate::probe::MediaProbe;
use rand::Rng;
use reelfx_core::{AudioTrack, FxError, Medium, MediumKind, RenderQuality, Result, VideoClip};
use reelfx_effects::{
    render_video, ChainEntry, EffectChain, PreparedChain, RenderStats, SequentialSource, Timeline,
};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Per-call options of [`Engine::apply_effects`].
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Encoder trade-off for video; images are always lossless.
    pub quality: RenderQuality,
    /// Replacement audio for video output, already trimmed by the caller.
    pub audio: Option<PathBuf>,
    /// Medium kind from the upstream validator; guessed from the
    /// extension when absent.
    pub kind: Option<MediumKind>,
}

impl ApplyOptions {
    pub fn with_quality(mut self, quality: RenderQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_audio(mut self, audio: impl Into<PathBuf>) -> Self {
        self.audio = Some(audio.into());
        self
    }

    pub fn with_kind(mut self, kind: MediumKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Result of one item of [`Engine::apply_effects_batch`].
#[derive(Debug)]
pub struct BatchOutcome {
    pub input: PathBuf,
    /// The processed artifact, or the untouched input if processing failed.
    pub output: PathBuf,
    pub error: Option<FxError>,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// The effects engine. Holds configuration only; every call is
/// independent, so one engine can serve concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve front-end chain entries with the configured unknown-effect
    /// policy.
    pub fn chain_from_entries(&self, entries: &[ChainEntry]) -> Result<EffectChain> {
        EffectChain::from_entries(entries, self.config.unknown_effects)
    }

    /// Apply `chain` to the medium at `input` and write the result to
    /// `output`, returning the output path.
    pub fn apply_effects(
        &self,
        input: &Path,
        chain: &EffectChain,
        output: &Path,
        options: &ApplyOptions,
    ) -> Result<PathBuf> {
        self.apply_effects_with_rng(input, chain, output, options, &mut rand::rng())
    }

    /// [`apply_effects`](Self::apply_effects) with an explicit random source
    /// for the randomized effects.
    pub fn apply_effects_with_rng<R: Rng>(
        &self,
        input: &Path,
        chain: &EffectChain,
        output: &Path,
        options: &ApplyOptions,
        rng: &mut R,
    ) -> Result<PathBuf> {
        let kind = match options.kind {
            Some(kind) => kind,
            None => MediumKind::from_path(input).ok_or_else(|| {
                FxError::UnsupportedFormat(format!("unrecognized media type: {}", input.display()))
            })?,
        };
        info!(
            input = %input.display(),
            output = %output.display(),
            ?kind,
            effects = chain.len(),
            "applying effects"
        );

        if kind.is_temporal() {
            check_output_container(output)?;
        }
        let prepared = PreparedChain::prepare(chain, kind)?
            .with_shutter_frequency(self.config.rolling_shutter_frequency);

        match self.open(input, kind)? {
            Medium::Image(frame) => {
                let result = prepared.apply_image(&frame, rng);
                write_image(&result, output)?;
            }
            Medium::VideoClip(clip) => {
                let stats = self.render_clip(&clip, &prepared, output, options, rng)?;
                info!(
                    frames = stats.frames,
                    duration = stats.duration,
                    "clip rendered"
                );
            }
        }
        Ok(output.to_path_buf())
    }

    /// Decode a still, or read the metadata of a clip whose frames are
    /// streamed later.
    pub fn open(&self, input: &Path, kind: MediumKind) -> Result<Medium> {
        match kind {
            MediumKind::Image => Ok(Medium::Image(read_image(input)?)),
            MediumKind::Video | MediumKind::Animated => {
                let probe = MediaProbe::probe(&self.config.ffprobe_path, input)?;
                Ok(Medium::VideoClip(probe.video_clip(kind)?))
            }
        }
    }

    fn render_clip<R: Rng>(
        &self,
        clip: &VideoClip,
        chain: &PreparedChain,
        output: &Path,
        options: &ApplyOptions,
        rng: &mut R,
    ) -> Result<RenderStats> {
        let audio = match &options.audio {
            Some(path) => {
                std::fs::metadata(path)?;
                Some(AudioTrack {
                    path: path.clone(),
                    stream_index: None,
                })
            }
            None => clip.audio.clone(),
        };

        let output_duration = Timeline::new(chain, clip.duration).output_duration();
        let job = ExportJob::new(output, clip.frame_rate, options.quality)
            .with_ffmpeg(&self.config.ffmpeg_path)
            .with_audio(audio)
            .with_audio_bitrate(self.config.audio_bitrate_kbps)
            .with_threads(self.config.encoder_threads)
            .with_duration(output_duration);

        let decoder = VideoDecoder::open(&self.config.ffmpeg_path, &clip.source)?;
        let mut source = SequentialSource::new(decoder, clip.frame_rate, clip.duration);
        let mut encoder = VideoEncoder::new(job);
        let stats = render_video(chain, &mut source, &mut encoder, rng)?;
        encoder.finish()?;
        Ok(stats)
    }

    /// Apply the same chain to several inputs independently.
    ///
    /// A failing item does not stop the batch: its outcome keeps the
    /// original input path and carries the error.
    pub fn apply_effects_batch(
        &self,
        inputs: &[PathBuf],
        chain: &EffectChain,
        options: &ApplyOptions,
        output_for: impl Fn(&Path) -> PathBuf,
    ) -> Vec<BatchOutcome> {
        inputs
            .iter()
            .map(|input| {
                let output = output_for(input);
                match self.apply_effects(input, chain, &output, options) {
                    Ok(output) => BatchOutcome {
                        input: input.clone(),
                        output,
                        error: None,
                    },
                    Err(e) => {
                        error!(input = %input.display(), error = %e, "effects failed, keeping original");
                        BatchOutcome {
                            input: input.clone(),
                            output: input.clone(),
                            error: Some(e),
                        }
                    }
                }
            })
            .collect()
    }
}

/// Apply `chain` with the default engine configuration.
pub fn apply_effects(
    input: &Path,
    chain: &EffectChain,
    output: &Path,
    quality: RenderQuality,
) -> Result<PathBuf> {
    Engine::default().apply_effects(input, chain, output, &ApplyOptions::default().with_quality(quality))
}
