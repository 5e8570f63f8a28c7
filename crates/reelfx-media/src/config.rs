//! Engine configuration, loadable from a JSON file.

use reelfx_core::{FxError, Result};
use reelfx_effects::{FrameContext, UnknownEffectPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Settings shared by every invocation of the engine.
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```json
/// { "ffmpeg_path": "/opt/ffmpeg/bin/ffmpeg", "unknown_effects": "reject" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// FFmpeg executable used for decoding and encoding.
    pub ffmpeg_path: PathBuf,
    /// FFprobe executable used to read clip metadata.
    pub ffprobe_path: PathBuf,
    /// `-threads` passed to the video encoder.
    pub encoder_threads: u32,
    /// AAC bitrate of the re-attached audio track.
    pub audio_bitrate_kbps: u32,
    /// Handling of chain entries naming no known effect.
    pub unknown_effects: UnknownEffectPolicy,
    /// Wobble frequency of the rolling shutter effect, in Hz.
    pub rolling_shutter_frequency: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            encoder_threads: 4,
            audio_bitrate_kbps: 192,
            unknown_effects: UnknownEffectPolicy::default(),
            rolling_shutter_frequency: FrameContext::DEFAULT_SHUTTER_FREQUENCY,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| FxError::Parse(format!("engine config: {}", e)))
    }

    /// Read a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = Self::from_json(&std::fs::read_to_string(path)?)?;
        debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }
}
