//! Media file probing to get metadata without full decode.

use reelfx_core::{AudioTrack, FrameRate, FxError, MediumKind, Result, VideoClip};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Information about a media file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaProbe {
    /// File path
    pub path: PathBuf,
    /// Duration in seconds
    pub duration: f64,
    /// Video streams
    pub video_streams: Vec<VideoStreamInfo>,
    /// Audio streams
    pub audio_streams: Vec<AudioStreamInfo>,
    /// Container format
    pub format: String,
}

/// Information about a video stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoStreamInfo {
    pub index: usize,
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
    pub pixel_format: String,
    pub duration: Option<f64>,
}

/// Information about an audio stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioStreamInfo {
    pub index: usize,
    pub codec: String,
    pub sample_rate: u32,
    pub channels: u16,
}

// ffprobe `-print_format json` layout. Numbers that ffprobe prints as
// strings stay strings here and are parsed below.

#[derive(Deserialize)]
struct RawProbe {
    #[serde(default)]
    streams: Vec<RawStream>,
    format: Option<RawFormat>,
}

#[derive(Deserialize)]
struct RawStream {
    index: usize,
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    pix_fmt: Option<String>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u16>,
}

#[derive(Deserialize)]
struct RawFormat {
    format_name: Option<String>,
    duration: Option<String>,
}

fn parse_seconds(text: Option<&String>) -> Option<f64> {
    text.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
}

impl MediaProbe {
    /// Probe a media file with the `ffprobe` executable.
    pub fn probe(ffprobe: &Path, path: &Path) -> Result<Self> {
        // Surface missing inputs as I/O errors, not decoder failures.
        std::fs::metadata(path)?;

        let output = Command::new(ffprobe)
            .args(["-v", "error", "-print_format", "json", "-show_streams", "-show_format"])
            .arg(path)
            .output()
            .map_err(|e| FxError::Decode(format!("failed to run {}: {}", ffprobe.display(), e)))?;

        if !output.status.success() {
            return Err(FxError::Decode(format!(
                "ffprobe failed on {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let probe = Self::from_json(path, &String::from_utf8_lossy(&output.stdout))?;
        debug!(
            path = %path.display(),
            duration = probe.duration,
            video = probe.video_streams.len(),
            audio = probe.audio_streams.len(),
            "probed media"
        );
        Ok(probe)
    }

    /// Build a probe result from ffprobe's JSON output.
    pub fn from_json(path: &Path, json: &str) -> Result<Self> {
        let raw: RawProbe = serde_json::from_str(json)
            .map_err(|e| FxError::Decode(format!("unreadable ffprobe output: {}", e)))?;

        let mut video_streams = Vec::new();
        let mut audio_streams = Vec::new();
        for stream in &raw.streams {
            let codec = stream.codec_name.clone().unwrap_or_default();
            match stream.codec_type.as_deref() {
                Some("video") => {
                    let frame_rate = stream
                        .avg_frame_rate
                        .as_deref()
                        .and_then(FrameRate::parse)
                        .or_else(|| stream.r_frame_rate.as_deref().and_then(FrameRate::parse))
                        .unwrap_or_default();
                    video_streams.push(VideoStreamInfo {
                        index: stream.index,
                        codec,
                        width: stream.width.unwrap_or(0),
                        height: stream.height.unwrap_or(0),
                        frame_rate,
                        pixel_format: stream.pix_fmt.clone().unwrap_or_default(),
                        duration: parse_seconds(stream.duration.as_ref()),
                    });
                }
                Some("audio") => audio_streams.push(AudioStreamInfo {
                    index: stream.index,
                    codec,
                    sample_rate: stream
                        .sample_rate
                        .as_deref()
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(0),
                    channels: stream.channels.unwrap_or(0),
                }),
                _ => {}
            }
        }

        let format_duration = raw.format.as_ref().and_then(|f| parse_seconds(f.duration.as_ref()));
        let duration = format_duration
            .or_else(|| video_streams.first().and_then(|v| v.duration))
            .unwrap_or(0.0);

        Ok(Self {
            path: path.to_path_buf(),
            duration,
            video_streams,
            audio_streams,
            format: raw
                .format
                .and_then(|f| f.format_name)
                .unwrap_or_default(),
        })
    }

    /// Check if the file has video.
    pub fn has_video(&self) -> bool {
        !self.video_streams.is_empty()
    }

    /// Check if the file has audio.
    pub fn has_audio(&self) -> bool {
        !self.audio_streams.is_empty()
    }

    /// Get the primary video stream info.
    pub fn primary_video(&self) -> Option<&VideoStreamInfo> {
        self.video_streams.first()
    }

    /// Clip metadata for the frame-sequence path. Animated images never
    /// carry audio; clips keep their first audio stream.
    pub fn video_clip(&self, kind: MediumKind) -> Result<VideoClip> {
        let video = self.primary_video().ok_or_else(|| {
            FxError::Decode(format!("no video stream in {}", self.path.display()))
        })?;
        let audio = (kind == MediumKind::Video && self.has_audio()).then(|| AudioTrack {
            path: self.path.clone(),
            stream_index: None,
        });
        Ok(VideoClip {
            source: self.path.clone(),
            kind,
            width: video.width,
            height: video.height,
            frame_rate: video.frame_rate,
            duration: self.duration,
            audio,
        })
    }
}
