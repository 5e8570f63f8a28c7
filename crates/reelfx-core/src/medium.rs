//! Description of the media the engine consumes and produces.

use crate::frame::Frame;
use crate::time::FrameRate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The kind of a validated input file, as reported by the file-type
/// validator upstream of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediumKind {
    /// A single still frame.
    Image,
    /// A clip with a fixed frame rate and optional audio.
    Video,
    /// An animated image (GIF) that is processed and written as video.
    Animated,
}

impl MediumKind {
    const IMAGE_EXTENSIONS: &'static [&'static str] = &["jpg", "jpeg", "png", "tiff", "bmp", "webp"];
    const VIDEO_EXTENSIONS: &'static [&'static str] =
        &["mp4", "avi", "flv", "webm", "mov", "mkv", "wmv"];

    /// Guess the kind from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if ext == "gif" {
            Some(Self::Animated)
        } else if Self::IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Image)
        } else if Self::VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Video)
        } else {
            None
        }
    }

    /// Whether this medium goes through the frame-sequence path.
    pub fn is_temporal(self) -> bool {
        matches!(self, Self::Video | Self::Animated)
    }
}

/// Reference to an audio stream that is re-attached untouched at encode time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioTrack {
    /// File containing the audio.
    pub path: PathBuf,
    /// Stream index inside `path`, if it is not the first audio stream.
    pub stream_index: Option<usize>,
}

/// Metadata of a decoded video clip. Frames are streamed separately.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoClip {
    pub source: PathBuf,
    /// [`MediumKind::Video`] or [`MediumKind::Animated`].
    pub kind: MediumKind,
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
    /// Duration in seconds.
    pub duration: f64,
    pub audio: Option<AudioTrack>,
}

/// A decoded medium.
#[derive(Debug, Clone)]
pub enum Medium {
    Image(Frame),
    VideoClip(VideoClip),
}

impl Medium {
    pub fn kind(&self) -> MediumKind {
        match self {
            Self::Image(_) => MediumKind::Image,
            Self::VideoClip(clip) => clip.kind,
        }
    }
}
