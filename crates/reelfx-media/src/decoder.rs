//! Video decoder using FFmpeg via ffmpeg-sidecar.

use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use ffmpeg_sidecar::iter::FfmpegIterator;
use reelfx_core::{Frame, FxError, Result};
use std::path::Path;
use tracing::{debug, info};

/// Streaming video decoder.
///
/// Spawns FFmpeg as a subprocess writing `rgb24` raw video to stdout and
/// yields the frames in presentation order. This approach works without
/// system FFmpeg development headers.
pub struct VideoDecoder {
    child: FfmpegChild,
    events: FfmpegIterator,
    frames_decoded: u64,
    last_error: Option<String>,
    finished: bool,
}

impl VideoDecoder {
    /// Open a video (or animated image) for decoding.
    pub fn open(ffmpeg: &Path, path: &Path) -> Result<Self> {
        info!("Opening video file: {}", path.display());

        let mut child = FfmpegCommand::new_with_path(ffmpeg)
            .hide_banner()
            .input(path)
            .rawvideo()
            .spawn()
            .map_err(|e| FxError::Decode(format!("failed to spawn {}: {}", ffmpeg.display(), e)))?;
        let events = child
            .iter()
            .map_err(|e| FxError::Decode(format!("failed to read ffmpeg output: {}", e)))?;

        Ok(Self {
            child,
            events,
            frames_decoded: 0,
            last_error: None,
            finished: false,
        })
    }

    /// Number of frames yielded so far.
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    /// Reap the child once output is exhausted and turn a failed exit into
    /// an error.
    fn finish(&mut self) -> Option<Result<Frame>> {
        self.finished = true;
        let status = match self.child.wait() {
            Ok(status) => status,
            Err(e) => return Some(Err(FxError::Decode(format!("ffmpeg wait failed: {}", e)))),
        };
        debug!(frames = self.frames_decoded, %status, "decoder finished");
        if status.success() {
            return None;
        }
        let message = self
            .last_error
            .take()
            .unwrap_or_else(|| format!("ffmpeg exited with {}", status));
        Some(Err(FxError::Decode(message)))
    }
}

impl Iterator for VideoDecoder {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        for event in self.events.by_ref() {
            match event {
                FfmpegEvent::OutputFrame(frame) => {
                    self.frames_decoded += 1;
                    return Some(Frame::from_raw(frame.width, frame.height, frame.data));
                }
                FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, message)
                | FfmpegEvent::Error(message) => {
                    debug!(%message, "ffmpeg reported an error");
                    self.last_error = Some(message);
                }
                _ => {}
            }
        }
        self.finish()
    }
}

impl Drop for VideoDecoder {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_binary_is_decode_error() {
        let clip = PathBuf::from("/tmp/my clips/été.mp4");
        let err = VideoDecoder::open(Path::new("/definitely/not/ffmpeg"), &clip)
            .err()
            .unwrap();
        assert!(matches!(err, FxError::Decode(_)));
    }
}
