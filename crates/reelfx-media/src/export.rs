//! Video encoding: rendered frames are piped into an FFmpeg process as raw
//! `rgb24` and muxed with the original or a replacement audio track.

use reelfx_core::{AudioTrack, Frame, FrameRate, FxError, RenderQuality, Result};
use reelfx_effects::FrameSink;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

/// x264 speed/quality pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderPreset {
    pub preset: &'static str,
    pub crf: u8,
}

impl From<RenderQuality> for EncoderPreset {
    fn from(quality: RenderQuality) -> Self {
        match quality {
            RenderQuality::Draft => Self {
                preset: "ultrafast",
                crf: 28,
            },
            RenderQuality::Final => Self {
                preset: "slow",
                crf: 18,
            },
        }
    }
}

/// Containers the H.264/AAC encoder settings can be muxed into.
pub const OUTPUT_CONTAINERS: &[&str] = &["mp4", "mov", "m4v"];

/// Reject an output path whose extension names a container other than
/// [`OUTPUT_CONTAINERS`].
pub fn check_output_container(path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext {
        Some(ext) if OUTPUT_CONTAINERS.contains(&ext.as_str()) => Ok(()),
        _ => Err(FxError::UnsupportedFormat(format!(
            "video output must be one of {}: {}",
            OUTPUT_CONTAINERS.join(", "),
            path.display()
        ))),
    }
}

/// Everything FFmpeg needs to write one H.264/AAC artifact.
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// FFmpeg executable.
    pub ffmpeg: PathBuf,
    /// Output file path.
    pub output_path: PathBuf,
    pub frame_rate: FrameRate,
    pub preset: EncoderPreset,
    /// Audio to mux in untouched apart from the AAC re-encode.
    pub audio: Option<AudioTrack>,
    /// Audio bitrate in kbps.
    pub audio_bitrate: u32,
    pub threads: u32,
    /// Cap on the output duration in seconds, so a longer audio track
    /// does not extend the clip.
    pub duration: Option<f64>,
}

impl ExportJob {
    /// Create a new export job with default encoder settings.
    pub fn new(output_path: impl Into<PathBuf>, frame_rate: FrameRate, quality: RenderQuality) -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            output_path: output_path.into(),
            frame_rate,
            preset: quality.into(),
            audio: None,
            audio_bitrate: 192,
            threads: 4,
            duration: None,
        }
    }

    pub fn with_ffmpeg(mut self, ffmpeg: impl Into<PathBuf>) -> Self {
        self.ffmpeg = ffmpeg.into();
        self
    }

    pub fn with_audio(mut self, audio: Option<AudioTrack>) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_audio_bitrate(mut self, kbps: u32) -> Self {
        self.audio_bitrate = kbps;
        self
    }

    pub fn with_threads(mut self, threads: u32) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Build the FFmpeg command arguments for frames of `width × height`.
    pub fn ffmpeg_args(&self, width: u32, height: u32) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();

        // Input from pipe (raw frames)
        args.extend_from_slice(&[
            "-y".into(),
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-f".into(),
            "rawvideo".into(),
            "-pixel_format".into(),
            "rgb24".into(),
            "-video_size".into(),
            format!("{}x{}", width, height),
            "-framerate".into(),
            self.frame_rate.to_string(),
            "-i".into(),
            "pipe:0".into(),
        ]);

        if let Some(audio) = &self.audio {
            args.extend_from_slice(&[
                "-i".into(),
                audio.path.to_string_lossy().into_owned(),
                "-map".into(),
                "0:v:0".into(),
                "-map".into(),
                // Trailing `?`: a source without audio is not an error.
                format!("1:a:{}?", audio.stream_index.unwrap_or(0)),
            ]);
        }

        // yuv420p needs even dimensions; rotated frames may be odd.
        args.extend_from_slice(&[
            "-vf".into(),
            "pad=ceil(iw/2)*2:ceil(ih/2)*2".into(),
            "-c:v".into(),
            "libx264".into(),
            "-preset".into(),
            self.preset.preset.into(),
            "-crf".into(),
            self.preset.crf.to_string(),
            "-pix_fmt".into(),
            "yuv420p".into(),
        ]);

        if self.audio.is_some() {
            args.extend_from_slice(&[
                "-c:a".into(),
                "aac".into(),
                "-b:a".into(),
                format!("{}k", self.audio_bitrate),
            ]);
        }

        if let Some(duration) = self.duration.filter(|d| *d > 0.0) {
            args.extend_from_slice(&["-t".into(), format!("{:.6}", duration)]);
        }

        args.extend_from_slice(&[
            "-movflags".into(),
            "+faststart".into(),
            "-threads".into(),
            self.threads.to_string(),
        ]);

        // Output
        args.push(self.output_path.to_string_lossy().into_owned());

        args
    }
}

/// [`FrameSink`] that feeds an FFmpeg encoder.
///
/// The process starts with the first frame, since the chain decides the
/// output size. All frames must share that size. Call [`finish`] to wait
/// for the encoder; dropping an unfinished encoder kills it.
///
/// [`finish`]: VideoEncoder::finish
pub struct VideoEncoder {
    job: ExportJob,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<String>>,
    frame_size: Option<(u32, u32)>,
    frames_written: u64,
}

impl VideoEncoder {
    pub fn new(job: ExportJob) -> Self {
        Self {
            job,
            child: None,
            stdin: None,
            stderr: None,
            frame_size: None,
            frames_written: 0,
        }
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    fn spawn(&mut self, width: u32, height: u32) -> Result<()> {
        let args = self.job.ffmpeg_args(width, height);
        debug!(ffmpeg = %self.job.ffmpeg.display(), ?args, "spawning encoder");

        let mut child = Command::new(&self.job.ffmpeg)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| FxError::Encode(format!("Failed to spawn ffmpeg: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| FxError::Encode("Failed to open ffmpeg stdin".into()))?;

        // Drain stderr concurrently so a chatty encoder never blocks on a
        // full pipe while we are writing frames.
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut text = String::new();
                let _ = pipe.read_to_string(&mut text);
                text
            })
        });

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr = stderr;
        self.frame_size = Some((width, height));
        Ok(())
    }

    /// Close the input, wait for FFmpeg and collect its diagnostics.
    fn wait(&mut self) -> Result<(std::process::ExitStatus, String)> {
        drop(self.stdin.take());
        let status = match self.child.take() {
            Some(mut child) => child
                .wait()
                .map_err(|e| FxError::Encode(format!("Failed to wait for ffmpeg: {e}")))?,
            None => return Err(FxError::Encode("encoder was never started".into())),
        };
        let stderr = self
            .stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        Ok((status, stderr))
    }

    /// Wait for the encoder to exit. A non-zero exit is an
    /// [`FxError::Encode`] carrying FFmpeg's stderr verbatim.
    pub fn finish(mut self) -> Result<u64> {
        if self.child.is_none() {
            return Err(FxError::Encode("no frames to encode".into()));
        }
        let (status, stderr) = self.wait()?;
        if !status.success() {
            return Err(FxError::Encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        info!(
            output = %self.job.output_path.display(),
            frames = self.frames_written,
            "video written"
        );
        Ok(self.frames_written)
    }
}

impl FrameSink for VideoEncoder {
    fn write_frame(&mut self, frame: Frame) -> Result<()> {
        let (width, height) = frame.dimensions();
        match self.frame_size {
            None => self.spawn(width, height)?,
            Some(size) if size != (width, height) => {
                return Err(FxError::InvalidParameter(format!(
                    "frame size changed mid-stream from {}x{} to {}x{}",
                    size.0, size.1, width, height
                )));
            }
            Some(_) => {}
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(FxError::Encode("encoder input already closed".into()));
        };
        if let Err(e) = stdin.write_all(frame.as_raw()) {
            // The encoder died; its stderr says why.
            let detail = match self.wait() {
                Ok((_, stderr)) => stderr,
                Err(_) => String::new(),
            };
            return Err(FxError::Encode(format!(
                "Failed to write frame: {e}: {}",
                detail.trim()
            )));
        }
        self.frames_written += 1;
        Ok(())
    }
}

impl Drop for VideoEncoder {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            warn!("encoder dropped before finish, killing ffmpeg");
            drop(self.stdin.take());
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(quality: RenderQuality) -> ExportJob {
        ExportJob::new("/tmp/out.mp4", FrameRate::FPS_29_97, quality)
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_presets() {
        assert_eq!(
            EncoderPreset::from(RenderQuality::Draft),
            EncoderPreset {
                preset: "ultrafast",
                crf: 28
            }
        );
        assert_eq!(EncoderPreset::from(RenderQuality::Final).crf, 18);
    }

    #[test]
    fn test_ffmpeg_args_video_only() {
        let args = job(RenderQuality::Final).ffmpeg_args(640, 360);
        assert_eq!(value_after(&args, "-video_size"), Some("640x360"));
        assert_eq!(value_after(&args, "-framerate"), Some("30000/1001"));
        assert_eq!(value_after(&args, "-pixel_format"), Some("rgb24"));
        assert_eq!(value_after(&args, "-c:v"), Some("libx264"));
        assert_eq!(value_after(&args, "-preset"), Some("slow"));
        assert_eq!(value_after(&args, "-crf"), Some("18"));
        assert_eq!(value_after(&args, "-pix_fmt"), Some("yuv420p"));
        assert_eq!(value_after(&args, "-movflags"), Some("+faststart"));
        assert_eq!(value_after(&args, "-threads"), Some("4"));
        assert!(!args.contains(&"-c:a".to_string()));
        assert!(!args.contains(&"-t".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("/tmp/out.mp4"));
    }

    #[test]
    fn test_ffmpeg_args_with_audio_and_cap() {
        let audio = AudioTrack {
            path: PathBuf::from("/media/song.m4a"),
            stream_index: None,
        };
        let args = job(RenderQuality::Draft)
            .with_audio(Some(audio))
            .with_audio_bitrate(128)
            .with_duration(2.5)
            .ffmpeg_args(100, 100);
        assert_eq!(value_after(&args, "-preset"), Some("ultrafast"));
        assert_eq!(value_after(&args, "-crf"), Some("28"));
        assert_eq!(value_after(&args, "-c:a"), Some("aac"));
        assert_eq!(value_after(&args, "-b:a"), Some("128k"));
        assert_eq!(value_after(&args, "-t"), Some("2.500000"));
        assert!(args.contains(&"/media/song.m4a".to_string()));
        assert!(args.contains(&"1:a:0?".to_string()));
    }

    #[test]
    fn test_output_container_check() {
        assert!(check_output_container(Path::new("out.mp4")).is_ok());
        assert!(check_output_container(Path::new("clip.MOV")).is_ok());
        assert!(check_output_container(Path::new("a.m4v")).is_ok());
        for bad in ["talk.webm", "clip.avi", "noext"] {
            assert!(matches!(
                check_output_container(Path::new(bad)),
                Err(FxError::UnsupportedFormat(_))
            ));
        }
    }

    #[test]
    fn test_finish_without_frames_fails() {
        let encoder = VideoEncoder::new(job(RenderQuality::Draft));
        assert!(matches!(encoder.finish(), Err(FxError::Encode(_))));
    }

    #[test]
    fn test_missing_encoder_binary_is_encode_error() {
        let mut encoder = VideoEncoder::new(
            job(RenderQuality::Draft).with_ffmpeg("/definitely/not/ffmpeg"),
        );
        let err = encoder.write_frame(Frame::new(4, 4)).unwrap_err();
        assert!(matches!(err, FxError::Encode(_)));
    }
}
