//! End-to-end video tests. They need `ffmpeg` and `ffprobe` on PATH and
//! return early without them.

use reelfx_core::{FxError, RenderQuality};
use reelfx_media::{ApplyOptions, Engine, MediaProbe};
use std::path::{Path, PathBuf};
use std::process::Command;

fn ffmpeg_tools() -> Option<(PathBuf, PathBuf)> {
    match (which::which("ffmpeg"), which::which("ffprobe")) {
        (Ok(ffmpeg), Ok(ffprobe)) => Some((ffmpeg, ffprobe)),
        _ => {
            eprintln!("ffmpeg/ffprobe not found, skipping");
            None
        }
    }
}

/// Two seconds of the lavfi test source, with a sine tone when `audio`.
fn make_clip(ffmpeg: &Path, path: &Path, audio: bool) {
    let mut cmd = Command::new(ffmpeg);
    cmd.args(["-y", "-v", "error", "-f", "lavfi", "-i", "testsrc=size=64x48:rate=10"]);
    if audio {
        cmd.args(["-f", "lavfi", "-i", "sine=frequency=440:sample_rate=44100"]);
    }
    cmd.args(["-t", "2", "-pix_fmt", "yuv420p", "-c:v", "libx264"]);
    if audio {
        cmd.args(["-c:a", "aac"]);
    }
    let status = cmd.arg(path).status().unwrap();
    assert!(status.success(), "failed to create test clip");
}

fn engine(ffmpeg: PathBuf, ffprobe: PathBuf) -> Engine {
    let mut config = reelfx_media::EngineConfig::default();
    config.ffmpeg_path = ffmpeg;
    config.ffprobe_path = ffprobe;
    Engine::new(config)
}

#[test]
fn speed_control_halves_clip_and_keeps_audio() {
    let Some((ffmpeg, ffprobe)) = ffmpeg_tools() else {
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.mp4");
    let output = dir.path().join("out.mp4");
    make_clip(&ffmpeg, &input, true);

    let engine = engine(ffmpeg, ffprobe.clone());
    let chain = engine
        .chain_from_entries(&[
            reelfx_effects::ChainEntry::parse_arg("Black & White"),
            reelfx_effects::ChainEntry::parse_arg("Speed Control:high"),
        ])
        .unwrap();
    let options = ApplyOptions::default().with_quality(RenderQuality::Draft);
    engine.apply_effects(&input, &chain, &output, &options).unwrap();

    let probe = MediaProbe::probe(&ffprobe, &output).unwrap();
    let video = probe.primary_video().unwrap();
    assert_eq!((video.width, video.height), (64, 48));
    assert!(probe.has_audio());
    assert!((probe.duration - 1.0).abs() < 0.15, "duration {}", probe.duration);
}

#[test]
fn odd_sized_rotation_still_encodes() {
    let Some((ffmpeg, ffprobe)) = ffmpeg_tools() else {
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.mp4");
    let output = dir.path().join("out.mp4");
    make_clip(&ffmpeg, &input, false);

    let engine = engine(ffmpeg, ffprobe.clone());
    let chain = engine
        .chain_from_entries(&[reelfx_effects::ChainEntry::parse_arg("Rotate:low")])
        .unwrap();
    engine
        .apply_effects(&input, &chain, &output, &ApplyOptions::default())
        .unwrap();

    let probe = MediaProbe::probe(&ffprobe, &output).unwrap();
    assert!(!probe.has_audio());
    let video = probe.primary_video().unwrap();
    assert_eq!(video.width % 2, 0);
    assert_eq!(video.height % 2, 0);
    assert!(video.width > 64);
}

#[test]
fn corrupt_clip_is_an_error() {
    let Some((ffmpeg, ffprobe)) = ffmpeg_tools() else {
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.mp4");
    std::fs::write(&input, b"this is not a video").unwrap();

    let engine = engine(ffmpeg, ffprobe);
    let err = engine
        .apply_effects(
            &input,
            &reelfx_effects::EffectChain::new(),
            &dir.path().join("out.mp4"),
            &ApplyOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(err, FxError::Decode(_)));
}
