//! Integration tests for the frame-sequence path, rendered in memory.

use rand::rngs::StdRng;
use rand::SeedableRng;
use reelfx_core::{Frame, FrameRate, MediumKind, Result};
use reelfx_effects::{
    render_video, EffectChain, FrameSource, PreparedChain, SequentialSource, Timeline,
    UnknownEffectPolicy,
};

const RATE: FrameRate = FrameRate::FPS_24;

// ── Helpers ────────────────────────────────────────────────────

fn clip(seconds: f64, rgb: [u8; 3]) -> SequentialSource<impl Iterator<Item = Result<Frame>>> {
    let frames = (0..RATE.frames_in(seconds)).map(move |_| Ok(Frame::solid(16, 12, rgb)));
    SequentialSource::new(frames, RATE, seconds)
}

fn prepare(json: &str) -> PreparedChain {
    let chain = EffectChain::from_json(json, UnknownEffectPolicy::Reject).unwrap();
    PreparedChain::prepare(&chain, MediumKind::Video).unwrap()
}

fn render(chain: &PreparedChain, source: &mut dyn FrameSource, seed: u64) -> Vec<Frame> {
    let mut frames = Vec::new();
    render_video(chain, source, &mut frames, &mut StdRng::seed_from_u64(seed)).unwrap();
    frames
}

// ── Time-based effects ─────────────────────────────────────────

#[test]
fn fade_is_black_at_edges_and_untouched_mid_clip() {
    let chain = prepare(r#"[["Fade In/Out", "low"]]"#);
    let frames = render(&chain, &mut clip(5.0, [200, 120, 40]), 1);

    assert_eq!(frames.len(), 120);
    assert_eq!(frames[0], Frame::solid(16, 12, [0, 0, 0]));
    // t = 2.5 s is more than the 1 s fade away from either end
    assert_eq!(frames[60], Frame::solid(16, 12, [200, 120, 40]));
    let last = frames[119].pixel(0, 0);
    assert!(last[0] < 10, "last frame should be nearly black: {:?}", last);
}

#[test]
fn speed_control_then_fade_uses_shortened_clip() {
    let chain = prepare(r#"[["Speed Control", "high"], ["Fade In/Out", "low"]]"#);
    let timeline = Timeline::new(&chain, 4.0);
    assert!((timeline.output_duration() - 2.0).abs() < 1e-9);

    let frames = render(&chain, &mut clip(4.0, [255, 255, 255]), 1);
    assert_eq!(frames.len(), 48);
    // Fade of 1 s over a 2 s result: fully bright only at the midpoint.
    assert_eq!(frames[24].pixel(0, 0), [255, 255, 255]);
    assert!(frames[12].pixel(0, 0)[0] < 255);
}

#[test]
fn spatial_effects_apply_to_every_frame() {
    let chain = prepare(r#"["Invert Colors", "Black & White"]"#);
    let frames = render(&chain, &mut clip(1.0, [0, 0, 0]), 1);
    assert_eq!(frames.len(), 24);
    assert!(frames.iter().all(|f| *f == Frame::solid(16, 12, [255, 255, 255])));
}

#[test]
fn randomized_chain_is_reproducible_with_a_seed() {
    let chain = prepare(r#"["VHS Look", ["Film Grain", "high"]]"#);
    let a = render(&chain, &mut clip(0.5, [128, 128, 128]), 42);
    let b = render(&chain, &mut clip(0.5, [128, 128, 128]), 42);
    assert_eq!(a, b);
    // Grain is drawn per frame, not once per clip.
    assert_ne!(a[0], a[1]);
}

#[test]
fn ken_burns_and_rolling_shutter_keep_frame_size() {
    let chain = prepare(r#"[["Ken Burns", "high"], ["Rolling Shutter", "high"]]"#);
    let frames = render(&chain, &mut clip(1.0, [10, 20, 30]), 3);
    assert_eq!(frames.len(), 24);
    assert!(frames.iter().all(|f| f.dimensions() == (16, 12)));
}
