//! Integration tests for still images: front-end chain entries through
//! the engine to files on disk.

use reelfx_core::{Frame, FxError, MediumKind};
use reelfx_effects::{ChainEntry, EffectChain, UnknownEffectPolicy};
use reelfx_media::{read_image, write_image, ApplyOptions, Engine, EngineConfig};
use std::path::{Path, PathBuf};

// ── Helpers ────────────────────────────────────────────────────

fn write_input(dir: &Path, name: &str, frame: &Frame) -> PathBuf {
    let path = dir.join(name);
    write_image(frame, &path).unwrap();
    path
}

fn entries(json: &str) -> Vec<ChainEntry> {
    serde_json::from_str(json).unwrap()
}

/// 2×2×2 cube swapping red and blue. The mapping is linear, so trilinear
/// interpolation reproduces it exactly at every input.
fn swap_red_blue_cube() -> String {
    let mut text = String::from("TITLE \"swap\"\nLUT_3D_SIZE 2\n");
    for r in 0..2 {
        for g in 0..2 {
            for b in 0..2 {
                text.push_str(&format!("{} {} {}\n", b, g, r));
            }
        }
    }
    text
}

// ── Chains ─────────────────────────────────────────────────────

#[test]
fn low_saturation_on_mid_gray_keeps_size_and_gray() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "gray.png", &Frame::solid(64, 64, [128, 128, 128]));
    let output = dir.path().join("gray.webp");

    let engine = Engine::default();
    let chain = engine
        .chain_from_entries(&entries(r#"[["Color Saturation", "low"]]"#))
        .unwrap();
    engine
        .apply_effects(&input, &chain, &output, &ApplyOptions::default())
        .unwrap();

    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(&bytes[8..12], b"WEBP");

    let result = read_image(&output).unwrap();
    assert_eq!(result.dimensions(), (64, 64));
    assert!(result
        .pixels()
        .all(|px| px.iter().all(|&c| (127..=128).contains(&c)) && px[0] == px[1] && px[1] == px[2]));
}

#[test]
fn lut_from_cube_file_is_exact() {
    let dir = tempfile::tempdir().unwrap();
    let cube = dir.path().join("swap.cube");
    std::fs::write(&cube, swap_red_blue_cube()).unwrap();
    let frame = Frame::test_pattern(32, 16);
    let input = write_input(dir.path(), "in.png", &frame);
    let output = dir.path().join("out.png");

    let json = format!(r#"[["look-up table", {:?}]]"#, cube.to_string_lossy());
    let chain = EffectChain::from_json(&json, UnknownEffectPolicy::Reject).unwrap();
    Engine::default()
        .apply_effects(&input, &chain, &output, &ApplyOptions::default())
        .unwrap();

    let expected = frame.map_pixels(|[r, g, b]| [b, g, r]);
    assert_eq!(read_image(&output).unwrap(), expected);
}

#[test]
fn unknown_and_video_only_effects_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let frame = Frame::test_pattern(24, 24);
    let input = write_input(dir.path(), "in.png", &frame);
    let output = dir.path().join("out.webp");

    let engine = Engine::default();
    let chain = engine
        .chain_from_entries(&entries(
            r#"["Sparkle Dust", "Invert Colors", ["Fade In/Out", "high"], "VHS Look", "Invert Colors"]"#,
        ))
        .unwrap();
    assert_eq!(chain.len(), 4);
    engine
        .apply_effects(&input, &chain, &output, &ApplyOptions::default())
        .unwrap();

    // Two inversions cancel; the fade and VHS look never run on stills.
    assert_eq!(read_image(&output).unwrap(), frame);
}

#[test]
fn reject_policy_fails_before_touching_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::from_json(r#"{"unknown_effects": "reject"}"#).unwrap();
    let engine = Engine::new(config);

    let err = engine
        .chain_from_entries(&entries(r#"["Invert Colors", "Sparkle Dust"]"#))
        .unwrap_err();
    assert!(matches!(err, FxError::UnknownEffect(name) if name == "Sparkle Dust"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn order_of_effects_matters() {
    let dir = tempfile::tempdir().unwrap();
    let frame = Frame::from_fn(40, 30, |x, y| [(x * 6) as u8, (y * 8) as u8, 100]);
    let input = write_input(dir.path(), "in.png", &frame);
    let engine = Engine::default();

    let mut outputs = Vec::new();
    for (i, json) in [
        r#"["Invert Colors", ["Vignette", "high"]]"#,
        r#"[["Vignette", "high"], "Invert Colors"]"#,
    ]
    .into_iter()
    .enumerate()
    {
        let chain = engine.chain_from_entries(&entries(json)).unwrap();
        let output = dir.path().join(format!("out{}.png", i));
        engine
            .apply_effects(&input, &chain, &output, &ApplyOptions::default())
            .unwrap();
        outputs.push(read_image(&output).unwrap());
    }
    assert_ne!(outputs[0], outputs[1]);
    // A strong vignette blacks out the corners; inverting afterwards
    // turns them white.
    assert_eq!(outputs[0].pixel(0, 0), [0, 0, 0]);
    assert_eq!(outputs[1].pixel(0, 0), [255, 255, 255]);
}

#[test]
fn rotate_expands_the_canvas() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "in.png", &Frame::test_pattern(40, 20));
    let output = dir.path().join("out.webp");

    let engine = Engine::default();
    let chain = engine.chain_from_entries(&[ChainEntry::parse_arg("Rotate:high")]).unwrap();
    engine
        .apply_effects(&input, &chain, &output, &ApplyOptions::default())
        .unwrap();

    // A quarter turn swaps the sides.
    assert_eq!(read_image(&output).unwrap().dimensions(), (20, 40));
}

#[test]
fn batch_reports_each_item() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_input(dir.path(), "a.png", &Frame::test_pattern(8, 8));
    let bad = dir.path().join("b.png");
    std::fs::write(&bad, b"not an image").unwrap();

    let engine = Engine::default();
    let chain = engine.chain_from_entries(&entries(r#"["Black & White"]"#)).unwrap();
    let outcomes = engine.apply_effects_batch(
        &[good.clone(), bad.clone()],
        &chain,
        &ApplyOptions::default().with_kind(MediumKind::Image),
        |input| input.with_extension("out.webp"),
    );

    assert!(outcomes[0].is_ok());
    assert!(outcomes[0].output.exists());
    assert!(matches!(outcomes[1].error, Some(FxError::Decode(_))));
    assert_eq!(outcomes[1].output, bad);
}
