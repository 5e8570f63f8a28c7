//! Randomized effects: film grain, glitch strips and the VHS composite.
//!
//! Every function takes the random source explicitly so callers can seed
//! it. Nothing is carried between calls; each frame gets fresh noise.

use crate::adjust;
use rand::Rng;
use reelfx_core::Frame;

/// Noise amplitude multiplier per level.
pub const FILM_GRAIN_SCALES: [f32; 3] = [1.0, 1.5, 2.0];
/// Chance that a single glitch attempt fires, per level.
pub const GLITCH_PROBABILITIES: [f32; 3] = [0.3, 0.5, 0.7];

/// Base amplitude of the grain before scaling.
const GRAIN_AMPLITUDE: i32 = 25;
/// Upper bound on glitch attempts per call.
const MAX_GLITCH_ATTEMPTS: u32 = 5;
const VHS_SATURATION: f32 = 0.8;
const VHS_BLUE_SHIFT: usize = 2;
const VHS_GLITCH_PROBABILITY: f32 = 0.5;

/// Add independent uniform noise in `[-25, 25] * scale` to every channel of
/// every pixel, clipping to the 8-bit range.
pub fn film_grain(frame: &Frame, scale: f32, rng: &mut impl Rng) -> Frame {
    let mut out = frame.clone();
    for v in out.as_raw_mut() {
        let noise = rng.random_range(-GRAIN_AMPLITUDE..=GRAIN_AMPLITUDE) as f32 * scale;
        *v = (*v as f32 + noise).clamp(0.0, 255.0) as u8;
    }
    out
}

/// Shift one row of packed RGB by `displacement` pixels. Pixels moved in
/// from outside the row are black.
fn shift_row(row: &mut [u8], displacement: i64) {
    let w = (row.len() / 3) as i64;
    if displacement == 0 {
        return;
    }
    let src = row.to_vec();
    for x in 0..w {
        let from = x - displacement;
        let dst = (x * 3) as usize;
        if (0..w).contains(&from) {
            let s = (from * 3) as usize;
            row[dst..dst + 3].copy_from_slice(&src[s..s + 3]);
        } else {
            row[dst..dst + 3].fill(0);
        }
    }
}

/// Make 1 to 5 attempts; each one passing the `probability` check displaces
/// a random strip of about `height / 20` rows by up to a quarter of the
/// frame width in either direction.
pub fn glitch(frame: &Frame, probability: f32, rng: &mut impl Rng) -> Frame {
    let (w, h) = frame.dimensions();
    let mut out = frame.clone();
    if w == 0 || h == 0 {
        return out;
    }

    let strip = (h / 20).max(1);
    let max_shift = (w / 4) as i64;
    let attempts = rng.random_range(1..=MAX_GLITCH_ATTEMPTS);
    for _ in 0..attempts {
        if rng.random::<f32>() >= probability {
            continue;
        }
        let y0 = rng.random_range(0..=h - strip);
        let displacement = rng.random_range(-max_shift..=max_shift);
        for y in y0..y0 + strip {
            shift_row(out.row_mut(y), displacement);
        }
    }
    out
}

/// Composite tape look: slight desaturation, randomly darkened scanlines,
/// blue channel offset, then a glitch pass.
pub fn vhs_look(frame: &Frame, rng: &mut impl Rng) -> Frame {
    let mut out = adjust::saturation(frame, VHS_SATURATION);
    let (w, h) = out.dimensions();
    if w == 0 || h == 0 {
        return out;
    }

    let mut darkened = vec![false; h as usize];
    for _ in 0..h / 20 {
        darkened[rng.random_range(0..h) as usize] = true;
    }
    let w = w as usize;
    for y in 0..h {
        let row = out.row_mut(y);
        if darkened[y as usize] {
            row.iter_mut().for_each(|v| *v /= 2);
        }
        // Blue moves right, the vacated left columns go dark.
        for x in (0..w).rev() {
            row[x * 3 + 2] = if x >= VHS_BLUE_SHIFT {
                row[(x - VHS_BLUE_SHIFT) * 3 + 2]
            } else {
                0
            };
        }
    }

    glitch(&out, VHS_GLITCH_PROBABILITY, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_film_grain_bounded() {
        let frame = Frame::solid(32, 32, [128, 128, 128]);
        let mut rng = StdRng::seed_from_u64(7);
        for scale in FILM_GRAIN_SCALES {
            let out = film_grain(&frame, scale, &mut rng);
            let limit = (25.0 * scale) as i32 + 1;
            assert!(out
                .as_raw()
                .iter()
                .all(|&v| (v as i32 - 128).abs() <= limit));
            assert_ne!(out, frame);
        }
    }

    #[test]
    fn test_film_grain_clips() {
        let frame = Frame::solid(16, 16, [255, 0, 250]);
        let mut rng = StdRng::seed_from_u64(1);
        let out = film_grain(&frame, 2.0, &mut rng);
        assert_eq!(out.dimensions(), (16, 16));
        assert!(out.as_raw().chunks_exact(3).any(|px| px[0] < 255));
    }

    #[test]
    fn test_film_grain_seeded_is_deterministic() {
        let frame = Frame::test_pattern(24, 8);
        let a = film_grain(&frame, 1.5, &mut StdRng::seed_from_u64(42));
        let b = film_grain(&frame, 1.5, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_shift_row_zero_fills() {
        let mut row = vec![1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4];
        shift_row(&mut row, 1);
        assert_eq!(row, vec![0, 0, 0, 1, 1, 1, 2, 2, 2, 3, 3, 3]);
        shift_row(&mut row, -2);
        assert_eq!(row, vec![2, 2, 2, 3, 3, 3, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_glitch_never_fires_at_zero_probability() {
        let frame = Frame::test_pattern(40, 40);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            assert_eq!(glitch(&frame, 0.0, &mut rng), frame);
        }
    }

    #[test]
    fn test_glitch_only_introduces_black() {
        let frame = Frame::solid(40, 40, [255, 255, 255]);
        let mut rng = StdRng::seed_from_u64(11);
        let mut touched = false;
        for _ in 0..20 {
            let out = glitch(&frame, 1.0, &mut rng);
            assert_eq!(out.dimensions(), (40, 40));
            for px in out.pixels() {
                assert!(px == [255, 255, 255] || px == [0, 0, 0]);
            }
            touched |= out != frame;
        }
        assert!(touched);
    }

    #[test]
    fn test_vhs_look_values() {
        let frame = Frame::solid(40, 40, [100, 100, 100]);
        let mut rng = StdRng::seed_from_u64(5);
        let out = vhs_look(&frame, &mut rng);
        assert_eq!(out.dimensions(), (40, 40));
        assert!(out.as_raw().iter().all(|v| [0, 50, 100].contains(v)));
        assert!(out.as_raw().contains(&50));
    }
}
