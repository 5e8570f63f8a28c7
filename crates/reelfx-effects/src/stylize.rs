//! Stylization effects: Sobel edge glow and the median/quantize cartoon look.

use crate::adjust::luma;
use reelfx_core::Frame;
use std::collections::HashMap;

/// Edge threshold on the normalized 0-255 gradient per level.
pub const NEON_THRESHOLDS: [f32; 3] = [80.0, 50.0, 30.0];
/// Median filter window (odd, in pixels) per level.
pub const CARTOON_WINDOWS: [f32; 3] = [5.0, 15.0, 25.0];
/// Palette size of the cartoon quantization.
pub const CARTOON_COLORS: usize = 64;

const NEON_COLOR: [u8; 3] = [0, 255, 255];

/// Gradient magnitude of the luma plane with 3×3 Sobel kernels. Samples
/// outside the frame count as zero.
fn sobel_magnitude(frame: &Frame) -> Vec<f32> {
    let (w, h) = (frame.width() as i64, frame.height() as i64);
    let gray: Vec<f32> = frame.pixels().map(|px| luma([px[0], px[1], px[2]])).collect();
    let at = |x: i64, y: i64| -> f32 {
        if x < 0 || y < 0 || x >= w || y >= h {
            0.0
        } else {
            gray[(y * w + x) as usize]
        }
    };

    let mut mag = Vec::with_capacity(gray.len());
    for y in 0..h {
        for x in 0..w {
            let gx = (at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2.0 * at(x - 1, y) + at(x - 1, y + 1));
            let gy = (at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2.0 * at(x, y - 1) + at(x + 1, y - 1));
            mag.push(gx.hypot(gy));
        }
    }
    mag
}

/// Paint strong edges cyan on black. The gradient is normalized so the
/// strongest edge maps to 255; pixels above `threshold` light up. A frame
/// without any gradient comes out all black.
pub fn neon_glow(frame: &Frame, threshold: f32) -> Frame {
    let (w, h) = frame.dimensions();
    let mag = sobel_magnitude(frame);
    let max = mag.iter().copied().fold(0.0f32, f32::max);

    let mut out = Frame::new(w, h);
    if max <= 0.0 {
        return out;
    }
    for (i, m) in mag.iter().enumerate() {
        if m / max * 255.0 > threshold {
            let x = (i % w as usize) as u32;
            let y = (i / w as usize) as u32;
            out.put_pixel(x, y, NEON_COLOR);
        }
    }
    out
}

/// Median-filter with a `window`-sized square, then reduce to a 64-color
/// palette.
pub fn cartoon(frame: &Frame, window: u32) -> Frame {
    quantize(&median_filter(frame, window), CARTOON_COLORS)
}

/// Per-channel median over a `window × window` square (rounded down to odd)
/// with edge replication.
///
/// Uses a sliding 256-bin histogram per row, moving the median pointer
/// incrementally as columns enter and leave the window.
pub fn median_filter(frame: &Frame, window: u32) -> Frame {
    let (w, h) = frame.dimensions();
    let r = (window / 2) as i64;
    if w == 0 || h == 0 || r == 0 {
        return frame.clone();
    }
    let side = 2 * r + 1;
    let half = (side * side / 2) as u32;

    let mut out = Frame::new(w, h);
    for c in 0..3 {
        let plane: Vec<u8> = frame.pixels().map(|px| px[c]).collect();
        let at = |x: i64, y: i64| -> usize {
            let x = x.clamp(0, w as i64 - 1);
            let y = y.clamp(0, h as i64 - 1);
            plane[(y * w as i64 + x) as usize] as usize
        };

        for y in 0..h as i64 {
            let mut hist = [0u32; 256];
            for dy in -r..=r {
                for dx in -r..=r {
                    hist[at(dx, y + dy)] += 1;
                }
            }
            let mut med = 0usize;
            let mut below = 0u32;

            for x in 0..w as i64 {
                if x > 0 {
                    for dy in -r..=r {
                        let gone = at(x - r - 1, y + dy);
                        hist[gone] -= 1;
                        if gone < med {
                            below -= 1;
                        }
                        let came = at(x + r, y + dy);
                        hist[came] += 1;
                        if came < med {
                            below += 1;
                        }
                    }
                }
                // `below` counts samples under `med`; settle on the
                // smallest value whose cumulative count passes `half`.
                if below > half {
                    while below > half {
                        med -= 1;
                        below -= hist[med];
                    }
                } else {
                    while below + hist[med] <= half {
                        below += hist[med];
                        med += 1;
                    }
                }
                out.row_mut(y as u32)[x as usize * 3 + c] = med as u8;
            }
        }
    }
    out
}

/// Median-cut color quantization without dithering.
///
/// The box with the widest channel range is split at the median of that
/// channel until `colors` boxes exist or no box can be split. Each box
/// contributes its mean color; pixels map to the nearest palette entry.
pub fn quantize(frame: &Frame, colors: usize) -> Frame {
    let mut samples: Vec<[u8; 3]> = frame.pixels().map(|px| [px[0], px[1], px[2]]).collect();
    if samples.is_empty() || colors == 0 {
        return frame.clone();
    }

    let mut boxes: Vec<(usize, usize)> = vec![(0, samples.len())];
    while boxes.len() < colors {
        let widest = boxes
            .iter()
            .enumerate()
            .map(|(i, &(s, e))| {
                let (ch, range) = widest_channel(&samples[s..e]);
                (i, ch, range)
            })
            .filter(|&(_, _, range)| range > 0)
            .max_by_key(|&(_, _, range)| range);
        let Some((i, ch, _)) = widest else {
            break;
        };

        let (s, e) = boxes[i];
        let slice = &mut samples[s..e];
        slice.sort_unstable_by_key(|px| px[ch]);
        let pivot = slice[slice.len() / 2][ch];
        // Cut on a value boundary so equal colors stay in one box.
        let mut cut = slice.partition_point(|px| px[ch] < pivot);
        if cut == 0 {
            cut = slice.partition_point(|px| px[ch] <= pivot);
        }
        boxes[i] = (s, s + cut);
        boxes.push((s + cut, e));
    }

    let palette: Vec<[u8; 3]> = boxes
        .iter()
        .map(|&(s, e)| {
            let n = (e - s) as u64;
            let mut sum = [0u64; 3];
            for px in &samples[s..e] {
                for c in 0..3 {
                    sum[c] += px[c] as u64;
                }
            }
            sum.map(|v| ((v + n / 2) / n) as u8)
        })
        .collect();

    let mut cache: HashMap<[u8; 3], [u8; 3]> = HashMap::new();
    frame.map_pixels(|px| *cache.entry(px).or_insert_with(|| nearest(&palette, px)))
}

fn widest_channel(pixels: &[[u8; 3]]) -> (usize, u8) {
    let mut lo = [u8::MAX; 3];
    let mut hi = [u8::MIN; 3];
    for px in pixels {
        for c in 0..3 {
            lo[c] = lo[c].min(px[c]);
            hi[c] = hi[c].max(px[c]);
        }
    }
    (0..3)
        .map(|c| (c, hi[c].saturating_sub(lo[c])))
        .max_by_key(|&(_, range)| range)
        .unwrap_or((0, 0))
}

fn nearest(palette: &[[u8; 3]], px: [u8; 3]) -> [u8; 3] {
    palette
        .iter()
        .copied()
        .min_by_key(|p| {
            (0..3)
                .map(|c| {
                    let d = p[c] as i32 - px[c] as i32;
                    (d * d) as u32
                })
                .sum::<u32>()
        })
        .unwrap_or(px)
}
