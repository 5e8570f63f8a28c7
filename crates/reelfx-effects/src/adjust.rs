//! Per-pixel color adjustments: grayscale, saturation, contrast, invert
//! and vignette.

use reelfx_core::Frame;

/// Chroma gain per level.
pub const SATURATION_FACTORS: [f32; 3] = [1.3, 1.7, 2.2];
/// Contrast gain per level for still images.
pub const IMAGE_CONTRAST_FACTORS: [f32; 3] = [1.2, 1.5, 1.8];
/// Contrast gain per level for clips (`1 + {0.2, 0.6, 1.0}`).
pub const VIDEO_CONTRAST_FACTORS: [f32; 3] = [1.2, 1.6, 2.0];
/// Vignette falloff strength per level.
pub const VIGNETTE_STRENGTHS: [f32; 3] = [0.5, 1.0, 1.5];

/// Pivot of the contrast adjustment.
pub const MID_GRAY: f32 = 127.0;

/// ITU-R 601 luma of an 8-bit pixel.
#[inline]
pub(crate) fn luma(px: [u8; 3]) -> f32 {
    0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32
}

#[inline]
pub(crate) fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Desaturate completely, keeping three channels.
pub fn grayscale(frame: &Frame) -> Frame {
    frame.map_pixels(|px| {
        let l = to_u8(luma(px));
        [l, l, l]
    })
}

/// Scale each pixel's distance from its own gray level by `factor`.
/// `factor < 1` desaturates, `factor > 1` boosts color.
pub fn saturation(frame: &Frame, factor: f32) -> Frame {
    frame.map_pixels(|px| {
        let gray = luma(px);
        [
            to_u8(gray + factor * (px[0] as f32 - gray)),
            to_u8(gray + factor * (px[1] as f32 - gray)),
            to_u8(gray + factor * (px[2] as f32 - gray)),
        ]
    })
}

/// Scale each channel's deviation from mid-gray by `factor`.
pub fn contrast(frame: &Frame, factor: f32) -> Frame {
    frame.map_pixels(|px| px.map(|c| to_u8(MID_GRAY + factor * (c as f32 - MID_GRAY))))
}

/// `255 - c` on every channel. Its own inverse.
pub fn invert(frame: &Frame) -> Frame {
    frame.map_pixels(|px| px.map(|c| 255 - c))
}

/// Radial darkening: each pixel is scaled by `1 - strength * d²` (floored
/// at zero) where `d` is its distance from the frame center divided by the
/// center-to-corner distance.
pub fn vignette(frame: &Frame, strength: f32) -> Frame {
    let (w, h) = frame.dimensions();
    let cx = w as f32 / 2.0;
    let cy = h as f32 / 2.0;
    let max_dist = (cx * cx + cy * cy).sqrt();
    if max_dist <= 0.0 {
        return frame.clone();
    }

    let mut out = Frame::new(w, h);
    for y in 0..h {
        let dy = y as f32 - cy;
        for x in 0..w {
            let dx = x as f32 - cx;
            let d = (dx * dx + dy * dy).sqrt() / max_dist;
            let mask = (1.0 - strength * d * d).max(0.0);
            let px = frame.pixel(x, y);
            out.put_pixel(x, y, px.map(|c| (c as f32 * mask) as u8));
        }
    }
    out
}
