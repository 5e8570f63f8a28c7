//! Geometric effects: channel shift, pixelation, rotation, zoom and
//! rolling-shutter wobble.

use image::imageops::{self, FilterType};
use reelfx_core::Frame;

/// Red/blue channel displacement in pixels per level.
pub const CHROMATIC_SHIFTS: [f32; 3] = [3.0, 6.0, 10.0];
/// Width of the downsampled frame per level. Lower is blockier.
pub const PIXEL_WIDTHS: [f32; 3] = [95.0, 85.0, 75.0];
/// Counter-clockwise rotation in degrees per level.
pub const ROTATE_ANGLES: [f32; 3] = [15.0, 45.0, 90.0];
/// Zoom reached at the end of the clip per level.
pub const KEN_BURNS_ZOOM: [f32; 3] = [1.0, 1.25, 1.5];
/// Peak horizontal wobble in pixels per level.
pub const ROLLING_SHUTTER_INTENSITY: [f32; 3] = [5.0, 12.0, 20.0];

/// Shift the red channel `shift` pixels left and the blue channel `shift`
/// pixels right. Columns shifted in from outside the frame are black.
pub fn chromatic_aberration(frame: &Frame, shift: u32) -> Frame {
    let (w, h) = frame.dimensions();
    let s = shift as usize;
    let w = w as usize;
    let mut out = frame.clone();
    for y in 0..h {
        let src = frame.row(y);
        let dst = out.row_mut(y);
        for x in 0..w {
            dst[x * 3] = if x + s < w { src[(x + s) * 3] } else { 0 };
            dst[x * 3 + 2] = if x >= s { src[(x - s) * 3 + 2] } else { 0 };
        }
    }
    out
}

/// Downsample to `target_width` (keeping aspect) with a bilinear filter,
/// then scale back up with nearest-neighbor to get hard blocks.
pub fn pixelate(frame: &Frame, target_width: u32) -> Frame {
    let (w, h) = frame.dimensions();
    if w == 0 || h == 0 {
        return frame.clone();
    }
    let small_w = target_width.max(1);
    let small_h = ((target_width as u64 * h as u64) / w as u64).max(1) as u32;

    let img = frame.clone().into_rgb_image();
    let small = Frame::from(imageops::resize(&img, small_w, small_h, FilterType::Triangle));

    // Nearest-neighbor upscale with an exact integer mapping so blocks
    // line up on the grid of the small frame.
    Frame::from_fn(w, h, |x, y| {
        let sx = (x as u64 * small_w as u64 / w as u64) as u32;
        let sy = (y as u64 * small_h as u64 / h as u64) as u32;
        small.pixel(sx, sy)
    })
}

/// Canvas size that holds a `w×h` frame rotated by `radians`.
fn rotated_bounds(w: u32, h: u32, radians: f64) -> (u32, u32) {
    let (sin, cos) = radians.sin_cos();
    let (sin, cos) = (sin.abs(), cos.abs());
    // Shave float noise so exact right angles do not grow by a pixel.
    let nw = (w as f64 * cos + h as f64 * sin - 1e-6).ceil().max(1.0);
    let nh = (w as f64 * sin + h as f64 * cos - 1e-6).ceil().max(1.0);
    (nw as u32, nh as u32)
}

/// Rotate counter-clockwise by `degrees`, growing the canvas so no corner is
/// cropped. Uncovered areas are black; sampling is nearest-neighbor.
pub fn rotate(frame: &Frame, degrees: f32) -> Frame {
    let (w, h) = frame.dimensions();
    if w == 0 || h == 0 {
        return frame.clone();
    }
    let radians = (degrees as f64).to_radians();
    let (nw, nh) = rotated_bounds(w, h, radians);
    let (sin, cos) = radians.sin_cos();

    let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
    let (ncx, ncy) = (nw as f64 / 2.0, nh as f64 / 2.0);

    let mut out = Frame::new(nw, nh);
    for y in 0..nh {
        let dy = y as f64 + 0.5 - ncy;
        for x in 0..nw {
            let dx = x as f64 + 0.5 - ncx;
            // Inverse mapping of a counter-clockwise turn in y-down coordinates.
            let sx = cx + cos * dx - sin * dy;
            let sy = cy + sin * dx + cos * dy;
            if sx >= 0.0 && sy >= 0.0 && sx < w as f64 && sy < h as f64 {
                out.put_pixel(x, y, frame.pixel(sx as u32, sy as u32));
            }
        }
    }
    out
}

/// Bilinear sample with edge clamping.
fn sample_bilinear(frame: &Frame, x: f64, y: f64) -> [u8; 3] {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let p00 = frame.pixel_clamped(x0, y0);
    let p10 = frame.pixel_clamped(x0 + 1, y0);
    let p01 = frame.pixel_clamped(x0, y0 + 1);
    let p11 = frame.pixel_clamped(x0 + 1, y0 + 1);

    let mut out = [0u8; 3];
    for c in 0..3 {
        let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
        let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Zoom factor of the Ken Burns ramp at `time` in a clip of `duration`.
pub fn ken_burns_zoom(target: f32, time: f64, duration: f64) -> f64 {
    let progress = if duration > 0.0 {
        (time / duration).clamp(0.0, 1.0)
    } else {
        0.0
    };
    1.0 + (target as f64 - 1.0) * progress
}

/// Slow zoom-in: scale the frame by the ramped zoom factor, then crop the
/// center back to the original size.
pub fn ken_burns(frame: &Frame, target: f32, time: f64, duration: f64) -> Frame {
    let zoom = ken_burns_zoom(target, time, duration);
    let (w, h) = frame.dimensions();
    if (zoom - 1.0).abs() < 1e-9 || w < 2 || h < 2 {
        return frame.clone();
    }

    let zw = ((w as f64 * zoom).round() as u32).max(2);
    let zh = ((h as f64 * zoom).round() as u32).max(2);
    let ox = zw.saturating_sub(w) / 2;
    let oy = zh.saturating_sub(h) / 2;
    // Corner-aligned scaling from the zoomed grid back into the source grid.
    let sx = (w - 1) as f64 / (zw - 1) as f64;
    let sy = (h - 1) as f64 / (zh - 1) as f64;

    Frame::from_fn(w, h, |x, y| {
        sample_bilinear(frame, (x + ox) as f64 * sx, (y + oy) as f64 * sy)
    })
}

/// Horizontal shift of row `y` at `time`.
pub fn rolling_shutter_shift(intensity: f32, frequency: f64, time: f64, y: u32, height: u32) -> i64 {
    let phase = frequency * time + y as f64 / height.max(1) as f64;
    (intensity as f64 * (2.0 * std::f64::consts::PI * phase).sin()) as i64
}

/// Per-row sinusoidal horizontal displacement. Source columns are clamped
/// to the frame, so edge pixels smear instead of wrapping.
pub fn rolling_shutter(frame: &Frame, intensity: f32, frequency: f64, time: f64) -> Frame {
    let (w, h) = frame.dimensions();
    let mut out = Frame::new(w, h);
    for y in 0..h {
        let shift = rolling_shutter_shift(intensity, frequency, time, y, h);
        for x in 0..w {
            out.put_pixel(x, y, frame.pixel_clamped(x as i64 + shift, y as i64));
        }
    }
    out
}
