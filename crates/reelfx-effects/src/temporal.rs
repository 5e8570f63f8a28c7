//! Effects that only make sense on clips: opacity fades and playback speed.

use reelfx_core::Frame;

/// Fade ramp length in seconds per level.
pub const FADE_DURATIONS: [f32; 3] = [1.0, 1.5, 2.0];
/// Playback speed multiplier per level.
pub const SPEED_FACTORS: [f32; 3] = [1.25, 1.5, 2.0];

/// Opacity of a fade-in/fade-out with ramps of `fade` seconds at time `t`
/// in a clip of `duration` seconds.
pub fn fade_factor(fade: f32, time: f64, duration: f64) -> f64 {
    let fade = fade as f64;
    if fade <= 0.0 {
        return 1.0;
    }
    let fade_in = (time / fade).clamp(0.0, 1.0);
    let fade_out = ((duration - time) / fade).clamp(0.0, 1.0);
    fade_in * fade_out
}

/// Fade from black at the start and back to black at the end of the clip.
pub fn fade_in_out(frame: &Frame, fade: f32, time: f64, duration: f64) -> Frame {
    let factor = fade_factor(fade, time, duration);
    if factor >= 1.0 {
        return frame.clone();
    }
    let factor = factor as f32;
    frame.map_pixels(|px| px.map(|c| (c as f32 * factor) as u8))
}
