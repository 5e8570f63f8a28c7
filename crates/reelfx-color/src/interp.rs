//! Trilinear interpolation over a 3D LUT grid.

use crate::lut::Lut3D;

/// Continuous color mapping built from a [`Lut3D`].
///
/// Grid nodes sit at `i / (N - 1)` on each axis. An input color is located
/// inside its enclosing grid cell and blended from the 8 surrounding nodes,
/// first along red, then green, then blue.
#[derive(Debug, Clone, Copy)]
pub struct TrilinearInterpolator<'a> {
    lut: &'a Lut3D,
}

impl<'a> TrilinearInterpolator<'a> {
    pub fn new(lut: &'a Lut3D) -> Self {
        Self { lut }
    }

    /// Map a normalized color in `[0, 1]³`. Inputs outside the cube are
    /// clamped onto it; the output is clamped to `[0, 1]`.
    pub fn map(&self, rgb: [f32; 3]) -> [f32; 3] {
        let s = self.lut.size();
        if s == 1 {
            return clamp01(self.lut.node(0, 0, 0));
        }
        let n = (s - 1) as f32;

        let mut lo = [0usize; 3];
        let mut frac = [0.0f32; 3];
        for c in 0..3 {
            let coord = rgb[c].clamp(0.0, 1.0) * n;
            let i = (coord as usize).min(s - 2);
            lo[c] = i;
            frac[c] = coord - i as f32;
        }
        let [r0, g0, b0] = lo;
        let [fr, fg, fb] = frac;
        let (r1, g1, b1) = (r0 + 1, g0 + 1, b0 + 1);

        let c000 = self.lut.node(r0, g0, b0);
        let c100 = self.lut.node(r1, g0, b0);
        let c010 = self.lut.node(r0, g1, b0);
        let c110 = self.lut.node(r1, g1, b0);
        let c001 = self.lut.node(r0, g0, b1);
        let c101 = self.lut.node(r1, g0, b1);
        let c011 = self.lut.node(r0, g1, b1);
        let c111 = self.lut.node(r1, g1, b1);

        let mut out = [0.0f32; 3];
        for c in 0..3 {
            let c00 = lerp(c000[c], c100[c], fr);
            let c10 = lerp(c010[c], c110[c], fr);
            let c01 = lerp(c001[c], c101[c], fr);
            let c11 = lerp(c011[c], c111[c], fr);
            let c0 = lerp(c00, c10, fg);
            let c1 = lerp(c01, c11, fg);
            out[c] = lerp(c0, c1, fb);
        }
        clamp01(out)
    }

    /// Map an 8-bit color: normalize, interpolate, clamp and round back.
    #[inline]
    pub fn map_u8(&self, rgb: [u8; 3]) -> [u8; 3] {
        let out = self.map([
            rgb[0] as f32 / 255.0,
            rgb[1] as f32 / 255.0,
            rgb[2] as f32 / 255.0,
        ]);
        [to_u8(out[0]), to_u8(out[1]), to_u8(out[2])]
    }
}

impl Lut3D {
    /// Build the trilinear color mapping for this table.
    pub fn interpolator(&self) -> TrilinearInterpolator<'_> {
        TrilinearInterpolator::new(self)
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

#[inline]
fn clamp01(rgb: [f32; 3]) -> [f32; 3] {
    [
        rgb[0].clamp(0.0, 1.0),
        rgb[1].clamp(0.0, 1.0),
        rgb[2].clamp(0.0, 1.0),
    ]
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}
