//! Frame buffer type for decoded images and video frames in CPU memory.
//!
//! A [`Frame`] is a `width × height` grid of 8-bit RGB triples stored
//! row-major without padding, which is exactly what FFmpeg's `rgb24` raw
//! video format and `image::RgbImage` use, so frames move between the
//! decoder, the effects and the encoder without repacking.

use crate::error::{FxError, Result};
use image::RgbImage;

/// Channels per pixel. Every effect preserves this.
pub const CHANNELS: usize = 3;

/// An RGB8 frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Create a black frame with the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; Self::byte_len(width, height)],
        }
    }

    /// Wrap raw `rgb24` bytes, checking the length against the dimensions.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = Self::byte_len(width, height);
        if data.len() != expected {
            return Err(FxError::InvalidParameter(format!(
                "frame {}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Create a frame filled with a single color.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut frame = Self::new(width, height);
        for px in frame.data.chunks_exact_mut(CHANNELS) {
            px.copy_from_slice(&rgb);
        }
        frame
    }

    /// Build a frame by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 3]) -> Self {
        let mut frame = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                frame.put_pixel(x, y, f(x, y));
            }
        }
        frame
    }

    /// Create a test pattern frame (color bars).
    pub fn test_pattern(width: u32, height: u32) -> Self {
        const BARS: [[u8; 3]; 8] = [
            [255, 255, 255], // White
            [255, 255, 0],   // Yellow
            [0, 255, 255],   // Cyan
            [0, 255, 0],     // Green
            [255, 0, 255],   // Magenta
            [255, 0, 0],     // Red
            [0, 0, 255],     // Blue
            [0, 0, 0],       // Black
        ];
        Self::from_fn(width, height, |x, _| {
            let bar = (x as u64 * 8 / width.max(1) as u64) as usize;
            BARS[bar.min(7)]
        })
    }

    #[inline]
    fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * CHANNELS
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)` of the frame.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// True when both frames have the same width and height.
    #[inline]
    pub fn same_shape(&self, other: &Frame) -> bool {
        self.dimensions() == other.dimensions()
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    /// Read a pixel. Panics if out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = self.offset(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Read a pixel with coordinates clamped to the frame edges.
    #[inline]
    pub fn pixel_clamped(&self, x: i64, y: i64) -> [u8; 3] {
        let x = x.clamp(0, self.width as i64 - 1) as u32;
        let y = y.clamp(0, self.height as i64 - 1) as u32;
        self.pixel(x, y)
    }

    /// Write a pixel. Panics if out of bounds.
    #[inline]
    pub fn put_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let i = self.offset(x, y);
        self.data[i..i + CHANNELS].copy_from_slice(&rgb);
    }

    /// One row of packed RGB bytes.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = self.offset(0, y);
        &self.data[start..start + self.width as usize * CHANNELS]
    }

    /// One mutable row of packed RGB bytes.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = self.offset(0, y);
        let end = start + self.width as usize * CHANNELS;
        &mut self.data[start..end]
    }

    #[inline]
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Iterate over pixels as `&[u8]` slices of length 3.
    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(CHANNELS)
    }

    /// Produce a new frame of the same shape by mapping every pixel.
    pub fn map_pixels(&self, mut f: impl FnMut([u8; 3]) -> [u8; 3]) -> Frame {
        let mut data = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(CHANNELS) {
            data.extend_from_slice(&f([px[0], px[1], px[2]]));
        }
        Frame {
            width: self.width,
            height: self.height,
            data,
        }
    }

    /// Convert into an `image` crate buffer (no copy).
    pub fn into_rgb_image(self) -> RgbImage {
        let (w, h) = (self.width, self.height);
        RgbImage::from_raw(w, h, self.data).unwrap_or_else(|| RgbImage::new(w, h))
    }
}

impl From<RgbImage> for Frame {
    fn from(img: RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }
}

impl From<Frame> for RgbImage {
    fn from(frame: Frame) -> Self {
        frame.into_rgb_image()
    }
}
