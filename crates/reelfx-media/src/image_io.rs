//! Still image reading and lossless writing.

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder};
use reelfx_core::{Frame, FxError, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

/// Lossless containers for still output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    WebP,
    Png,
}

impl ImageFormat {
    /// Choose the container from the output extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("webp") => Ok(Self::WebP),
            Some("png") => Ok(Self::Png),
            other => Err(FxError::UnsupportedFormat(format!(
                "image output must be .webp or .png, got {:?} for {}",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }
}

/// Decode any supported raster into an RGB frame.
pub fn read_image(path: &Path) -> Result<Frame> {
    // Missing files are I/O errors; everything else is a decode failure.
    std::fs::metadata(path)?;
    let img = image::open(path)
        .map_err(|e| FxError::Decode(format!("{}: {}", path.display(), e)))?;
    Ok(Frame::from(img.to_rgb8()))
}

/// Encode `frame` losslessly to `path`; the extension picks the format.
pub fn write_image(frame: &Frame, path: &Path) -> Result<ImageFormat> {
    let format = ImageFormat::from_path(path)?;
    let (width, height) = frame.dimensions();
    let writer = BufWriter::new(File::create(path)?);

    let result = match format {
        ImageFormat::WebP => {
            WebPEncoder::new_lossless(writer).encode(frame.as_raw(), width, height, ExtendedColorType::Rgb8)
        }
        ImageFormat::Png => PngEncoder::new_with_quality(writer, CompressionType::Best, FilterType::Adaptive)
            .write_image(frame.as_raw(), width, height, ExtendedColorType::Rgb8),
    };
    result.map_err(|e| FxError::Encode(format!("{}: {}", path.display(), e)))?;

    info!(path = %path.display(), ?format, width, height, "image written");
    Ok(format)
}
