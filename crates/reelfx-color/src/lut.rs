//! .cube 3D LUT file parsing.

use crate::error::ColorError;
use std::path::Path;
use tracing::debug;

/// 3D Look-Up Table.
///
/// Data rows are stored in file order and addressed as an `N×N×N` grid whose
/// first axis is red, then green, then blue: the row at file position
/// `(r * N + g) * N + b` holds the output color of grid node `(r, g, b)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lut3D {
    size: usize,
    data: Vec<[f32; 3]>,
}

impl Lut3D {
    /// Largest accepted grid dimension.
    pub const MAX_SIZE: usize = 256;

    /// Build a LUT from grid data directly.
    pub fn from_data(size: usize, data: Vec<[f32; 3]>) -> Result<Self, ColorError> {
        if size == 0 {
            return Err(ColorError::Format("LUT_3D_SIZE must be positive".into()));
        }
        if size > Self::MAX_SIZE {
            return Err(ColorError::Format(format!(
                "LUT_3D_SIZE {} exceeds the maximum of {}",
                size,
                Self::MAX_SIZE
            )));
        }
        let expected = size
            .checked_mul(size)
            .and_then(|s| s.checked_mul(size))
            .ok_or_else(|| ColorError::Format(format!("LUT_3D_SIZE {} is too large", size)))?;
        if data.len() != expected {
            return Err(ColorError::DimensionMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self { size, data })
    }

    /// Read and parse a `.cube` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ColorError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let lut = Self::from_cube(&content)?;
        debug!(path = %path.display(), size = lut.size, "loaded 3D LUT");
        Ok(lut)
    }

    /// Parse the text of a `.cube` file containing a 3D LUT.
    ///
    /// Blank lines and `#` comments are skipped, `LUT_3D_SIZE` sets the grid
    /// dimension and every line made of numeric tokens is a data row. Other
    /// keywords (`TITLE`, `DOMAIN_MIN`, ...) are ignored.
    pub fn from_cube(content: &str) -> Result<Self, ColorError> {
        let mut size = 0usize;
        let mut data = Vec::new();

        for (idx, line) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(rest) = line.strip_prefix("LUT_3D_SIZE") {
                let token = rest.split_whitespace().last().unwrap_or("");
                size = token.parse().map_err(|e| {
                    ColorError::Format(format!("bad LUT_3D_SIZE {:?} on line {}: {}", token, line_no, e))
                })?;
                continue;
            }
            if line.starts_with("LUT_1D_SIZE") {
                return Err(ColorError::Format("expected 3D LUT, got 1D".into()));
            }

            if let Some(row) = parse_row(line, line_no)? {
                data.push(row);
            }
        }

        if size == 0 {
            return Err(ColorError::Format("missing or zero LUT_3D_SIZE".into()));
        }
        if data.is_empty() {
            return Err(ColorError::Format("no data rows".into()));
        }
        Self::from_data(size, data)
    }

    /// Grid dimension `N`.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Stored output color of grid node `(r, g, b)`.
    #[inline]
    pub fn node(&self, r: usize, g: usize, b: usize) -> [f32; 3] {
        self.data[(r * self.size + g) * self.size + b]
    }

    /// Raw data rows in file order.
    pub fn data(&self) -> &[[f32; 3]] {
        &self.data
    }
}

/// A token that can be part of a data row: digits, sign, decimal point and exponent.
fn is_numeric_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E'))
}

/// Parse a data row. Lines that do not start with three numeric-looking
/// tokens are not data rows and yield `None`.
fn parse_row(line: &str, line_no: usize) -> Result<Option<[f32; 3]>, ColorError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 3 || !tokens[..3].iter().all(|t| is_numeric_token(t)) {
        return Ok(None);
    }
    if tokens.len() != 3 {
        return Err(ColorError::Parse {
            line: line_no,
            message: format!("expected 3 values, found {}", tokens.len()),
        });
    }
    let mut row = [0.0f32; 3];
    for (slot, token) in row.iter_mut().zip(&tokens) {
        *slot = token.parse().map_err(|e| ColorError::Parse {
            line: line_no,
            message: format!("{:?}: {}", token, e),
        })?;
    }
    Ok(Some(row))
}
