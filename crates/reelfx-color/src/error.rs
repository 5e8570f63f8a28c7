//! Color subsystem errors.

use reelfx_core::FxError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ColorError {
    /// Header problems: missing or zero `LUT_3D_SIZE`, no data rows, wrong LUT kind.
    #[error("invalid LUT format: {0}")]
    Format(String),
    /// A data row or header value that does not parse as a number.
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("dimension mismatch: expected {expected} data rows, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ColorError> for FxError {
    fn from(err: ColorError) -> Self {
        match err {
            ColorError::Io(e) => FxError::Io(e),
            e @ ColorError::Parse { .. } => FxError::Parse(e.to_string()),
            e => FxError::Format(e.to_string()),
        }
    }
}
