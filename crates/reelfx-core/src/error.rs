//! Error types for ReelFX.

use thiserror::Error;

/// Main error type for engine operations.
#[derive(Error, Debug)]
pub enum FxError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed resource header (e.g. a LUT without a usable `LUT_3D_SIZE`).
    #[error("Format error: {0}")]
    Format(String),

    /// Malformed resource data (e.g. a non-numeric token in a LUT row).
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Decoder error: {0}")]
    Decode(String),

    /// The external encoder failed. The message carries its diagnostics verbatim.
    #[error("Encoder error: {0}")]
    Encode(String),

    #[error("Unknown effect: {0}")]
    UnknownEffect(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, FxError>;
