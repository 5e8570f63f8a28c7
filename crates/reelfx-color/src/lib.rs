//! ReelFX Color - 3D LUT support
//!
//! [`Lut3D`] parses the `.cube` subset used for color grading and
//! [`TrilinearInterpolator`] turns the parsed grid into a continuous
//! color mapping over `[0, 1]³`.

pub mod error;
pub mod interp;
pub mod lut;

pub use error::ColorError;
pub use interp::TrilinearInterpolator;
pub use lut::Lut3D;
