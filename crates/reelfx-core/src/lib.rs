//! ReelFX Core - Foundation types for the effects engine
//!
//! This crate provides the fundamental types shared by every ReelFX crate:
//! - RGB8 frames (`Frame`)
//! - Media description (`Medium`, `MediumKind`, `VideoClip`)
//! - Time representation (`RationalTime`, `FrameRate`)
//! - Effect intensity and render quality knobs (`Level`, `RenderQuality`)
//! - The engine-wide error taxonomy

pub mod error;
pub mod frame;
pub mod level;
pub mod medium;
pub mod time;

pub use error::{FxError, Result};
pub use frame::{Frame, CHANNELS};
pub use level::{Level, RenderQuality};
pub use medium::{AudioTrack, Medium, MediumKind, VideoClip};
pub use time::{FrameRate, RationalTime};
