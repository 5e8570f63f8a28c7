//! Integration test crate for ReelFX.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on every reelfx crate to verify they work together.

#[cfg(test)]
mod image_chain;

#[cfg(test)]
mod video_chain;

#[cfg(test)]
mod ffmpeg;
