//! ReelFX Media - FFmpeg integration and the effects pipeline
//!
//! This crate handles:
//! - Still image decoding and lossless encoding
//! - Media file probing
//! - Video decoding and H.264/AAC encoding
//! - `apply_effects`, which ties an effect chain to real files

pub mod config;
pub mod decoder;
pub mod export;
pub mod image_io;
pub mod pipeline;
pub mod probe;

pub use config::EngineConfig;
pub use decoder::VideoDecoder;
pub use export::{check_output_container, EncoderPreset, ExportJob, VideoEncoder, OUTPUT_CONTAINERS};
pub use image_io::{read_image, write_image, ImageFormat};
pub use pipeline::{apply_effects, ApplyOptions, BatchOutcome, Engine};
pub use probe::{AudioStreamInfo, MediaProbe, VideoStreamInfo};
