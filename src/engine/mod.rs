//! Encode engine adapters

mod ffmpeg;

pub use ffmpeg::FfmpegEngine;
