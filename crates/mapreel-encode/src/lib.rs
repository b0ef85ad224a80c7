//! # mapreel-encode
//!
//! Encoding module: streams composited frames into a video file through FFmpeg, or dumps
//! them as numbered PNG images.

pub mod ffmpeg;
pub mod sequence;

pub use ffmpeg::{EncoderSettings, FfmpegEncoder};
pub use sequence::PngSequenceSink;

use mapreel_core::{MapreelResult, RenderedFrame};

/// Destination of rendered frames.
pub trait FrameSink {
    /// Consume one frame; returns the time spent in milliseconds.
    fn write_frame(&mut self, frame: &RenderedFrame<'_>) -> MapreelResult<f64>;

    /// Flush and close the output. Further frames are rejected.
    fn finish(&mut self) -> MapreelResult<()>;

    fn frames_written(&self) -> u64;
}
