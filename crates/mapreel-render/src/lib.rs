//! # mapreel-render
//!
//! The Mapreel frame pipeline. Decodes video frames, composites them next to a map with a
//! route overlay on the GPU and reads the result back for encoding.

pub mod compositor;
pub mod gpu;
pub mod image_loader;
pub mod layout;
pub mod overlay;
pub mod panel;
pub mod shader;
pub mod telemetry;
pub mod video_decoder;

pub use compositor::{Compositor, FrameInputs};
pub use gpu::GpuContext;
pub use layout::{PanelLayout, PanelPlacement, Viewport};
pub use telemetry::{FrameTimings, Telemetry};
pub use video_decoder::{FfmpegProcessSource, FrameSource, VideoDecoder};
