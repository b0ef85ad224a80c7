//! Map image loading.
//! Decodes PNG, JPEG and the other formats `image` supports into RGBA frame buffers.

use std::path::Path;

use mapreel_core::frame::FrameBuffer;
use mapreel_core::{MapreelError, MapreelResult, PixelFormat};

fn into_frame_buffer(img: image::DynamicImage) -> FrameBuffer {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut fb = FrameBuffer::new(width, height, PixelFormat::Rgba8);
    fb.data = rgba.into_raw();
    fb
}

/// Load an image file as a tightly packed RGBA frame buffer.
pub fn load_image(path: &Path) -> MapreelResult<FrameBuffer> {
    let img = image::open(path).map_err(|e| {
        MapreelError::asset(
            format!("failed to load image '{}': {}", path.display(), e),
            path,
        )
    })?;
    let fb = into_frame_buffer(img);
    tracing::debug!("Loaded {}x{} image {}", fb.width, fb.height, path.display());
    Ok(fb)
}

/// Decode an image held in memory.
pub fn load_image_from_bytes(data: &[u8]) -> MapreelResult<FrameBuffer> {
    let img = image::load_from_memory(data)
        .map_err(|e| MapreelError::asset(format!("failed to decode image: {}", e), "<memory>"))?;
    Ok(into_frame_buffer(img))
}
