use serde::{Deserialize, Serialize};

/// Pixel format of a frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 8-bit RGBA (4 bytes per pixel).
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel for this format.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// An owned, tightly packed RGBA image (map images, copies of rendered frames).
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    /// Raw pixel data, `width * 4` bytes per row.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl FrameBuffer {
    /// Create a new frame buffer filled with zeros (transparent black).
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let size = (width as usize) * (height as usize) * format.bytes_per_pixel();
        Self {
            data: vec![0u8; size],
            width,
            height,
            format,
        }
    }

    /// Create a frame buffer filled with a solid color.
    pub fn solid(width: u32, height: u32, color: &crate::Color) -> Self {
        let pixel = color.to_rgba8();
        let pixel_count = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(pixel_count * 4);
        for _ in 0..pixel_count {
            data.extend_from_slice(&pixel);
        }
        Self {
            data,
            width,
            height,
            format: PixelFormat::Rgba8,
        }
    }

    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    pub fn byte_size(&self) -> usize {
        self.data.len()
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    /// Get the RGBA value at a pixel coordinate. Returns None if out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize) * self.stride() + (x as usize) * 4;
        let px = self.data.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Set the RGBA value at a pixel coordinate. No-op if out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = (y as usize) * self.stride() + (x as usize) * 4;
        if let Some(px) = self.data.get_mut(offset..offset + 4) {
            px.copy_from_slice(&rgba);
        }
    }
}

/// A decoded video frame borrowed from the decoder's conversion buffer.
///
/// The borrow ends at the next decode call, which overwrites the buffer.
#[derive(Debug, Clone, Copy)]
pub struct DecodedFrame<'a> {
    /// RGBA pixels, `stride` bytes per row.
    pub data: &'a [u8],
    /// Bytes per row; may exceed `width * 4` because of row alignment.
    pub stride: usize,
    pub width: u32,
    pub height: u32,
    /// Presentation duration in microseconds.
    pub duration_us: i64,
}

impl<'a> DecodedFrame<'a> {
    pub fn data_length(&self) -> usize {
        self.data.len()
    }

    /// Visible bytes of row `y`, without alignment padding.
    pub fn row(&self, y: u32) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride;
        self.data.get(start..start + self.width as usize * 4)
    }
}

/// A composited frame read back from the GPU.
///
/// Borrows the compositor's persistent readback buffer, which the next readback overwrites;
/// use [`RenderedFrame::to_frame_buffer`] to keep a copy.
#[derive(Debug, Clone, Copy)]
pub struct RenderedFrame<'a> {
    pub data: &'a [u8],
    /// Bytes per row; may include padding beyond `width * 4`.
    pub row_length: usize,
    pub width: u32,
    pub height: u32,
}

impl<'a> RenderedFrame<'a> {
    pub fn data_length(&self) -> usize {
        self.data.len()
    }

    /// Visible bytes of row `y`, without padding.
    pub fn row(&self, y: u32) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.row_length;
        self.data.get(start..start + self.width as usize * 4)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width {
            return None;
        }
        let row = self.row(y)?;
        let offset = x as usize * 4;
        Some([row[offset], row[offset + 1], row[offset + 2], row[offset + 3]])
    }

    /// Copy into an owned, tightly packed frame buffer.
    pub fn to_frame_buffer(&self) -> FrameBuffer {
        let mut fb = FrameBuffer::new(self.width, self.height, PixelFormat::Rgba8);
        let stride = fb.stride();
        for y in 0..self.height {
            if let Some(row) = self.row(y) {
                let start = y as usize * stride;
                fb.data[start..start + stride].copy_from_slice(row);
            }
        }
        fb
    }
}
