use std::path::{Path, PathBuf};
use std::time::Instant;

use mapreel_core::{MapreelError, MapreelResult, RenderedFrame};

use crate::FrameSink;

/// Writes every frame as `frame_NNNNNN.png` into a directory.
pub struct PngSequenceSink {
    directory: PathBuf,
    frames_written: u64,
    finished: bool,
}

impl PngSequenceSink {
    pub fn create(directory: &Path) -> MapreelResult<Self> {
        std::fs::create_dir_all(directory)?;
        tracing::info!("Writing PNG frames to {}", directory.display());
        Ok(Self {
            directory: directory.to_path_buf(),
            frames_written: 0,
            finished: false,
        })
    }

    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.directory.join(format!("frame_{:06}.png", index))
    }
}

impl FrameSink for PngSequenceSink {
    fn write_frame(&mut self, frame: &RenderedFrame<'_>) -> MapreelResult<f64> {
        let started = Instant::now();
        if self.finished {
            return Err(MapreelError::Encode("image sequence is already finished".into()));
        }
        let packed = frame.to_frame_buffer();
        let image = image::RgbaImage::from_raw(packed.width, packed.height, packed.data)
            .ok_or_else(|| MapreelError::Encode("frame buffer does not match its size".into()))?;
        let path = self.frame_path(self.frames_written);
        image
            .save(&path)
            .map_err(|e| MapreelError::Encode(format!("cannot write {}: {}", path.display(), e)))?;
        self.frames_written += 1;
        Ok(started.elapsed().as_secs_f64() * 1000.0)
    }

    fn finish(&mut self) -> MapreelResult<()> {
        if !self.finished {
            self.finished = true;
            tracing::info!(
                "Wrote {} frames to {}",
                self.frames_written,
                self.directory.display()
            );
        }
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_numbered_pngs_without_padding() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = PngSequenceSink::create(&dir.path().join("frames")).unwrap();

        let row_length = 16;
        let mut data = vec![0xEEu8; row_length * 2];
        data[..8].copy_from_slice(&[1, 2, 3, 255, 4, 5, 6, 255]);
        data[16..24].copy_from_slice(&[7, 8, 9, 255, 10, 11, 12, 255]);
        let frame = RenderedFrame {
            data: &data,
            row_length,
            width: 2,
            height: 2,
        };
        sink.write_frame(&frame).unwrap();
        sink.write_frame(&frame).unwrap();
        assert_eq!(sink.frames_written(), 2);

        let first = image::open(sink.frame_path(0)).unwrap().to_rgba8();
        assert_eq!(first.dimensions(), (2, 2));
        assert_eq!(first.get_pixel(1, 1).0, [10, 11, 12, 255]);
        assert!(sink.frame_path(1).exists());

        sink.finish().unwrap();
        assert!(sink.write_frame(&frame).is_err());
    }
}
