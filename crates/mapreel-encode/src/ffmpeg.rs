use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::time::Instant;

use mapreel_core::{EncoderConfig, MapreelError, MapreelResult, RenderedFrame};

use crate::FrameSink;

/// Output stream parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderSettings {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    pub codec: String,
    pub preset: String,
    pub crf: u32,
}

impl EncoderSettings {
    /// Settings for a `width`x`height` output; `input_frame_rate` applies when the
    /// configuration leaves the rate unset.
    pub fn from_config(config: &EncoderConfig, width: u32, height: u32, input_frame_rate: f64) -> Self {
        Self {
            width,
            height,
            frame_rate: config.frame_rate.unwrap_or(input_frame_rate),
            codec: config.codec.clone(),
            preset: config.preset.clone(),
            crf: config.crf,
        }
    }

    /// Arguments passed to ffmpeg, output path excluded.
    pub fn ffmpeg_args(&self) -> Vec<String> {
        let mut args: Vec<String> = [
            "-v", "error", "-nostdin", "-y", "-f", "rawvideo", "-pixel_format", "rgba",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.extend([
            "-video_size".to_string(),
            format!("{}x{}", self.width, self.height),
            "-framerate".to_string(),
            format!("{}", self.frame_rate),
            "-i".to_string(),
            "-".to_string(),
            "-c:v".to_string(),
            self.codec.clone(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
        ]);
        // preset and crf are only understood by the x264/x265 family
        if self.codec.starts_with("libx26") {
            args.extend([
                "-preset".to_string(),
                self.preset.clone(),
                "-crf".to_string(),
                self.crf.to_string(),
            ]);
        }
        args.extend(["-movflags".to_string(), "+faststart".to_string()]);
        args
    }
}

/// Streaming encoder feeding raw RGBA frames to an FFmpeg child process.
pub struct FfmpegEncoder {
    settings: EncoderSettings,
    output_path: PathBuf,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    packed: Vec<u8>,
    frames_written: u64,
}

impl FfmpegEncoder {
    /// Check if FFmpeg is available on the system.
    pub fn is_available() -> bool {
        Command::new("ffmpeg")
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Spawn ffmpeg writing to `output_path`.
    pub fn start(output_path: &Path, settings: EncoderSettings) -> MapreelResult<Self> {
        if settings.width == 0 || settings.height == 0 {
            return Err(MapreelError::Encode(format!(
                "invalid output size {}x{}",
                settings.width, settings.height
            )));
        }
        if !(settings.frame_rate.is_finite() && settings.frame_rate > 0.0) {
            return Err(MapreelError::Encode(format!(
                "invalid frame rate {}",
                settings.frame_rate
            )));
        }
        if !Self::is_available() {
            return Err(MapreelError::Encode(
                "ffmpeg not found in PATH. Install FFmpeg: https://ffmpeg.org/download.html".into(),
            ));
        }

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut child = Command::new("ffmpeg")
            .args(settings.ffmpeg_args())
            .arg(output_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| MapreelError::Encode(format!("failed to start ffmpeg: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MapreelError::Encode("failed to open ffmpeg stdin".into()))?;

        tracing::info!(
            "Encoding {}x{} @ {} fps with {} to {}",
            settings.width,
            settings.height,
            settings.frame_rate,
            settings.codec,
            output_path.display()
        );

        Ok(Self {
            packed: Vec::with_capacity(settings.width as usize * settings.height as usize * 4),
            settings,
            output_path: output_path.to_path_buf(),
            child: Some(child),
            stdin: Some(stdin),
            frames_written: 0,
        })
    }

    pub fn settings(&self) -> &EncoderSettings {
        &self.settings
    }

    /// Write one frame, dropping row padding. Returns the time spent in milliseconds.
    pub fn encode_frame(&mut self, frame: &RenderedFrame<'_>) -> MapreelResult<f64> {
        let started = Instant::now();
        if frame.width != self.settings.width || frame.height != self.settings.height {
            return Err(MapreelError::Encode(format!(
                "frame {} has dimensions {}x{}, expected {}x{}",
                self.frames_written,
                frame.width,
                frame.height,
                self.settings.width,
                self.settings.height
            )));
        }
        let row_bytes = frame.width as usize * 4;
        let packed_len = row_bytes * frame.height as usize;

        let bytes: &[u8] = if frame.row_length == row_bytes && frame.data.len() >= packed_len {
            &frame.data[..packed_len]
        } else {
            self.packed.clear();
            for y in 0..frame.height {
                let row = frame.row(y).ok_or_else(|| {
                    MapreelError::Encode(format!("frame is missing row {}", y))
                })?;
                self.packed.extend_from_slice(row);
            }
            &self.packed
        };

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| MapreelError::Encode("encoder is already finished".into()))?;
        if let Err(e) = stdin.write_all(bytes) {
            self.stdin = None;
            let stderr = self.collect_stderr();
            return Err(MapreelError::Encode(format!(
                "failed to write frame {} to ffmpeg: {}. FFmpeg stderr: {}",
                self.frames_written, e, stderr
            )));
        }

        self.frames_written += 1;
        Ok(started.elapsed().as_secs_f64() * 1000.0)
    }

    /// Close the input and wait for ffmpeg to finalize the file.
    pub fn finish(&mut self) -> MapreelResult<()> {
        // closing stdin signals end of input
        self.stdin = None;
        let Some(child) = self.child.take() else {
            return Ok(());
        };
        let output = child
            .wait_with_output()
            .map_err(|e| MapreelError::Encode(format!("ffmpeg process error: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MapreelError::Encode(format!(
                "ffmpeg failed with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        tracing::info!(
            "Encoded {} frames to {}",
            self.frames_written,
            self.output_path.display()
        );
        Ok(())
    }

    fn collect_stderr(&mut self) -> String {
        let Some(mut child) = self.child.take() else {
            return String::new();
        };
        let mut stderr = String::new();
        if let Some(mut pipe) = child.stderr.take() {
            let _ = pipe.read_to_string(&mut stderr);
        }
        let _ = child.wait();
        stderr.trim().to_string()
    }
}

impl FrameSink for FfmpegEncoder {
    fn write_frame(&mut self, frame: &RenderedFrame<'_>) -> MapreelResult<f64> {
        self.encode_frame(frame)
    }

    fn finish(&mut self) -> MapreelResult<()> {
        FfmpegEncoder::finish(self)
    }

    fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        self.stdin = None;
        if let Some(mut child) = self.child.take() {
            tracing::warn!(
                "Encoder for {} dropped before finish, stopping ffmpeg",
                self.output_path.display()
            );
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(codec: &str) -> EncoderSettings {
        EncoderSettings {
            width: 64,
            height: 48,
            frame_rate: 25.0,
            codec: codec.to_string(),
            preset: "veryfast".to_string(),
            crf: 23,
        }
    }

    fn padded_frame(width: u32, height: u32, row_length: usize, value: u8) -> Vec<u8> {
        let mut data = vec![0u8; row_length * height as usize];
        for row in data.chunks_mut(row_length) {
            row[..width as usize * 4].fill(value);
        }
        data
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = EncoderConfig::default();
        let s = EncoderSettings::from_config(&config, 1280, 720, 29.97);
        assert_eq!(s.frame_rate, 29.97);
        assert_eq!(s.codec, "libx264");

        config.frame_rate = Some(60.0);
        let s = EncoderSettings::from_config(&config, 1280, 720, 29.97);
        assert_eq!(s.frame_rate, 60.0);
    }

    #[test]
    fn test_x264_args_carry_rate_control() {
        let args = settings("libx264").ffmpeg_args();
        assert!(args.windows(2).any(|w| w[0] == "-crf" && w[1] == "23"));
        assert!(args.windows(2).any(|w| w[0] == "-video_size" && w[1] == "64x48"));

        let args = settings("mpeg4").ffmpeg_args();
        assert!(!args.iter().any(|a| a == "-crf"));
    }

    #[test]
    fn test_start_rejects_bad_settings() {
        let mut s = settings("mpeg4");
        s.frame_rate = 0.0;
        assert!(FfmpegEncoder::start(Path::new("/tmp/unused.mp4"), s).is_err());

        let mut s = settings("mpeg4");
        s.width = 0;
        assert!(FfmpegEncoder::start(Path::new("/tmp/unused.mp4"), s).is_err());
    }

    #[test]
    fn test_encode_padded_frames() {
        if !FfmpegEncoder::is_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("clip.mp4");
        let mut encoder = FfmpegEncoder::start(&path, settings("mpeg4")).unwrap();

        let row_length = 256;
        for i in 0..10u8 {
            let data = padded_frame(64, 48, row_length, i * 20);
            let frame = RenderedFrame {
                data: &data,
                row_length,
                width: 64,
                height: 48,
            };
            let ms = encoder.encode_frame(&frame).unwrap();
            assert!(ms >= 0.0);
        }
        assert_eq!(FrameSink::frames_written(&encoder), 10);
        encoder.finish().unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);

        let data = padded_frame(64, 48, row_length, 0);
        let frame = RenderedFrame {
            data: &data,
            row_length,
            width: 64,
            height: 48,
        };
        assert!(encoder.encode_frame(&frame).is_err());
    }

    #[test]
    fn test_encode_rejects_wrong_size() {
        if !FfmpegEncoder::is_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let mut encoder = FfmpegEncoder::start(&dir.path().join("clip.mp4"), settings("mpeg4")).unwrap();
        let data = vec![0u8; 32 * 32 * 4];
        let frame = RenderedFrame {
            data: &data,
            row_length: 32 * 4,
            width: 32,
            height: 32,
        };
        assert!(matches!(encoder.encode_frame(&frame), Err(MapreelError::Encode(_))));
    }
}
