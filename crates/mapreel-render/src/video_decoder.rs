//! Video decoding module.
//!
//! Frames come from an [`FrameSource`]; the default source streams raw RGBA out of an
//! `ffmpeg` child process and the matching presentation timestamps out of `ffprobe`.
//! [`VideoDecoder`] owns the conversion buffer and turns timestamps into frame durations.

use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::OnceLock;

use mapreel_core::frame::DecodedFrame;
use mapreel_core::time::Rational;
use mapreel_core::{MapreelError, MapreelResult, MICROS_PER_SECOND};

/// Row alignment of the conversion buffer, in bytes.
pub const ROW_ALIGNMENT: usize = 32;

/// Raw durations outside `[0, MAX_FRAME_DURATION_US]` are treated as timestamp glitches.
pub const MAX_FRAME_DURATION_US: i64 = MICROS_PER_SECOND;

/// First video stream that is not an attached picture.
const VIDEO_STREAM: &str = "V:0";

/// Properties of the selected video stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    /// Unit of the stream's timestamps.
    pub time_base: Rational,
    /// Nominal frame rate.
    pub frame_rate: Rational,
    pub codec_name: Option<String>,
}

impl StreamInfo {
    /// Duration of one frame at the nominal frame rate, in microseconds.
    ///
    /// One tick per frame in a codec time base of `1 / frame_rate`.
    pub fn nominal_frame_duration_us(&self) -> Option<i64> {
        Rational::rescale(1, self.frame_rate.invert(), Rational::MICROSECONDS)
    }
}

/// Per-frame metadata reported by a [`FrameSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFrame {
    /// Best-effort presentation timestamp in stream time base units.
    pub best_effort_timestamp: Option<i64>,
}

/// Demuxes and decodes one video stream into RGBA rows.
pub trait FrameSource {
    /// Open the container and select its best video stream.
    fn open(&mut self, path: &Path) -> MapreelResult<StreamInfo>;

    /// Decode the next frame into `dst`, one RGBA row every `stride` bytes.
    ///
    /// `Ok(None)` means the stream ended.
    fn read_frame(&mut self, dst: &mut [u8], stride: usize) -> MapreelResult<Option<SourceFrame>>;

    /// Release every backend resource. Must be safe to call repeatedly.
    fn close(&mut self);
}

static FFMPEG_REGISTRATION: OnceLock<Result<(), String>> = OnceLock::new();

/// Verify once per process that the `ffmpeg` and `ffprobe` binaries are usable.
pub fn ensure_registered() -> MapreelResult<()> {
    FFMPEG_REGISTRATION
        .get_or_init(|| {
            for tool in ["ffmpeg", "ffprobe"] {
                let available = Command::new(tool)
                    .arg("-version")
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status()
                    .map(|s| s.success())
                    .unwrap_or(false);
                if !available {
                    return Err(format!(
                        "{} not found in PATH. Install FFmpeg: https://ffmpeg.org/download.html",
                        tool
                    ));
                }
            }
            tracing::debug!("ffmpeg and ffprobe registered");
            Ok(())
        })
        .clone()
        .map_err(MapreelError::Decode)
}

/// Whether the FFmpeg tools are installed.
pub fn is_available() -> bool {
    ensure_registered().is_ok()
}

/// Query stream properties of the first video stream with `ffprobe`.
///
/// `V` skips attached pictures such as cover art.
pub fn probe_stream(path: &Path) -> MapreelResult<StreamInfo> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            VIDEO_STREAM,
            "-show_entries",
            "stream=codec_name,width,height,time_base,r_frame_rate,avg_frame_rate",
            "-of",
            "json",
        ])
        .arg(path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| MapreelError::open(format!("failed to run ffprobe: {}", e), path))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MapreelError::open(
            format!("could not open source file: {}", stderr.trim()),
            path,
        ));
    }

    parse_stream_info(&output.stdout).map_err(|message| MapreelError::open(message, path))
}

fn parse_stream_info(json: &[u8]) -> Result<StreamInfo, String> {
    let json: serde_json::Value = serde_json::from_slice(json)
        .map_err(|e| format!("could not read stream information: {}", e))?;

    let stream = json["streams"]
        .as_array()
        .and_then(|streams| streams.first())
        .ok_or_else(|| "could not find video stream in input file".to_string())?;

    let dimension = |key: &str| {
        stream[key]
            .as_u64()
            .filter(|v| *v > 0 && *v <= u32::MAX as u64)
            .map(|v| v as u32)
            .ok_or_else(|| format!("missing {} in video stream", key))
    };
    let rational = |key: &str| {
        stream[key]
            .as_str()
            .and_then(|s| s.parse::<Rational>().ok())
            .filter(Rational::is_valid)
    };

    let time_base =
        rational("time_base").ok_or_else(|| "missing time base in video stream".to_string())?;
    let frame_rate = rational("r_frame_rate")
        .or_else(|| rational("avg_frame_rate"))
        .ok_or_else(|| "could not determine video frame rate".to_string())?;

    Ok(StreamInfo {
        width: dimension("width")?,
        height: dimension("height")?,
        time_base,
        frame_rate,
        codec_name: stream["codec_name"].as_str().map(str::to_string),
    })
}

/// Decodes through `ffmpeg`/`ffprobe` child processes.
#[derive(Default)]
pub struct FfmpegProcessSource {
    path: Option<PathBuf>,
    width: u32,
    height: u32,
    decoder: Option<Child>,
    pixels: Option<ChildStdout>,
    prober: Option<Child>,
    timestamps: Option<BufReader<ChildStdout>>,
}

impl FfmpegProcessSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames come out at the coded size; display rotation is left to the panel placement.
    fn spawn_decoder(path: &Path) -> MapreelResult<Child> {
        Command::new("ffmpeg")
            .args(["-v", "error", "-nostdin", "-autorotate", "0", "-i"])
            .arg(path)
            .args([
                "-map",
                "0:V:0",
                "-fps_mode",
                "passthrough",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "-",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| MapreelError::open(format!("could not open video codec: {}", e), path))
    }

    /// Reads best-effort timestamps from a second decode of the stream. The rawvideo pipe
    /// carries no timing, so the extra decode cost is accepted.
    fn spawn_prober(path: &Path) -> MapreelResult<Child> {
        Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-select_streams",
                VIDEO_STREAM,
                "-show_entries",
                "frame=best_effort_timestamp",
                "-of",
                "csv=p=0",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| MapreelError::open(format!("could not read frame timestamps: {}", e), path))
    }

    fn next_timestamp(&mut self) -> Option<i64> {
        let reader = self.timestamps.as_mut()?;
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => parse_timestamp_line(&line),
        }
    }
}

/// Parse one `ffprobe` csv line; `N/A` and garbage yield `None`.
fn parse_timestamp_line(line: &str) -> Option<i64> {
    line.split(',').next()?.trim().parse().ok()
}

impl FrameSource for FfmpegProcessSource {
    fn open(&mut self, path: &Path) -> MapreelResult<StreamInfo> {
        ensure_registered()?;
        if !path.exists() {
            return Err(MapreelError::open("could not open source file", path));
        }

        let info = probe_stream(path)?;

        let mut decoder = Self::spawn_decoder(path)?;
        self.pixels = decoder.stdout.take();
        self.decoder = Some(decoder);

        let mut prober = Self::spawn_prober(path)?;
        self.timestamps = prober.stdout.take().map(BufReader::new);
        self.prober = Some(prober);

        self.path = Some(path.to_path_buf());
        self.width = info.width;
        self.height = info.height;
        Ok(info)
    }

    fn read_frame(&mut self, dst: &mut [u8], stride: usize) -> MapreelResult<Option<SourceFrame>> {
        let row_bytes = self.width as usize * 4;
        let pixels = match self.pixels.as_mut() {
            Some(pixels) => pixels,
            None => return Ok(None),
        };

        for y in 0..self.height as usize {
            let start = y * stride;
            let row = dst
                .get_mut(start..start + row_bytes)
                .ok_or_else(|| MapreelError::Decode("conversion buffer too small".into()))?;
            match pixels.read_exact(row) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::UnexpectedEof && y == 0 => return Ok(None),
                Err(e) => {
                    return Err(MapreelError::Decode(format!(
                        "could not decode video frame: {}",
                        e
                    )))
                }
            }
        }

        Ok(Some(SourceFrame {
            best_effort_timestamp: self.next_timestamp(),
        }))
    }

    fn close(&mut self) {
        for child in [self.decoder.take(), self.prober.take()].into_iter().flatten() {
            reap(child);
        }
        self.pixels = None;
        self.timestamps = None;
        self.path = None;
        self.width = 0;
        self.height = 0;
    }
}

impl Drop for FfmpegProcessSource {
    fn drop(&mut self) {
        self.close();
    }
}

fn reap(mut child: Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Turns best-effort timestamps into a non-negative duration stream.
#[derive(Debug, Clone)]
pub struct TimeBaseReconciler {
    time_base: Rational,
    nominal_duration_us: i64,
    last_timestamp: i64,
}

impl TimeBaseReconciler {
    pub fn new(time_base: Rational, nominal_duration_us: i64) -> Self {
        Self {
            time_base,
            nominal_duration_us,
            last_timestamp: 0,
        }
    }

    pub fn nominal_duration_us(&self) -> i64 {
        self.nominal_duration_us
    }

    pub fn last_timestamp(&self) -> i64 {
        self.last_timestamp
    }

    /// Duration of the frame presented at `timestamp`, in microseconds.
    ///
    /// Falls back to the nominal duration when the raw duration is negative, longer than a
    /// second, or the timestamp is missing. A missing timestamp leaves the reference untouched.
    pub fn frame_duration(&mut self, timestamp: Option<i64>) -> i64 {
        let Some(timestamp) = timestamp else {
            tracing::warn!("Frame has no timestamp, using nominal frame duration");
            return self.nominal_duration_us;
        };

        let raw = timestamp
            .checked_sub(self.last_timestamp)
            .and_then(|delta| Rational::rescale(delta, self.time_base, Rational::MICROSECONDS));
        self.last_timestamp = timestamp;

        match raw {
            Some(duration) if (0..=MAX_FRAME_DURATION_US).contains(&duration) => duration,
            _ => {
                tracing::warn!(
                    "Could not calculate correct frame duration ({:?} us), using {} us",
                    raw,
                    self.nominal_duration_us
                );
                self.nominal_duration_us
            }
        }
    }

    pub fn reset(&mut self) {
        self.last_timestamp = 0;
    }
}

struct OpenStream {
    info: StreamInfo,
    buffer: Vec<u8>,
    stride: usize,
    reconciler: TimeBaseReconciler,
}

/// Sequential video decoder producing RGBA frames with reconciled durations.
pub struct VideoDecoder<S: FrameSource = FfmpegProcessSource> {
    source: S,
    stream: Option<OpenStream>,
}

impl VideoDecoder<FfmpegProcessSource> {
    pub fn new() -> Self {
        Self::with_source(FfmpegProcessSource::new())
    }
}

impl Default for VideoDecoder<FfmpegProcessSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: FrameSource> VideoDecoder<S> {
    pub fn with_source(source: S) -> Self {
        Self {
            source,
            stream: None,
        }
    }

    /// Open `path` and prepare the conversion buffer.
    ///
    /// On failure everything opened so far is released and the decoder stays uninitialized.
    pub fn initialize(&mut self, path: &Path) -> MapreelResult<()> {
        tracing::debug!("Initializing video decoder ({})", path.display());
        if self.stream.is_some() {
            self.shutdown();
        }

        match self.open_stream(path) {
            Ok(stream) => {
                tracing::info!(
                    "Opened {} ({}x{}, {} fps, time base {}, {})",
                    path.display(),
                    stream.info.width,
                    stream.info.height,
                    stream.info.frame_rate,
                    stream.info.time_base,
                    stream.info.codec_name.as_deref().unwrap_or("unknown codec")
                );
                self.stream = Some(stream);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Could not open video decoder: {}", e);
                self.shutdown();
                Err(e)
            }
        }
    }

    fn open_stream(&mut self, path: &Path) -> MapreelResult<OpenStream> {
        let info = self.source.open(path)?;

        let stride = aligned_stride(info.width)
            .ok_or_else(|| MapreelError::Allocation("frame row size overflows".into()))?;
        let size = stride
            .checked_mul(info.height as usize)
            .ok_or_else(|| MapreelError::Allocation("frame buffer size overflows".into()))?;
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(size)
            .map_err(|e| MapreelError::Allocation(format!("could not allocate raw video buffer: {}", e)))?;
        buffer.resize(size, 0);

        let nominal = info.nominal_frame_duration_us().ok_or_else(|| {
            MapreelError::open(format!("invalid frame rate {}", info.frame_rate), path)
        })?;

        Ok(OpenStream {
            reconciler: TimeBaseReconciler::new(info.time_base, nominal),
            info,
            buffer,
            stride,
        })
    }

    /// Release all resources and return to the uninitialized state. Idempotent.
    pub fn shutdown(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("Shutting down video decoder");
        }
        self.source.close();
    }

    /// Decode the next frame.
    ///
    /// Returns `None` at end of stream, on a decode error, or when not initialized.
    /// The frame borrows the decoder's buffer until the next call.
    pub fn next_frame(&mut self) -> Option<DecodedFrame<'_>> {
        let stream = self.stream.as_mut()?;

        let source_frame = match self.source.read_frame(&mut stream.buffer, stream.stride) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::debug!("End of video stream");
                return None;
            }
            Err(e) => {
                tracing::warn!("{}", e);
                return None;
            }
        };

        let duration_us = stream
            .reconciler
            .frame_duration(source_frame.best_effort_timestamp);

        Some(DecodedFrame {
            data: &stream.buffer,
            stride: stream.stride,
            width: stream.info.width,
            height: stream.info.height,
            duration_us,
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.stream.is_some()
    }

    pub fn frame_width(&self) -> u32 {
        self.stream.as_ref().map_or(0, |s| s.info.width)
    }

    pub fn frame_height(&self) -> u32 {
        self.stream.as_ref().map_or(0, |s| s.info.height)
    }

    pub fn frame_rate(&self) -> Option<Rational> {
        self.stream.as_ref().map(|s| s.info.frame_rate)
    }

    /// Nominal frame duration in microseconds, used when timestamps are unusable.
    pub fn nominal_frame_duration_us(&self) -> Option<i64> {
        self.stream.as_ref().map(|s| s.reconciler.nominal_duration_us())
    }
}

impl<S: FrameSource> Drop for VideoDecoder<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn aligned_stride(width: u32) -> Option<usize> {
    let row = (width as usize).checked_mul(4)?;
    Some(row.checked_add(ROW_ALIGNMENT - 1)? / ROW_ALIGNMENT * ROW_ALIGNMENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Produces solid frames with scripted timestamps.
    struct ScriptedSource {
        info: StreamInfo,
        timestamps: Vec<Option<i64>>,
        next: usize,
        opens: usize,
        closes: usize,
        fail_open: bool,
    }

    impl ScriptedSource {
        fn new(width: u32, height: u32, timestamps: Vec<Option<i64>>) -> Self {
            Self {
                info: StreamInfo {
                    width,
                    height,
                    time_base: Rational::new(1, 15360),
                    frame_rate: Rational::new(30, 1),
                    codec_name: Some("mock".into()),
                },
                timestamps,
                next: 0,
                opens: 0,
                closes: 0,
                fail_open: false,
            }
        }
    }

    impl FrameSource for ScriptedSource {
        fn open(&mut self, path: &Path) -> MapreelResult<StreamInfo> {
            self.opens += 1;
            if self.fail_open {
                return Err(MapreelError::open("could not find video stream", path));
            }
            self.next = 0;
            Ok(self.info.clone())
        }

        fn read_frame(&mut self, dst: &mut [u8], stride: usize) -> MapreelResult<Option<SourceFrame>> {
            let Some(ts) = self.timestamps.get(self.next).copied() else {
                return Ok(None);
            };
            self.next += 1;
            for y in 0..self.info.height as usize {
                let row = &mut dst[y * stride..y * stride + self.info.width as usize * 4];
                row.fill(self.next as u8);
            }
            Ok(Some(SourceFrame {
                best_effort_timestamp: ts,
            }))
        }

        fn close(&mut self) {
            self.closes += 1;
        }
    }

    fn ticks(frames: i64) -> Option<i64> {
        Some(frames * 512)
    }

    #[test]
    fn test_parse_stream_info() {
        let json = br#"{"programs": [], "streams": [{"codec_name": "h264", "width": 1920,
            "height": 1080, "r_frame_rate": "30000/1001", "avg_frame_rate": "30000/1001",
            "time_base": "1/30000"}]}"#;
        let info = parse_stream_info(json).unwrap();
        assert_eq!((info.width, info.height), (1920, 1080));
        assert_eq!(info.time_base, Rational::new(1, 30000));
        assert_eq!(info.frame_rate, Rational::new(30000, 1001));
        assert_eq!(info.nominal_frame_duration_us(), Some(33_367));
    }

    #[test]
    fn test_parse_stream_info_without_video() {
        let err = parse_stream_info(br#"{"programs": [], "streams": []}"#).unwrap_err();
        assert!(err.contains("video stream"));
        assert!(parse_stream_info(b"not json").is_err());
    }

    #[test]
    fn test_parse_stream_info_falls_back_to_average_rate() {
        let json = br#"{"streams": [{"width": 64, "height": 48, "r_frame_rate": "0/0",
            "avg_frame_rate": "25/1", "time_base": "1/12800"}]}"#;
        let info = parse_stream_info(json).unwrap();
        assert_eq!(info.frame_rate, Rational::new(25, 1));
        assert_eq!(info.nominal_frame_duration_us(), Some(40_000));
    }

    #[test]
    fn test_parse_timestamp_line() {
        assert_eq!(parse_timestamp_line("1024\n"), Some(1024));
        assert_eq!(parse_timestamp_line("-512,\n"), Some(-512));
        assert_eq!(parse_timestamp_line("N/A\n"), None);
        assert_eq!(parse_timestamp_line(""), None);
    }

    #[test]
    fn test_aligned_stride() {
        assert_eq!(aligned_stride(64), Some(256));
        assert_eq!(aligned_stride(1), Some(32));
        assert_eq!(aligned_stride(9), Some(64));
    }

    #[test]
    fn test_reconciler_regular_timestamps() {
        let mut r = TimeBaseReconciler::new(Rational::new(1, 15360), 33_333);
        assert_eq!(r.frame_duration(ticks(0)), 0);
        assert_eq!(r.frame_duration(ticks(1)), 33_333);
        assert_eq!(r.frame_duration(ticks(2)), 33_333);
        assert_eq!(r.last_timestamp(), 1024);
    }

    #[test]
    fn test_reconciler_fallback_on_backwards_timestamp() {
        let mut r = TimeBaseReconciler::new(Rational::new(1, 15360), 33_333);
        r.frame_duration(ticks(10));
        assert_eq!(r.frame_duration(ticks(9)), 33_333);
        // reference moved to the glitched timestamp
        assert_eq!(r.frame_duration(ticks(10)), 33_333);
        assert_eq!(r.last_timestamp(), 5120);
    }

    #[test]
    fn test_reconciler_fallback_on_large_gap() {
        let mut r = TimeBaseReconciler::new(Rational::new(1, 1000), 40_000);
        assert_eq!(r.frame_duration(Some(1000)), 1_000_000);
        assert_eq!(r.frame_duration(Some(2001)), 40_000);
    }

    #[test]
    fn test_reconciler_missing_timestamp_keeps_reference() {
        let mut r = TimeBaseReconciler::new(Rational::new(1, 1000), 40_000);
        r.frame_duration(Some(40));
        assert_eq!(r.frame_duration(None), 40_000);
        assert_eq!(r.last_timestamp(), 40);
        assert_eq!(r.frame_duration(Some(80)), 40_000);
        r.reset();
        assert_eq!(r.last_timestamp(), 0);
    }

    #[test]
    fn test_decoder_yields_frames_with_stride() {
        let source = ScriptedSource::new(9, 2, vec![ticks(0), ticks(1)]);
        let mut decoder = VideoDecoder::with_source(source);
        decoder.initialize(Path::new("mock.mp4")).unwrap();
        assert!(decoder.is_initialized());
        assert_eq!(decoder.nominal_frame_duration_us(), Some(33_333));

        let frame = decoder.next_frame().unwrap();
        assert_eq!(frame.stride, 64);
        assert_eq!(frame.data_length(), 128);
        assert_eq!(frame.row(1).unwrap(), &[1u8; 36][..]);
        assert_eq!(frame.duration_us, 0);

        let frame = decoder.next_frame().unwrap();
        assert_eq!(frame.duration_us, 33_333);
        assert!(decoder.next_frame().is_none());
    }

    #[test]
    fn test_decoder_durations_never_negative() {
        let timestamps = vec![ticks(0), ticks(2), ticks(1), None, ticks(3), ticks(500)];
        let mut decoder = VideoDecoder::with_source(ScriptedSource::new(2, 2, timestamps));
        decoder.initialize(Path::new("mock.mp4")).unwrap();
        let mut durations = Vec::new();
        while let Some(frame) = decoder.next_frame() {
            durations.push(frame.duration_us);
        }
        assert_eq!(durations, vec![0, 66_667, 33_333, 33_333, 66_667, 33_333]);
        assert!(durations.iter().all(|d| *d >= 0));
    }

    #[test]
    fn test_decoder_failed_initialize_releases_source() {
        let mut source = ScriptedSource::new(2, 2, vec![ticks(0)]);
        source.fail_open = true;
        let mut decoder = VideoDecoder::with_source(source);
        let err = decoder.initialize(Path::new("mock.mp4")).unwrap_err();
        assert!(matches!(err, MapreelError::Open { .. }));
        assert!(!decoder.is_initialized());
        assert_eq!(decoder.source.closes, 1);
        assert!(decoder.next_frame().is_none());
        assert_eq!(decoder.frame_width(), 0);
    }

    #[test]
    fn test_shutdown_then_initialize_is_fresh() {
        let source = ScriptedSource::new(2, 2, vec![ticks(0), ticks(1), ticks(2)]);
        let mut decoder = VideoDecoder::with_source(source);
        decoder.initialize(Path::new("mock.mp4")).unwrap();
        decoder.next_frame();
        decoder.next_frame();
        decoder.shutdown();
        decoder.shutdown();
        assert!(!decoder.is_initialized());
        assert!(decoder.frame_rate().is_none());

        decoder.initialize(Path::new("mock.mp4")).unwrap();
        assert_eq!(decoder.source.opens, 2);
        let first = decoder.next_frame().unwrap();
        assert_eq!(first.duration_us, 0);
        assert_eq!(decoder.next_frame().unwrap().duration_us, 33_333);
    }

    #[test]
    fn test_decoder_missing_file() {
        let mut decoder = VideoDecoder::new();
        assert!(decoder.initialize(Path::new("/nonexistent/video.mp4")).is_err());
        assert!(!decoder.is_initialized());
    }
}
