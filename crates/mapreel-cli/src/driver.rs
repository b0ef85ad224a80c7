//! The per-frame loop: decode, upload, composite, read back, encode.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};

use mapreel_core::{
    MapreelConfig, NoStabilization, RenderMode, Route, ScrollMode, StaticRoute,
    MICROS_PER_SECOND,
};
use mapreel_encode::{EncoderSettings, FfmpegEncoder, FrameSink, PngSequenceSink};
use mapreel_render::{image_loader, Compositor, FrameInputs, FrameTimings, GpuContext, VideoDecoder};

const FALLBACK_FRAME_RATE: f64 = 30.0;
const PROGRESS_INTERVAL: u64 = 100;

pub struct RenderJob {
    pub video: PathBuf,
    pub map: PathBuf,
    pub route: Option<PathBuf>,
    pub output: PathBuf,
    pub png_sequence: bool,
    pub mode: RenderMode,
    pub max_frames: Option<u64>,
    pub config: MapreelConfig,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSummary {
    pub frames: u64,
    pub video_seconds: f64,
    pub wall_seconds: f64,
}

impl RenderSummary {
    pub fn average_fps(&self) -> f64 {
        if self.wall_seconds > 0.0 {
            self.frames as f64 / self.wall_seconds
        } else {
            0.0
        }
    }
}

fn millis_since(instant: Instant) -> f64 {
    instant.elapsed().as_secs_f64() * 1000.0
}

pub fn render(job: &RenderJob) -> Result<RenderSummary> {
    let started = Instant::now();

    let mut decoder = VideoDecoder::new();
    decoder
        .initialize(&job.video)
        .with_context(|| format!("failed to open video {}", job.video.display()))?;

    let map = image_loader::load_image(&job.map)
        .with_context(|| format!("failed to load map {}", job.map.display()))?;

    let route = match &job.route {
        Some(path) => StaticRoute::new(
            Route::load_from_file(path)
                .with_context(|| format!("failed to load route {}", path.display()))?,
        ),
        None => StaticRoute::default(),
    };

    let gpu = Arc::new(GpuContext::init()?);
    let mut compositor = Compositor::initialize(gpu, &decoder, &map, &job.config)
        .context("failed to initialize compositor")?;
    compositor.set_render_mode(job.mode);
    compositor.set_is_encoding(true);

    let (width, height) = compositor.window_size();
    let frame_rate = decoder
        .frame_rate()
        .map(|rate| rate.as_f64())
        .filter(|rate| rate.is_finite() && *rate > 0.0)
        .unwrap_or(FALLBACK_FRAME_RATE);

    let mut sink: Box<dyn FrameSink> = if job.png_sequence {
        Box::new(PngSequenceSink::create(&job.output)?)
    } else {
        let settings = EncoderSettings::from_config(&job.config.encoder, width, height, frame_rate);
        Box::new(FfmpegEncoder::start(&job.output, settings)?)
    };

    let stabilization = NoStabilization;
    let mut frames = 0u64;
    let mut video_time_us = 0i64;
    let mut encode_time = 0.0;
    let mut spare_time = 0.0;
    let mut last_frame_start = Instant::now();

    loop {
        if job.max_frames.is_some_and(|max| frames >= max) {
            break;
        }

        let frame_start = Instant::now();
        let frame_time = frame_start.duration_since(last_frame_start).as_secs_f64() * 1000.0;
        last_frame_start = frame_start;

        let decode_start = Instant::now();
        let Some(frame) = decoder.next_frame() else {
            break;
        };
        let decode_time = millis_since(decode_start);
        let duration_us = frame.duration_us;

        compositor.start_rendering(&FrameTimings {
            current_time: video_time_us as f64 / MICROS_PER_SECOND as f64,
            frame_time,
            spare_time,
            decode_time,
            stabilize_time: 0.0,
            encode_time,
        });
        compositor.upload_frame_data(&frame)?;
        compositor.render_all(&FrameInputs {
            stabilization: &stabilization,
            route: &route,
            scroll_mode: ScrollMode::None,
        });
        compositor.stop_rendering();

        let rendered = compositor.get_rendered_frame()?;
        encode_time = sink.write_frame(&rendered)?;

        video_time_us += duration_us;
        frames += 1;
        spare_time = duration_us as f64 / 1000.0 - millis_since(frame_start);

        if frames % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                "{} frames, {:.1} s of video",
                frames,
                video_time_us as f64 / MICROS_PER_SECOND as f64
            );
        }
    }

    sink.finish()?;
    decoder.shutdown();

    Ok(RenderSummary {
        frames,
        video_seconds: video_time_us as f64 / MICROS_PER_SECOND as f64,
        wall_seconds: started.elapsed().as_secs_f64(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_fps() {
        let summary = RenderSummary {
            frames: 50,
            video_seconds: 2.0,
            wall_seconds: 2.5,
        };
        assert_eq!(summary.average_fps(), 20.0);

        let empty = RenderSummary {
            frames: 0,
            video_seconds: 0.0,
            wall_seconds: 0.0,
        };
        assert_eq!(empty.average_fps(), 0.0);
    }
}
