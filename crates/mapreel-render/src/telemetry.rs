//! Smoothed timing statistics and the rows of the info panel.

use std::time::Instant;

use mapreel_core::{RenderMode, ScrollMode, Timestamp};

/// Smoothing factor of every telemetry average.
pub const MOVING_AVERAGE_ALPHA: f64 = 0.1;

/// Exponentially weighted moving average seeded by its first sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovingAverage {
    alpha: f64,
    average: Option<f64>,
}

impl MovingAverage {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            average: None,
        }
    }

    pub fn add_measurement(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.average = Some(match self.average {
            Some(average) => self.alpha * value + (1.0 - self.alpha) * average,
            None => value,
        });
    }

    /// Current average, zero before the first sample.
    pub fn average(&self) -> f64 {
        self.average.unwrap_or(0.0)
    }

    pub fn reset(&mut self) {
        self.average = None;
    }
}

impl Default for MovingAverage {
    fn default() -> Self {
        Self::new(MOVING_AVERAGE_ALPHA)
    }
}

/// Timings measured by the driver for the frame about to be rendered.
///
/// `current_time` is in seconds, everything else in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTimings {
    pub current_time: f64,
    pub frame_time: f64,
    pub spare_time: f64,
    pub decode_time: f64,
    pub stabilize_time: f64,
    pub encode_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowTone {
    Normal,
    Good,
    Bad,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InfoLine {
    Row {
        label: &'static str,
        value: String,
        tone: RowTone,
    },
    /// Vertical gap between row groups.
    Gap,
}

impl InfoLine {
    fn row(label: &'static str, value: String) -> Self {
        InfoLine::Row {
            label,
            value,
            tone: RowTone::Normal,
        }
    }
}

/// Non-timing state shown in the info panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfoContext {
    pub is_encoding: bool,
    pub render_mode: RenderMode,
    pub scroll_mode: ScrollMode,
    pub video_scale: f64,
    pub map_scale: f64,
    pub route_scale: f64,
    pub control_time_offset: f64,
    pub runner_time_offset: f64,
}

#[derive(Debug, Clone)]
pub struct Telemetry {
    pub fps: MovingAverage,
    pub frame_time: MovingAverage,
    pub decode_time: MovingAverage,
    pub stabilize_time: MovingAverage,
    pub render_time: MovingAverage,
    pub encode_time: MovingAverage,
    pub spare_time: MovingAverage,
    current_time: f64,
    last_render_time: f64,
    render_started: Option<Instant>,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl Telemetry {
    pub fn new() -> Self {
        Self {
            fps: MovingAverage::default(),
            frame_time: MovingAverage::default(),
            decode_time: MovingAverage::default(),
            stabilize_time: MovingAverage::default(),
            render_time: MovingAverage::default(),
            encode_time: MovingAverage::default(),
            spare_time: MovingAverage::default(),
            current_time: 0.0,
            last_render_time: 0.0,
            render_started: None,
        }
    }

    /// Record the driver's timings and start measuring render time.
    ///
    /// The render average is fed the previous frame's render time, the only one known here.
    pub fn start_rendering(&mut self, timings: &FrameTimings) {
        self.render_started = Some(Instant::now());
        self.current_time = timings.current_time;

        if timings.frame_time > 0.0 {
            self.fps.add_measurement(1000.0 / timings.frame_time);
        }
        self.frame_time.add_measurement(timings.frame_time);
        self.decode_time.add_measurement(timings.decode_time);
        self.stabilize_time.add_measurement(timings.stabilize_time);
        self.render_time.add_measurement(self.last_render_time);
        self.encode_time.add_measurement(timings.encode_time);
        self.spare_time.add_measurement(timings.spare_time);
    }

    /// Stop the render timer; returns the render time in milliseconds.
    pub fn stop_rendering(&mut self) -> f64 {
        if let Some(started) = self.render_started.take() {
            self.last_render_time = started.elapsed().as_secs_f64() * 1000.0;
        }
        self.last_render_time
    }

    pub fn last_render_time(&self) -> f64 {
        self.last_render_time
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// The info panel layout, top to bottom.
    pub fn info_lines(&self, ctx: &InfoContext) -> Vec<InfoLine> {
        let ms = |average: &MovingAverage| format!("{:.2} ms", average.average());

        let mut lines = vec![
            InfoLine::row("time:", Timestamp::from_seconds(self.current_time).to_string()),
            InfoLine::Gap,
            InfoLine::row("fps:", format!("{:.2}", self.fps.average())),
            InfoLine::row("frame:", ms(&self.frame_time)),
            InfoLine::row("decode:", ms(&self.decode_time)),
            InfoLine::row("stabilize:", ms(&self.stabilize_time)),
            InfoLine::row("render:", ms(&self.render_time)),
        ];

        if ctx.is_encoding {
            lines.push(InfoLine::row("encode:", ms(&self.encode_time)));
        } else {
            let spare = self.spare_time.average();
            let tone = if spare < 0.0 {
                RowTone::Bad
            } else if spare > 0.0 {
                RowTone::Good
            } else {
                RowTone::Normal
            };
            lines.push(InfoLine::Row {
                label: "spare:",
                value: ms(&self.spare_time),
                tone,
            });
        }

        lines.extend([
            InfoLine::Gap,
            InfoLine::row("render:", ctx.render_mode.label().to_string()),
            InfoLine::row("scroll:", ctx.scroll_mode.label().to_string()),
            InfoLine::Gap,
            InfoLine::row("video scale:", format!("{:.2}", ctx.video_scale)),
            InfoLine::row("map scale:", format!("{:.2}", ctx.map_scale)),
            InfoLine::row("route scale:", format!("{:.2}", ctx.route_scale)),
            InfoLine::Gap,
            InfoLine::row("control offset:", format!("{:.2} s", ctx.control_time_offset)),
            InfoLine::row("runner offset:", format!("{:.2} s", ctx.runner_time_offset)),
        ]);

        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(is_encoding: bool) -> InfoContext {
        InfoContext {
            is_encoding,
            render_mode: RenderMode::All,
            scroll_mode: ScrollMode::Map,
            video_scale: 1.0,
            map_scale: 1.25,
            route_scale: 2.0,
            control_time_offset: 0.5,
            runner_time_offset: -1.0,
        }
    }

    fn value_of<'a>(lines: &'a [InfoLine], wanted: &str) -> Option<(&'a str, RowTone)> {
        lines.iter().find_map(|line| match line {
            InfoLine::Row { label, value, tone } if *label == wanted => Some((value.as_str(), *tone)),
            _ => None,
        })
    }

    #[test]
    fn test_moving_average_seeded_by_first_sample() {
        let mut avg = MovingAverage::new(0.1);
        assert_eq!(avg.average(), 0.0);
        avg.add_measurement(10.0);
        assert_eq!(avg.average(), 10.0);
        avg.add_measurement(20.0);
        assert!((avg.average() - 11.0).abs() < 1e-12);
        avg.add_measurement(f64::INFINITY);
        assert!((avg.average() - 11.0).abs() < 1e-12);
        avg.reset();
        assert_eq!(avg.average(), 0.0);
    }

    #[test]
    fn test_start_rendering_feeds_averages() {
        let mut telemetry = Telemetry::new();
        telemetry.start_rendering(&FrameTimings {
            current_time: 1.0,
            frame_time: 20.0,
            spare_time: 3.0,
            decode_time: 5.0,
            stabilize_time: 2.0,
            encode_time: 4.0,
        });
        assert_eq!(telemetry.fps.average(), 50.0);
        assert_eq!(telemetry.frame_time.average(), 20.0);
        assert_eq!(telemetry.decode_time.average(), 5.0);
        // no render has finished yet
        assert_eq!(telemetry.render_time.average(), 0.0);
        let render = telemetry.stop_rendering();
        assert!(render >= 0.0);
        assert_eq!(telemetry.last_render_time(), render);
    }

    #[test]
    fn test_zero_frame_time_skips_fps() {
        let mut telemetry = Telemetry::new();
        telemetry.start_rendering(&FrameTimings::default());
        assert_eq!(telemetry.fps.average(), 0.0);
        assert_eq!(telemetry.stop_rendering(), telemetry.last_render_time());
    }

    #[test]
    fn test_info_lines_layout() {
        let mut telemetry = Telemetry::new();
        telemetry.start_rendering(&FrameTimings {
            current_time: 3661.25,
            frame_time: 40.0,
            spare_time: -2.0,
            ..FrameTimings::default()
        });
        let lines = telemetry.info_lines(&context(false));
        assert_eq!(lines.len(), 18);
        assert_eq!(value_of(&lines, "time:"), Some(("01:01:01.250", RowTone::Normal)));
        assert_eq!(value_of(&lines, "fps:"), Some(("25.00", RowTone::Normal)));
        assert_eq!(value_of(&lines, "spare:"), Some(("-2.00 ms", RowTone::Bad)));
        assert_eq!(value_of(&lines, "encode:"), None);
        assert_eq!(value_of(&lines, "scroll:"), Some(("map", RowTone::Normal)));
        assert_eq!(value_of(&lines, "map scale:"), Some(("1.25", RowTone::Normal)));
        assert_eq!(value_of(&lines, "runner offset:"), Some(("-1.00 s", RowTone::Normal)));
    }

    #[test]
    fn test_info_lines_when_encoding() {
        let mut telemetry = Telemetry::new();
        telemetry.start_rendering(&FrameTimings {
            encode_time: 7.5,
            spare_time: 1.0,
            ..FrameTimings::default()
        });
        let lines = telemetry.info_lines(&context(true));
        assert_eq!(value_of(&lines, "encode:"), Some(("7.50 ms", RowTone::Normal)));
        assert_eq!(value_of(&lines, "spare:"), None);

        let idle = telemetry.info_lines(&context(false));
        assert_eq!(value_of(&idle, "spare:"), Some(("1.00 ms", RowTone::Good)));
    }
}
