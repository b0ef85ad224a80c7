//! Vector overlay drawn on the CPU: route, map divider and info panel.
//!
//! Drawing happens into a surface-sized premultiplied RGBA pixmap that the compositor uploads
//! and blends over the panels.

use std::path::{Path, PathBuf};

use fontdue::{Font, FontSettings};
use tiny_skia::{
    FillRule, LineCap, LineJoin, Mask, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform,
};

use mapreel_core::{Color, MapreelError, MapreelResult, Route, RouteRenderMode};

use crate::telemetry::{InfoLine, RowTone};

const INFO_FONT_SIZE: f32 = 13.0;
const INFO_TEXT_X: f32 = 10.0;
const INFO_TEXT_Y: f32 = 6.0;
const INFO_COLUMN_MARGIN: f32 = 15.0;
const INFO_BACKGROUND_RADIUS: f32 = 10.0;

const INFO_TEXT_COLOR: [u8; 4] = [255, 255, 255, 200];
const INFO_GOOD_COLOR: [u8; 4] = [0, 255, 0, 200];
const INFO_BAD_COLOR: [u8; 4] = [255, 0, 0, 200];
const INFO_BACKGROUND_COLOR: [u8; 4] = [20, 20, 20, 220];

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Load a TrueType font from a file.
pub fn load_font(path: &Path) -> MapreelResult<Font> {
    let data = std::fs::read(path)
        .map_err(|e| MapreelError::asset(format!("failed to read font file: {}", e), path))?;
    Font::from_bytes(data, FontSettings::default())
        .map_err(|e| MapreelError::asset(format!("failed to parse font: {}", e), path))
}

/// Load the configured font, or the first usable system font.
pub fn find_font(configured: Option<&Path>) -> Option<Font> {
    if let Some(path) = configured {
        match load_font(path) {
            Ok(font) => return Some(font),
            Err(e) => tracing::warn!("{}", e),
        }
    }
    let found = FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .filter(|path| path.exists())
        .find_map(|path| load_font(&path).ok());
    if found.is_none() {
        tracing::warn!("No font found for the info panel, text will not be drawn");
    }
    found
}

fn skia_color(color: &Color) -> tiny_skia::Color {
    let [r, g, b, a] = color.to_rgba8();
    tiny_skia::Color::from_rgba8(r, g, b, a)
}

fn solid_paint(color: tiny_skia::Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    paint
}

fn round_stroke(width: f64) -> Stroke {
    Stroke {
        width: width.max(0.0) as f32,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    }
}

fn rounded_rect(x: f32, y: f32, width: f32, height: f32, radius: f32) -> Option<tiny_skia::Path> {
    let r = radius.min(width / 2.0).min(height / 2.0).max(0.0);
    let (right, bottom) = (x + width, y + height);
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(right - r, y);
    pb.quad_to(right, y, right, y + r);
    pb.line_to(right, bottom - r);
    pb.quad_to(right, bottom, right - r, bottom);
    pb.line_to(x + r, bottom);
    pb.quad_to(x, bottom, x, bottom - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    pb.finish()
}

/// CPU canvas for everything drawn on top of the panels.
pub struct OverlayPainter {
    pixmap: Pixmap,
    font: Option<Font>,
    dirty: bool,
}

impl OverlayPainter {
    pub fn new(width: u32, height: u32, font: Option<Font>) -> MapreelResult<Self> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            MapreelError::Allocation(format!("cannot allocate {}x{} overlay", width, height))
        })?;
        Ok(Self {
            pixmap,
            font,
            dirty: false,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> MapreelResult<()> {
        self.pixmap = Pixmap::new(width, height).ok_or_else(|| {
            MapreelError::Allocation(format!("cannot allocate {}x{} overlay", width, height))
        })?;
        self.dirty = false;
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Whether anything was drawn since the last clear.
    pub fn has_content(&self) -> bool {
        self.dirty
    }

    /// Premultiplied RGBA rows, `width * 4` bytes each.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let p = self.pixmap.pixel(x, y)?;
        Some([p.red(), p.green(), p.blue(), p.alpha()])
    }

    pub fn clear(&mut self) {
        if self.dirty {
            self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
            self.dirty = false;
        }
    }

    /// Mask limiting drawing to the columns left of `width`.
    fn left_mask(&self, width: u32) -> Option<Mask> {
        let mut mask = Mask::new(self.pixmap.width(), self.pixmap.height())?;
        let rect = Rect::from_xywh(0.0, 0.0, width as f32, self.pixmap.height() as f32)?;
        let path = PathBuilder::from_rect(rect);
        mask.fill_path(&path, FillRule::Winding, false, Transform::identity());
        Some(mask)
    }

    /// Draw the route, its controls and the runner through `transform`.
    ///
    /// With `clip_width` set, nothing is drawn right of that column.
    pub fn draw_route(&mut self, route: &Route, transform: Transform, clip_width: Option<u32>) {
        let mask = match clip_width {
            Some(0) => return,
            Some(width) => match self.left_mask(width) {
                Some(mask) => Some(mask),
                None => return,
            },
            None => None,
        };
        let mask = mask.as_ref();
        let style = &route.style;
        let line = round_stroke(style.width * route.user_scale);

        match style.render_mode {
            RouteRenderMode::None => {}
            RouteRenderMode::Normal => {
                let mut pb = PathBuilder::new();
                let mut points = route.points.iter();
                if let Some(first) = points.next() {
                    pb.move_to(first.position.x as f32, first.position.y as f32);
                    for point in points {
                        pb.line_to(point.position.x as f32, point.position.y as f32);
                    }
                }
                if let Some(path) = pb.finish() {
                    let paint = solid_paint(skia_color(&style.color));
                    self.pixmap.stroke_path(&path, &paint, &line, transform, mask);
                    self.dirty = true;
                }
            }
            RouteRenderMode::Pace => {
                for pair in route.points.windows(2) {
                    let (from, to) = (&pair[0], &pair[1]);
                    let mut pb = PathBuilder::new();
                    pb.move_to(from.position.x as f32, from.position.y as f32);
                    pb.line_to(to.position.x as f32, to.position.y as f32);
                    if let Some(path) = pb.finish() {
                        let paint = solid_paint(skia_color(&to.color));
                        self.pixmap.stroke_path(&path, &paint, &line, transform, mask);
                        self.dirty = true;
                    }
                }
            }
        }

        if style.show_controls {
            let border = round_stroke(style.control_border_width * route.user_scale);
            let radius = (style.control_radius * route.user_scale) as f32;
            let paint = solid_paint(skia_color(&style.control_border_color));
            for control in &route.controls {
                if let Some(circle) = PathBuilder::from_circle(control.x as f32, control.y as f32, radius) {
                    self.pixmap.stroke_path(&circle, &paint, &border, transform, mask);
                    self.dirty = true;
                }
            }
        }

        if style.show_runner {
            if let Some(runner) = route.runner {
                let radius = (style.runner_radius() * route.user_scale) as f32;
                if let Some(circle) = PathBuilder::from_circle(runner.x as f32, runner.y as f32, radius) {
                    let fill = solid_paint(skia_color(&style.runner_color));
                    self.pixmap
                        .fill_path(&circle, &fill, FillRule::Winding, transform, mask);
                    let border = round_stroke(style.runner_border_width * route.user_scale);
                    let paint = solid_paint(skia_color(&style.runner_border_color));
                    self.pixmap.stroke_path(&circle, &paint, &border, transform, mask);
                    self.dirty = true;
                }
            }
        }
    }

    /// One pixel wide black line over the full height at column `x`.
    pub fn draw_divider(&mut self, x: i64) {
        if x < 0 || x >= self.pixmap.width() as i64 {
            return;
        }
        if let Some(rect) = Rect::from_xywh(x as f32, 0.0, 1.0, self.pixmap.height() as f32) {
            let mut paint = solid_paint(tiny_skia::Color::BLACK);
            paint.anti_alias = false;
            self.pixmap.fill_rect(rect, &paint, Transform::identity(), None);
            self.dirty = true;
        }
    }

    /// Draw the info panel in the top-left corner.
    pub fn draw_info_panel(&mut self, lines: &[InfoLine]) {
        let (line_height, line_spacing, label_width, value_width) = match &self.font {
            Some(font) => {
                let metrics = font.horizontal_line_metrics(INFO_FONT_SIZE);
                let line_height = metrics.map_or(INFO_FONT_SIZE * 1.2, |m| m.new_line_size);
                (
                    line_height,
                    line_height + 1.0,
                    text_width(font, "control offset:", INFO_FONT_SIZE),
                    text_width(font, "99:99:99.999", INFO_FONT_SIZE),
                )
            }
            None => {
                let line_height = INFO_FONT_SIZE * 1.2;
                (line_height, line_height + 1.0, INFO_FONT_SIZE * 8.0, INFO_FONT_SIZE * 6.0)
            }
        };

        let background_width = INFO_TEXT_X
            + INFO_BACKGROUND_RADIUS
            + label_width
            + INFO_COLUMN_MARGIN
            + value_width
            + 10.0;
        let background_height = line_spacing * (lines.len() as f32 + 1.0) + INFO_TEXT_Y + 3.0;

        if let Some(path) = rounded_rect(
            -INFO_BACKGROUND_RADIUS,
            -INFO_BACKGROUND_RADIUS,
            background_width,
            background_height,
            INFO_BACKGROUND_RADIUS,
        ) {
            let [r, g, b, a] = INFO_BACKGROUND_COLOR;
            let fill = solid_paint(tiny_skia::Color::from_rgba8(r, g, b, a));
            self.pixmap
                .fill_path(&path, &fill, FillRule::Winding, Transform::identity(), None);
            let border = solid_paint(tiny_skia::Color::BLACK);
            self.pixmap.stroke_path(
                &path,
                &border,
                &Stroke::default(),
                Transform::identity(),
                None,
            );
            self.dirty = true;
        }

        let Some(font) = self.font.take() else {
            return;
        };
        let value_x = INFO_TEXT_X + label_width + INFO_COLUMN_MARGIN;
        let mut top = INFO_TEXT_Y;
        for line in lines {
            if let InfoLine::Row { label, value, tone } = line {
                let value_color = match tone {
                    RowTone::Normal => INFO_TEXT_COLOR,
                    RowTone::Good => INFO_GOOD_COLOR,
                    RowTone::Bad => INFO_BAD_COLOR,
                };
                self.draw_text(&font, label, INFO_TEXT_X, top, line_height, INFO_TEXT_COLOR);
                self.draw_text(&font, value, value_x, top, line_height, value_color);
            }
            top += line_spacing;
        }
        self.font = Some(font);
    }

    /// Rasterize `text` with its line box starting at (`x`, `top`).
    fn draw_text(&mut self, font: &Font, text: &str, x: f32, top: f32, line_height: f32, rgba: [u8; 4]) {
        let ascent = font
            .horizontal_line_metrics(INFO_FONT_SIZE)
            .map_or(line_height * 0.8, |m| m.ascent);
        let baseline = (top + ascent).round() as i32;
        let width = self.pixmap.width() as i32;
        let height = self.pixmap.height() as i32;
        let stride = self.pixmap.width() as usize * 4;
        let data = self.pixmap.data_mut();

        let mut cursor_x = x;
        for ch in text.chars() {
            let (metrics, bitmap) = font.rasterize(ch, INFO_FONT_SIZE);
            let glyph_x = cursor_x.round() as i32 + metrics.xmin;
            let glyph_y = baseline - (metrics.height as i32 + metrics.ymin);

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let coverage = bitmap[gy * metrics.width + gx];
                    if coverage == 0 {
                        continue;
                    }
                    let px = glyph_x + gx as i32;
                    let py = glyph_y + gy as i32;
                    if px < 0 || px >= width || py < 0 || py >= height {
                        continue;
                    }
                    let offset = py as usize * stride + px as usize * 4;
                    blend_premultiplied(&mut data[offset..offset + 4], rgba, coverage);
                }
            }
            cursor_x += metrics.advance_width;
        }
        self.dirty = true;
    }
}

fn text_width(font: &Font, text: &str, size: f32) -> f32 {
    text.chars().map(|ch| font.metrics(ch, size).advance_width).sum()
}

/// Source-over blend of a straight-alpha colour with glyph coverage into a premultiplied pixel.
fn blend_premultiplied(dst: &mut [u8], rgba: [u8; 4], coverage: u8) {
    let alpha = rgba[3] as u32 * coverage as u32 / 255;
    let inverse = 255 - alpha;
    for i in 0..3 {
        let src = rgba[i] as u32 * alpha / 255;
        dst[i] = (src + dst[i] as u32 * inverse / 255).min(255) as u8;
    }
    dst[3] = (alpha + dst[3] as u32 * inverse / 255).min(255) as u8;
}
