//! Panel placement and per-render-mode layout.
//!
//! Everything here is plain math: the compositor feeds the results to the GPU and the
//! overlay painter, so the same numbers drive both.

use mapreel_core::route::{RoutePlacement, StabilizationOffset};
use mapreel_core::{Color, Mat4, RenderMode};

/// Placement state of one panel.
///
/// `x`, `y`, `angle` and `scale` are set by the driver (the video scale is re-fitted every
/// frame); the `user_*` fields are runtime tunables; the offsets depend on the viewport and
/// are recomputed every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelPlacement {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub scale: f64,
    pub user_x: f64,
    pub user_y: f64,
    pub user_angle: f64,
    pub user_scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub texture_width: u32,
    pub texture_height: u32,
    pub clear_color: Color,
    pub clipping_enabled: bool,
    pub clearing_enabled: bool,
    pub enabled: bool,
    /// Share of the output width taken by the map when both panels are visible.
    pub relative_width: f64,
}

impl PanelPlacement {
    pub fn new(texture_width: u32, texture_height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            scale: 1.0,
            user_x: 0.0,
            user_y: 0.0,
            user_angle: 0.0,
            user_scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            texture_width,
            texture_height,
            clear_color: Color::BLACK,
            clipping_enabled: true,
            clearing_enabled: true,
            enabled: true,
            relative_width: 0.5,
        }
    }

    pub fn texel_width(&self) -> f64 {
        1.0 / self.texture_width.max(1) as f64
    }

    pub fn texel_height(&self) -> f64 {
        1.0 / self.texture_height.max(1) as f64
    }
}

/// The output surface as seen by the projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    /// Mirror the vertical axis of everything drawn.
    pub flip: bool,
}

impl Viewport {
    pub fn new(width: u32, height: u32, flip: bool) -> Self {
        Self {
            width,
            height,
            flip,
        }
    }

    /// Orthographic projection centred on the surface, y up (down when flipped).
    pub fn projection(&self) -> Mat4 {
        let half_w = self.width as f64 / 2.0;
        let half_h = self.height as f64 / 2.0;
        if self.flip {
            Mat4::orthographic(-half_w, half_w, half_h, -half_h, 0.0, 1.0)
        } else {
            Mat4::orthographic(-half_w, half_w, -half_h, half_h, 0.0, 1.0)
        }
    }
}

/// Scissor rectangle in target pixels, origin top-left, always inside the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ClipRect {
    pub fn full(viewport: &Viewport) -> Self {
        Self {
            x: 0,
            y: 0,
            width: viewport.width,
            height: viewport.height,
        }
    }

    /// Convert a rectangle whose `y` counts from the bottom edge, clamping it to the target.
    ///
    /// Returns `None` when nothing of it remains visible.
    pub fn from_bottom_left(x: i64, y: i64, width: i64, height: i64, viewport: &Viewport) -> Option<Self> {
        let target_w = viewport.width as i64;
        let target_h = viewport.height as i64;
        // a flipped projection mirrors content, so the rectangle follows it
        let top = if viewport.flip { y } else { target_h - (y + height) };

        let x0 = x.clamp(0, target_w);
        let x1 = (x + width).clamp(0, target_w);
        let y0 = top.clamp(0, target_h);
        let y1 = (top + height).clamp(0, target_h);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Self {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// Where a panel lands this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelClip {
    /// Draw without a scissor.
    Unclipped,
    Clipped(ClipRect),
    /// The clip rectangle is empty; skip the panel.
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelFrame {
    pub matrix: Mat4,
    pub clip: PanelClip,
}

impl PanelFrame {
    /// The scissor rectangle a partial clear of this panel covers.
    pub fn clear_rect(&self, viewport: &Viewport) -> Option<ClipRect> {
        match self.clip {
            PanelClip::Unclipped => Some(ClipRect::full(viewport)),
            PanelClip::Clipped(rect) => Some(rect),
            PanelClip::Hidden => None,
        }
    }
}

/// Render-mode dependent parts of the layout. Selected once per frame with [`layout_for`].
pub trait PanelLayout {
    fn mode(&self) -> RenderMode;

    fn shows_video(&self) -> bool;

    fn shows_map(&self) -> bool;

    /// Width the video is fitted into.
    fn video_available_width(&self, viewport: &Viewport, map_relative_width: f64) -> f64;

    fn video_offset_x(&self, viewport: &Viewport, map_relative_width: f64) -> f64;

    fn map_offset_x(&self, viewport: &Viewport, map_relative_width: f64) -> f64;

    /// Whether the map is confined to its share of the surface.
    fn map_clipped(&self) -> bool;
}

/// Map on the left, video on the right.
pub struct AllPanels;

/// Map fills the surface.
pub struct MapOnly;

/// Video fills the surface.
pub struct VideoOnly;

impl PanelLayout for AllPanels {
    fn mode(&self) -> RenderMode {
        RenderMode::All
    }

    fn shows_video(&self) -> bool {
        true
    }

    fn shows_map(&self) -> bool {
        true
    }

    fn video_available_width(&self, viewport: &Viewport, map_relative_width: f64) -> f64 {
        (1.0 - map_relative_width) * viewport.width as f64
    }

    fn video_offset_x(&self, viewport: &Viewport, map_relative_width: f64) -> f64 {
        viewport.width as f64 / 2.0 - self.video_available_width(viewport, map_relative_width) / 2.0
    }

    fn map_offset_x(&self, viewport: &Viewport, map_relative_width: f64) -> f64 {
        let width = viewport.width as f64;
        -(width / 2.0 - map_relative_width * width / 2.0)
    }

    fn map_clipped(&self) -> bool {
        true
    }
}

impl PanelLayout for MapOnly {
    fn mode(&self) -> RenderMode {
        RenderMode::Map
    }

    fn shows_video(&self) -> bool {
        false
    }

    fn shows_map(&self) -> bool {
        true
    }

    // video is hidden; fill the surface
    fn video_available_width(&self, viewport: &Viewport, _map_relative_width: f64) -> f64 {
        viewport.width as f64
    }

    fn video_offset_x(&self, _viewport: &Viewport, _map_relative_width: f64) -> f64 {
        0.0
    }

    fn map_offset_x(&self, _viewport: &Viewport, _map_relative_width: f64) -> f64 {
        0.0
    }

    fn map_clipped(&self) -> bool {
        false
    }
}

impl PanelLayout for VideoOnly {
    fn mode(&self) -> RenderMode {
        RenderMode::Video
    }

    fn shows_video(&self) -> bool {
        true
    }

    fn shows_map(&self) -> bool {
        false
    }

    fn video_available_width(&self, viewport: &Viewport, _map_relative_width: f64) -> f64 {
        viewport.width as f64
    }

    fn video_offset_x(&self, _viewport: &Viewport, _map_relative_width: f64) -> f64 {
        0.0
    }

    // map is hidden
    fn map_offset_x(&self, _viewport: &Viewport, _map_relative_width: f64) -> f64 {
        0.0
    }

    fn map_clipped(&self) -> bool {
        false
    }
}

pub fn layout_for(mode: RenderMode) -> &'static dyn PanelLayout {
    match mode {
        RenderMode::All => &AllPanels,
        RenderMode::Map => &MapOnly,
        RenderMode::Video => &VideoOnly,
    }
}

/// Fit the video, update its offsets and compute its transform and scissor.
pub fn place_video(
    layout: &dyn PanelLayout,
    video: &mut PanelPlacement,
    map_relative_width: f64,
    viewport: &Viewport,
    stabilization: StabilizationOffset,
) -> PanelFrame {
    let width = viewport.width as f64;
    let height = viewport.height as f64;
    let texture_width = video.texture_width.max(1) as f64;
    let texture_height = video.texture_height.max(1) as f64;

    video.offset_x = layout.video_offset_x(viewport, map_relative_width);
    video.scale = layout.video_available_width(viewport, map_relative_width) / texture_width;
    if video.scale * texture_height > height {
        video.scale = height / texture_height;
    }

    let total_scale = video.scale * video.user_scale;
    let matrix = viewport
        .projection()
        .translate(video.offset_x, video.offset_y)
        .translate(
            video.x + video.user_x + stabilization.x * texture_width * total_scale,
            video.y + video.user_y - stabilization.y * texture_height * total_scale,
        )
        .rotate_z(video.angle + video.user_angle - stabilization.angle)
        .scale(total_scale);

    let clip = if video.clipping_enabled {
        let panel_width = total_scale * texture_width;
        let panel_height = total_scale * texture_height;
        let left_margin = (width - panel_width) / 2.0;
        let bottom_margin = (height - panel_height) / 2.0;
        let rect = ClipRect::from_bottom_left(
            (left_margin + video.x + video.user_x + video.offset_x + 0.5) as i64,
            (bottom_margin + video.y + video.user_y + video.offset_y + 0.5) as i64,
            (panel_width + 0.5) as i64,
            (panel_height + 0.5) as i64,
            viewport,
        );
        rect.map_or(PanelClip::Hidden, PanelClip::Clipped)
    } else {
        PanelClip::Unclipped
    };

    PanelFrame { matrix, clip }
}

/// Total map scale including the route scale.
pub fn map_scale(map: &PanelPlacement, route: &RoutePlacement) -> f64 {
    map.scale * map.user_scale * route.scale
}

/// Update the map offsets and compute its transform and scissor.
pub fn place_map(
    layout: &dyn PanelLayout,
    map: &mut PanelPlacement,
    viewport: &Viewport,
    route: &RoutePlacement,
) -> PanelFrame {
    map.offset_x = layout.map_offset_x(viewport, map.relative_width);
    map.clipping_enabled = layout.map_clipped();

    let matrix = viewport
        .projection()
        .translate(map.offset_x, map.offset_y)
        .rotate_z(map.angle + map.user_angle + route.angle)
        .scale(map_scale(map, route))
        .translate(
            map.x + map.user_x + route.x,
            map.y + map.user_y + route.y,
        );

    let clip = match map_split_x(layout, map, viewport) {
        Some(split) => ClipRect::from_bottom_left(0, 0, split, viewport.height as i64, viewport)
            .map_or(PanelClip::Hidden, PanelClip::Clipped),
        None => PanelClip::Unclipped,
    };

    PanelFrame { matrix, clip }
}

/// X coordinate of the map/video boundary when the layout confines the map to its share.
pub fn map_split_x(layout: &dyn PanelLayout, map: &PanelPlacement, viewport: &Viewport) -> Option<i64> {
    if layout.map_clipped() {
        Some((map.relative_width * viewport.width as f64 + 0.5) as i64)
    } else {
        None
    }
}

/// Transform from route coordinates (map pixels from the image centre, y down) to
/// surface pixels (origin top-left, y down), matching the map panel transform.
pub fn route_transform(map: &PanelPlacement, viewport: &Viewport, route: &RoutePlacement) -> tiny_skia::Transform {
    let scale = map_scale(map, route) as f32;
    tiny_skia::Transform::from_translate(viewport.width as f32 / 2.0, viewport.height as f32 / 2.0)
        .pre_translate(map.offset_x as f32, -map.offset_y as f32)
        .pre_concat(tiny_skia::Transform::from_rotate(
            -(map.angle + map.user_angle + route.angle) as f32,
        ))
        .pre_scale(scale, scale)
        .pre_translate(
            (map.x + map.user_x + route.x) as f32,
            -(map.y + map.user_y + route.y) as f32,
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapreel_core::Point2D;

    fn viewport() -> Viewport {
        Viewport::new(1000, 500, false)
    }

    fn to_pixels(m: &Mat4, vp: &Viewport, p: Point2D) -> Point2D {
        let ndc = m.transform_point(p);
        Point2D::new(
            (ndc.x + 1.0) / 2.0 * vp.width as f64,
            (1.0 - ndc.y) / 2.0 * vp.height as f64,
        )
    }

    #[test]
    fn test_layout_selection() {
        assert_eq!(layout_for(RenderMode::All).mode(), RenderMode::All);
        assert!(!layout_for(RenderMode::Map).shows_video());
        assert!(!layout_for(RenderMode::Video).shows_map());
    }

    #[test]
    fn test_hidden_panels_get_neutral_offsets() {
        let vp = viewport();
        assert_eq!(MapOnly.video_offset_x(&vp, 0.3), 0.0);
        assert_eq!(MapOnly.video_available_width(&vp, 0.3), 1000.0);
        assert_eq!(VideoOnly.map_offset_x(&vp, 0.3), 0.0);
    }

    #[test]
    fn test_identity_map_placement_is_projection() {
        let vp = viewport();
        let mut map = PanelPlacement::new(800, 600);
        let frame = place_map(&MapOnly, &mut map, &vp, &RoutePlacement::default());
        assert!(frame.matrix.approx_eq(&vp.projection(), 1e-12));
        assert_eq!(frame.clip, PanelClip::Unclipped);
    }

    #[test]
    fn test_identity_video_placement_is_projection() {
        let vp = viewport();
        let mut video = PanelPlacement::new(1000, 400);
        let frame = place_video(&VideoOnly, &mut video, 0.5, &vp, StabilizationOffset::default());
        assert_eq!(video.scale, 1.0);
        assert!(frame.matrix.approx_eq(&vp.projection(), 1e-12));
    }

    #[test]
    fn test_split_scissors_at_relative_width() {
        let vp = viewport();
        let mut map = PanelPlacement::new(800, 600);
        map.relative_width = 0.3;
        let mut video = PanelPlacement::new(1400, 800);

        let map_frame = place_map(&AllPanels, &mut map, &vp, &RoutePlacement::default());
        let video_frame = place_video(&AllPanels, &mut video, 0.3, &vp, StabilizationOffset::default());

        let PanelClip::Clipped(map_rect) = map_frame.clip else {
            panic!("map should be clipped");
        };
        assert_eq!((map_rect.x, map_rect.right()), (0, 300));
        assert_eq!((map_rect.y, map_rect.height), (0, 500));

        let PanelClip::Clipped(video_rect) = video_frame.clip else {
            panic!("video should be clipped");
        };
        assert_eq!((video_rect.x, video_rect.right()), (300, 1000));
        assert_eq!((video_rect.y, video_rect.bottom()), (50, 450));
        assert!((video.scale - 0.5).abs() < 1e-12);
        assert_eq!(video.offset_x, 150.0);
        assert_eq!(map.offset_x, -350.0);
    }

    #[test]
    fn test_video_fit_clamps_to_height() {
        let vp = viewport();
        let mut video = PanelPlacement::new(400, 1000);
        place_video(&VideoOnly, &mut video, 0.5, &vp, StabilizationOffset::default());
        assert!((video.scale - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_video_center_lands_in_its_half() {
        let vp = viewport();
        let mut video = PanelPlacement::new(1400, 800);
        let frame = place_video(&AllPanels, &mut video, 0.3, &vp, StabilizationOffset::default());
        let center = to_pixels(&frame.matrix, &vp, Point2D::zero());
        assert!((center.x - 650.0).abs() < 1e-9);
        assert!((center.y - 250.0).abs() < 1e-9);
        let corner = to_pixels(&frame.matrix, &vp, Point2D::new(-700.0, 400.0));
        assert!((corner.x - 300.0).abs() < 1e-9);
        assert!((corner.y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_stabilization_shifts_video() {
        let vp = viewport();
        let mut video = PanelPlacement::new(1000, 400);
        let stab = StabilizationOffset {
            x: 0.1,
            y: 0.25,
            angle: 0.0,
        };
        let frame = place_video(&VideoOnly, &mut video, 0.5, &vp, stab);
        let center = to_pixels(&frame.matrix, &vp, Point2D::zero());
        // +x moves right by 10% of the panel width, +y moves down by 25% of its height
        assert!((center.x - 600.0).abs() < 1e-9);
        assert!((center.y - 350.0).abs() < 1e-9);
    }

    #[test]
    fn test_hidden_when_clip_leaves_target() {
        let vp = viewport();
        let mut video = PanelPlacement::new(1000, 400);
        video.user_x = 5000.0;
        let frame = place_video(&VideoOnly, &mut video, 0.5, &vp, StabilizationOffset::default());
        assert_eq!(frame.clip, PanelClip::Hidden);
        assert_eq!(frame.clear_rect(&vp), None);
    }

    #[test]
    fn test_clip_rect_clamps_and_flips() {
        let vp = viewport();
        let rect = ClipRect::from_bottom_left(-10, -10, 110, 60, &vp).unwrap();
        assert_eq!(rect, ClipRect { x: 0, y: 450, width: 100, height: 50 });

        let flipped = Viewport::new(1000, 500, true);
        let rect = ClipRect::from_bottom_left(0, 0, 100, 50, &flipped).unwrap();
        assert_eq!(rect, ClipRect { x: 0, y: 0, width: 100, height: 50 });

        assert!(ClipRect::from_bottom_left(1000, 0, 10, 10, &vp).is_none());
    }

    #[test]
    fn test_map_clipping_follows_layout() {
        let vp = viewport();
        let mut map = PanelPlacement::new(800, 600);
        map.clipping_enabled = false;
        assert_eq!(map_split_x(&AllPanels, &map, &vp), Some(500));
        let frame = place_map(&AllPanels, &mut map, &vp, &RoutePlacement::default());
        assert!(map.clipping_enabled);
        let PanelClip::Clipped(rect) = frame.clip else {
            panic!("map should stay clipped while the video is visible");
        };
        assert_eq!((rect.x, rect.right()), (0, 500));

        let frame = place_map(&MapOnly, &mut map, &vp, &RoutePlacement::default());
        assert!(!map.clipping_enabled);
        assert_eq!(map_split_x(&MapOnly, &map, &vp), None);
        assert_eq!(frame.clip, PanelClip::Unclipped);
    }

    #[test]
    fn test_route_transform_matches_map_panel() {
        let vp = viewport();
        let mut map = PanelPlacement::new(800, 600);
        map.relative_width = 0.4;
        map.user_angle = 30.0;
        map.user_scale = 1.5;
        map.user_x = 12.0;
        map.user_y = -7.0;
        let route = RoutePlacement {
            x: 3.0,
            y: 4.0,
            angle: 10.0,
            scale: 0.8,
        };
        let frame = place_map(&AllPanels, &mut map, &vp, &route);
        let transform = route_transform(&map, &vp, &route);

        // route point (px, py) with y down is panel vertex (px, -py)
        for (px, py) in [(0.0, 0.0), (100.0, 50.0), (-250.0, 120.0)] {
            let expected = to_pixels(&frame.matrix, &vp, Point2D::new(px, -py));
            let mut points = [tiny_skia::Point::from_xy(px as f32, py as f32)];
            transform.map_points(&mut points);
            assert!((points[0].x as f64 - expected.x).abs() < 1e-2, "{:?} vs {:?}", points[0], expected);
            assert!((points[0].y as f64 - expected.y).abs() < 1e-2, "{:?} vs {:?}", points[0], expected);
        }
    }
}
