//! Route and stabilization data consumed by the compositor.
//!
//! Route coordinates are map pixels relative to the map image centre, y pointing down.

use crate::color::Color;
use crate::error::{MapreelError, MapreelResult};
use crate::math::Point2D;
use crate::types::RouteRenderMode;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One sample of the route polyline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub position: Point2D,
    /// Pace colour of the segment ending at this point.
    #[serde(default = "default_pace_color")]
    pub color: Color,
}

fn default_pace_color() -> Color {
    Color::RED
}

/// Drawing style of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteStyle {
    pub render_mode: RouteRenderMode,
    pub width: f64,
    pub color: Color,
    pub show_controls: bool,
    pub control_radius: f64,
    pub control_border_width: f64,
    pub control_border_color: Color,
    pub show_runner: bool,
    pub runner_color: Color,
    pub runner_border_width: f64,
    pub runner_border_color: Color,
    pub runner_scale: f64,
}

impl Default for RouteStyle {
    fn default() -> Self {
        Self {
            render_mode: RouteRenderMode::Normal,
            width: 15.0,
            color: Color::rgba(1.0, 0.0, 0.0, 0.5),
            show_controls: true,
            control_radius: 24.0,
            control_border_width: 4.0,
            control_border_color: Color::rgba(0.9, 0.0, 0.9, 0.8),
            show_runner: true,
            runner_color: Color::rgb(0.0, 0.75, 1.0),
            runner_border_width: 1.0,
            runner_border_color: Color::BLACK,
            runner_scale: 1.0,
        }
    }
}

impl RouteStyle {
    /// Radius of the runner marker before user scaling.
    pub fn runner_radius(&self) -> f64 {
        (self.width / 2.0 - self.runner_border_width / 2.0) * self.runner_scale
    }
}

/// A route ready for drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub points: Vec<RoutePoint>,
    #[serde(default)]
    pub controls: Vec<Point2D>,
    #[serde(default)]
    pub runner: Option<Point2D>,
    #[serde(default)]
    pub style: RouteStyle,
    #[serde(default = "default_user_scale")]
    pub user_scale: f64,
    /// Seconds; shown in the info panel.
    #[serde(default)]
    pub control_time_offset: f64,
    #[serde(default)]
    pub runner_time_offset: f64,
}

fn default_user_scale() -> f64 {
    1.0
}

impl Default for Route {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            controls: Vec::new(),
            runner: None,
            style: RouteStyle::default(),
            user_scale: 1.0,
            control_time_offset: 0.0,
            runner_time_offset: 0.0,
        }
    }
}

impl Route {
    pub fn load_from_file(path: &Path) -> MapreelResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MapreelError::asset(format!("cannot read route: {}", e), path))?;
        let route: Route = serde_json::from_str(&contents)?;
        if route.user_scale <= 0.0 {
            return Err(MapreelError::asset("route user_scale must be positive", path));
        }
        Ok(route)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.controls.is_empty() && self.runner.is_none()
    }
}

/// Where the route sits relative to the map image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutePlacement {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub scale: f64,
}

impl Default for RoutePlacement {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            scale: 1.0,
        }
    }
}

/// Supplies the route to draw and its placement on the map.
pub trait RouteSource {
    fn route(&self) -> &Route;
    fn placement(&self) -> RoutePlacement;
}

/// A fixed route with a fixed placement.
#[derive(Debug, Clone, Default)]
pub struct StaticRoute {
    pub route: Route,
    pub placement: RoutePlacement,
}

impl StaticRoute {
    pub fn new(route: Route) -> Self {
        Self {
            route,
            placement: RoutePlacement::default(),
        }
    }
}

impl RouteSource for StaticRoute {
    fn route(&self) -> &Route {
        &self.route
    }

    fn placement(&self) -> RoutePlacement {
        self.placement
    }
}

/// Per-frame correction reported by a video stabilizer.
///
/// `x` and `y` are fractions of the video texture size; `angle` is in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StabilizationOffset {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
}

pub trait Stabilization {
    fn offset(&self) -> StabilizationOffset;
}

/// Stabilizer stand-in that never moves the video.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStabilization;

impl Stabilization for NoStabilization {
    fn offset(&self) -> StabilizationOffset {
        StabilizationOffset::default()
    }
}

impl Stabilization for StabilizationOffset {
    fn offset(&self) -> StabilizationOffset {
        *self
    }
}
