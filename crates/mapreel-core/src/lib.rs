//! # mapreel-core
//!
//! Core types and primitives for the Mapreel frame pipeline.
//! This crate contains the types shared across all Mapreel crates:
//! frames, colors, matrices, time bases, route data, configuration and errors.

pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod math;
pub mod route;
pub mod time;
pub mod types;

pub use config::*;

pub use color::Color;
pub use error::{MapreelError, MapreelResult};
pub use frame::{DecodedFrame, FrameBuffer, PixelFormat, RenderedFrame};
pub use math::{Mat4, Point2D, Size2D};
pub use route::{
    NoStabilization, Route, RoutePlacement, RoutePoint, RouteSource, RouteStyle, Stabilization,
    StabilizationOffset, StaticRoute,
};
pub use time::{Rational, Timestamp, MICROS_PER_SECOND};
pub use types::{RenderMode, RouteRenderMode, ScrollMode};
