use serde::{Deserialize, Serialize};

/// Which panels are composited into the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Map on the left, video on the right.
    All,
    /// Map only, filling the whole surface.
    Map,
    /// Video only, fitted to the whole surface.
    Video,
}

impl RenderMode {
    /// Label shown in the info panel.
    pub fn label(&self) -> &'static str {
        match self {
            RenderMode::All => "both",
            RenderMode::Map => "map",
            RenderMode::Video => "video",
        }
    }

    /// Cycle All → Map → Video → All.
    pub fn next(&self) -> RenderMode {
        match self {
            RenderMode::All => RenderMode::Map,
            RenderMode::Map => RenderMode::Video,
            RenderMode::Video => RenderMode::All,
        }
    }

    pub fn shows_map(&self) -> bool {
        matches!(self, RenderMode::All | RenderMode::Map)
    }

    pub fn shows_video(&self) -> bool {
        matches!(self, RenderMode::All | RenderMode::Video)
    }
}

impl Default for RenderMode {
    fn default() -> Self {
        RenderMode::All
    }
}

impl std::fmt::Display for RenderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Which panel the user is currently panning/zooming. Display-only for the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollMode {
    None,
    Map,
    Video,
}

impl ScrollMode {
    pub fn label(&self) -> &'static str {
        match self {
            ScrollMode::None => "none",
            ScrollMode::Map => "map",
            ScrollMode::Video => "video",
        }
    }
}

impl Default for ScrollMode {
    fn default() -> Self {
        ScrollMode::None
    }
}

impl std::fmt::Display for ScrollMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// How the whole route polyline is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteRenderMode {
    /// Not drawn.
    None,
    /// One stroke in the route colour.
    Normal,
    /// Segment by segment, each coloured by its end point's pace colour.
    Pace,
}

impl Default for RouteRenderMode {
    fn default() -> Self {
        RouteRenderMode::Normal
    }
}
