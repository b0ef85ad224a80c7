use crate::color::Color;
use crate::error::{MapreelError, MapreelResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Largest MSAA sample count accepted; the adapter decides what it actually supports.
pub const MAX_MULTISAMPLES: u32 = 16;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    /// MSAA sample count for the output surface: 1 (off) or 4.
    pub multisamples: u32,
    pub show_info_panel: bool,
    pub flip_output: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            multisamples: 4,
            show_info_panel: false,
            flip_output: false,
        }
    }
}

/// Placement and drawing options shared by the video and map panels.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PanelConfig {
    pub background_color: Color,
    /// Scissor the video to its panel. The map's clipping follows the render mode.
    pub enable_clipping: bool,
    pub enable_clearing: bool,
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub scale: f64,
    /// Name of the WGSL file (without extension) in the shader directory.
    pub rescale_shader: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            background_color: Color::BLACK,
            enable_clipping: true,
            enable_clearing: true,
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            scale: 1.0,
            rescale_shader: "bilinear".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MapConfig {
    #[serde(flatten)]
    pub panel: PanelConfig,
    /// Share of the output width given to the map when both panels are shown.
    pub relative_width: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            panel: PanelConfig::default(),
            relative_width: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShaderConfig {
    pub directory: PathBuf,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("data/shaders"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct InfoPanelConfig {
    /// TrueType font for the info panel. Common system fonts are tried when unset.
    pub font_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// ffmpeg video encoder name.
    pub codec: String,
    pub preset: String,
    pub crf: u32,
    /// Output frame rate; the input frame rate is used when unset.
    pub frame_rate: Option<f64>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            codec: "libx264".to_string(),
            preset: "veryfast".to_string(),
            crf: 23,
            frame_rate: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct MapreelConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub video: PanelConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub shaders: ShaderConfig,
    #[serde(default)]
    pub info_panel: InfoPanelConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
}

impl MapreelConfig {
    pub fn load_from_file(path: &Path) -> MapreelResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: MapreelConfig = toml::from_str(&contents)
            .map_err(|e| MapreelError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> MapreelResult<()> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| MapreelError::Config(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> MapreelResult<()> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(MapreelError::Config(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        let samples = self.window.multisamples;
        if !(samples.is_power_of_two() && samples <= MAX_MULTISAMPLES) {
            return Err(MapreelError::Config(format!(
                "multisamples must be a power of two up to {}, got {}",
                MAX_MULTISAMPLES,
                self.window.multisamples
            )));
        }
        if !(0.0..=1.0).contains(&self.map.relative_width) {
            return Err(MapreelError::Config(format!(
                "map.relative_width must be within [0, 1], got {}",
                self.map.relative_width
            )));
        }
        for (name, panel) in [("video", &self.video), ("map", &self.map.panel)] {
            if panel.scale.is_nan() || panel.scale <= 0.0 {
                return Err(MapreelError::Config(format!(
                    "{}.scale must be positive, got {}",
                    name, panel.scale
                )));
            }
            if panel.rescale_shader.trim().is_empty() {
                return Err(MapreelError::Config(format!(
                    "{}.rescale_shader must not be empty",
                    name
                )));
            }
        }
        if self.encoder.codec.trim().is_empty() {
            return Err(MapreelError::Config("encoder.codec must not be empty".into()));
        }
        if let Some(rate) = self.encoder.frame_rate {
            if rate.is_nan() || rate <= 0.0 {
                return Err(MapreelError::Config(format!(
                    "encoder.frame_rate must be positive, got {}",
                    rate
                )));
            }
        }
        if self.encoder.crf > 51 {
            return Err(MapreelError::Config(format!(
                "encoder.crf must be within [0, 51], got {}",
                self.encoder.crf
            )));
        }
        Ok(())
    }
}
