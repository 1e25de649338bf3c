//! Watermark specifications and request parsing

use serde::{Deserialize, Serialize};

use crate::color::{resolve_color, Rgb};
use crate::error::{Error, Result};

pub const DEFAULT_POSITION: &str = "center";
pub const DEFAULT_FONT_SIZE: f32 = 24.0;
pub const DEFAULT_COLOR: &str = "#000000";
pub const DEFAULT_OPACITY: f32 = 0.5;

/// One text stamp
///
/// Field names match the JSON dictionaries clients send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkSpec {
    /// Text to draw
    pub text: String,
    /// Anchor name, `custom`, or `"x,y"`
    #[serde(default = "default_position")]
    pub position: String,
    /// Horizontal offset for `custom` placement
    #[serde(default)]
    pub custom_x: Option<f32>,
    /// Offset from the top edge for `custom` placement
    #[serde(default)]
    pub custom_y: Option<f32>,
    /// Font size in points
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    /// Fill color as `#rrggbb`
    #[serde(default = "default_color")]
    pub color: String,
    /// Fill alpha, 0 (invisible) to 1 (opaque)
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    /// Counter-clockwise rotation in degrees around the text origin
    #[serde(default)]
    pub rotation: i32,
}

fn default_position() -> String {
    DEFAULT_POSITION.to_string()
}

fn default_font_size() -> f32 {
    DEFAULT_FONT_SIZE
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_opacity() -> f32 {
    DEFAULT_OPACITY
}

impl WatermarkSpec {
    /// A centered, half-transparent black stamp with the default size
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            position: default_position(),
            custom_x: None,
            custom_y: None,
            font_size: DEFAULT_FONT_SIZE,
            color: default_color(),
            opacity: DEFAULT_OPACITY,
            rotation: 0,
        }
    }

    /// Check every field except `position`, and return the parsed color
    ///
    /// Positions are resolved leniently later on; everything else must be
    /// exactly what the caller asked for.
    pub fn validate(&self) -> Result<Rgb> {
        if self.text.is_empty() {
            return Err(Error::InvalidWatermarkSpec("text must not be empty".to_string()));
        }
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(Error::InvalidWatermarkSpec(format!(
                "font size must be a positive number, got {}",
                self.font_size
            )));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(Error::InvalidWatermarkSpec(format!(
                "opacity must be between 0 and 1, got {}",
                self.opacity
            )));
        }
        for offset in [self.custom_x, self.custom_y].into_iter().flatten() {
            if !offset.is_finite() {
                return Err(Error::InvalidWatermarkSpec(format!(
                    "custom offset must be a finite number, got {offset}"
                )));
            }
        }

        resolve_color(&self.color)
    }
}

/// Body of a watermark request
///
/// Either a `watermarks` list, or the older single-watermark fields which
/// collapse into a one-element list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatermarkRequest {
    #[serde(default)]
    pub watermarks: Vec<WatermarkSpec>,
    #[serde(default)]
    pub watermark_text: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub font_size: Option<f32>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub opacity: Option<f32>,
    #[serde(default)]
    pub rotation: Option<i32>,
}

impl WatermarkRequest {
    /// Parse a request from JSON; a bare array is taken as the watermark list
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| Error::InvalidWatermarkSpec(format!("malformed request: {e}")))?;

        if value.is_array() {
            let watermarks = serde_json::from_value(value)
                .map_err(|e| Error::InvalidWatermarkSpec(e.to_string()))?;
            return Ok(Self {
                watermarks,
                ..Default::default()
            });
        }

        serde_json::from_value(value).map_err(|e| Error::InvalidWatermarkSpec(e.to_string()))
    }

    /// The watermark list this request asks for
    pub fn into_specs(self) -> Result<Vec<WatermarkSpec>> {
        if !self.watermarks.is_empty() {
            return Ok(self.watermarks);
        }

        match self.watermark_text {
            Some(text) if !text.is_empty() => {
                let mut spec = WatermarkSpec::new(text);
                if let Some(position) = self.position {
                    spec.position = position;
                }
                if let Some(font_size) = self.font_size {
                    spec.font_size = font_size;
                }
                if let Some(color) = self.color {
                    spec.color = color;
                }
                if let Some(opacity) = self.opacity {
                    spec.opacity = opacity;
                }
                if let Some(rotation) = self.rotation {
                    spec.rotation = rotation;
                }
                Ok(vec![spec])
            }
            _ => Err(Error::InvalidWatermarkSpec("no watermarks specified".to_string())),
        }
    }
}
