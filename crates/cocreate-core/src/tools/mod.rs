//! Tool selection and brush settings.

use image::Rgba;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest selectable brush width.
pub const MIN_BRUSH_WIDTH: u32 = 1;
/// Largest selectable brush width.
pub const MAX_BRUSH_WIDTH: u32 = 48;
/// Smallest font size used by the sign tool.
pub const MIN_SIGN_FONT_SIZE: f32 = 14.0;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Pen,
    Eraser,
    Sign,
}

impl ToolKind {
    /// All tools in toolbar order.
    pub const ALL: [ToolKind; 3] = [ToolKind::Pen, ToolKind::Eraser, ToolKind::Sign];

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            ToolKind::Pen => "Pen",
            ToolKind::Eraser => "Eraser",
            ToolKind::Sign => "Sign",
        }
    }

    /// Whether a pointer press starts a freehand stroke.
    pub fn draws_strokes(self) -> bool {
        matches!(self, ToolKind::Pen | ToolKind::Eraser)
    }

    /// How this tool composites onto the raster.
    pub fn composite(self) -> Composite {
        match self {
            ToolKind::Pen | ToolKind::Sign => Composite::SourceOver,
            ToolKind::Eraser => Composite::DestinationOut,
        }
    }
}

/// Pixel compositing mode for strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composite {
    /// Paint the stroke color over existing pixels.
    SourceOver,
    /// Remove existing pixels where the stroke covers them.
    DestinationOut,
}

/// An opaque sRGB color parsed from `#rrggbb` notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Default stroke color (`#111827`).
    pub const INK: Color = Color::rgb(0x11, 0x18, 0x27);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pixel value with the given alpha.
    pub fn to_rgba(self, alpha: u8) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, alpha])
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::INK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Error for color strings that are not `#rgb` or `#rrggbb`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid color: {0}")]
pub struct ParseColorError(pub String);

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16);
        match hex.len() {
            6 => Ok(Color::rgb(
                channel(0..2).map_err(|_| err())?,
                channel(2..4).map_err(|_| err())?,
                channel(4..6).map_err(|_| err())?,
            )),
            3 => {
                let short = |i: usize| channel(i..i + 1).map(|v| v * 17).map_err(|_| err());
                Ok(Color::rgb(short(0)?, short(1)?, short(2)?))
            }
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Current brush used by new strokes and stamps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    pub color: Color,
    width: u32,
}

impl Default for Brush {
    fn default() -> Self {
        Self { color: Color::INK, width: 6 }
    }
}

impl Brush {
    pub fn new(color: Color, width: u32) -> Self {
        Self { color, width: width.clamp(MIN_BRUSH_WIDTH, MAX_BRUSH_WIDTH) }
    }

    /// Stroke width in logical pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Set the width, clamped to the selectable range.
    pub fn set_width(&mut self, width: u32) {
        self.width = width.clamp(MIN_BRUSH_WIDTH, MAX_BRUSH_WIDTH);
    }

    /// Font size for the sign tool at this brush width.
    pub fn sign_font_size(&self) -> f32 {
        (self.width as f32 * 3.0).max(MIN_SIGN_FONT_SIZE)
    }
}
