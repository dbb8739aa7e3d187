//! Border strips for stitching adjacent tiles by hand.
//!
//! A user exports the four 8px borders of their tile as a JSON bundle,
//! sends it to whoever draws the neighbouring tile, and that person imports
//! the matching side onto their own tile at half opacity.

use crate::codec::{self, CodecError, DATA_URL_PREFIX};
use crate::raster::Raster;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default strip thickness in logical pixels.
pub const EDGE_THICKNESS: u32 = 8;

/// Opacity used when drawing an imported strip.
pub const PREVIEW_OPACITY: f32 = 0.5;

/// A side of the tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Side {
    #[serde(rename = "L")]
    Left,
    #[default]
    #[serde(rename = "R")]
    Right,
    #[serde(rename = "T")]
    Top,
    #[serde(rename = "B")]
    Bottom,
}

impl Side {
    /// All sides in bundle order.
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Top, Side::Bottom];

    /// One-letter code used in the exchange format.
    pub fn code(self) -> &'static str {
        match self {
            Side::Left => "L",
            Side::Right => "R",
            Side::Top => "T",
            Side::Bottom => "B",
        }
    }

    /// Whether the strip runs the full height of the tile.
    pub fn is_vertical(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }

    /// Logical rectangle `(x, y, width, height)` of this side's strip.
    pub fn strip_rect(self, thickness: u32, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let tw = thickness.min(width);
        let th = thickness.min(height);
        match self {
            Side::Left => (0, 0, tw, height),
            Side::Right => (width - tw, 0, tw, height),
            Side::Top => (0, 0, width, th),
            Side::Bottom => (0, height - th, width, th),
        }
    }

    /// Where an imported strip of the given size lands on a tile.
    pub fn placement(self, strip_width: u32, strip_height: u32, width: u32, height: u32) -> (i64, i64) {
        match self {
            Side::Left | Side::Top => (0, 0),
            Side::Right => (width as i64 - strip_width as i64, 0),
            Side::Bottom => (0, height as i64 - strip_height as i64),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Side {
    type Err = EdgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" | "LEFT" => Ok(Side::Left),
            "R" | "RIGHT" => Ok(Side::Right),
            "T" | "TOP" => Ok(Side::Top),
            "B" | "BOTTOM" => Ok(Side::Bottom),
            _ => Err(EdgeError::UnknownSide(s.to_string())),
        }
    }
}

/// The four encoded border strips of a tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeBundle {
    #[serde(rename = "L")]
    pub left: String,
    #[serde(rename = "R")]
    pub right: String,
    #[serde(rename = "T")]
    pub top: String,
    #[serde(rename = "B")]
    pub bottom: String,
}

impl EdgeBundle {
    /// Strip for one side.
    pub fn get(&self, side: Side) -> &str {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
            Side::Top => &self.top,
            Side::Bottom => &self.bottom,
        }
    }

    /// Serialize as the `{"L":..,"R":..,"T":..,"B":..}` exchange object.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Errors importing an edge strip.
#[derive(Debug, Error)]
pub enum EdgeError {
    #[error("No edge code given")]
    EmptyInput,
    #[error("Invalid edge JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Edge JSON has no string entry for side {0}")]
    MissingSide(Side),
    #[error("Unknown side: {0}")]
    UnknownSide(String),
    #[error("Edge image could not be decoded: {0}")]
    Decode(#[from] CodecError),
}

impl EdgeError {
    /// Message shown to the user when an import is rejected.
    pub fn user_message(&self) -> &'static str {
        "Invalid edge code. Paste either a data URL or the full JSON from 'Copy edges'."
    }
}

/// Crop one side's strip at nominal resolution.
pub fn extract_strip(raster: &Raster, side: Side, thickness: u32) -> RgbaImage {
    let (x, y, w, h) = side.strip_rect(thickness, raster.width(), raster.height());
    raster.crop(x, y, w, h)
}

/// Encode one side's strip as a PNG data URL.
pub fn extract(raster: &Raster, side: Side, thickness: u32) -> Result<String, CodecError> {
    codec::encode_data_url(&extract_strip(raster, side, thickness))
}

/// Encode all four strips.
pub fn extract_all(raster: &Raster, thickness: u32) -> Result<EdgeBundle, CodecError> {
    Ok(EdgeBundle {
        left: extract(raster, Side::Left, thickness)?,
        right: extract(raster, Side::Right, thickness)?,
        top: extract(raster, Side::Top, thickness)?,
        bottom: extract(raster, Side::Bottom, thickness)?,
    })
}

/// Pick the encoded strip for `side` out of pasted input.
///
/// Input is either a bare data URL or a JSON object keyed by side code.
pub fn resolve_import(input: &str, side: Side) -> Result<String, EdgeError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(EdgeError::EmptyInput);
    }
    if input.starts_with(DATA_URL_PREFIX) {
        return Ok(input.to_string());
    }

    let value: serde_json::Value = serde_json::from_str(input)?;
    value
        .get(side.code())
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or(EdgeError::MissingSide(side))
}

/// Resolve and decode pasted input into strip pixels.
pub fn decode_import(input: &str, side: Side) -> Result<RgbaImage, EdgeError> {
    let encoded = resolve_import(input, side)?;
    Ok(codec::decode_data_url(&encoded)?)
}

/// Composite a decoded strip onto the raster at its side, half transparent.
pub fn apply_preview(raster: &mut Raster, side: Side, strip: &RgbaImage) {
    let (x, y) = side.placement(strip.width(), strip.height(), raster.width(), raster.height());
    log::debug!("Previewing {} edge ({}x{}) at ({}, {})", side, strip.width(), strip.height(), x, y);
    raster.draw_image(strip, x, y, PREVIEW_OPACITY);
}
