//! Tile configuration.

use crate::edges::EDGE_THICKNESS;
use crate::overlay::GridSpacing;
use crate::raster::{TILE_HEIGHT, TILE_WIDTH};
use crate::tools::{Brush, Color};
use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up in the data directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Largest accepted logical tile side.
pub const MAX_TILE_SIDE: u32 = 4096;

/// Accepted backing store scale factors.
pub const MIN_SCALE: f64 = 0.5;
pub const MAX_SCALE: f64 = 4.0;

/// Errors loading a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Settings for a tile session. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileConfig {
    /// Logical tile width.
    pub width: u32,
    /// Logical tile height.
    pub height: u32,
    /// Device scale factor for the backing store; the display's when absent.
    pub scale: Option<f64>,
    /// Border strip thickness for edge export.
    pub edge_thickness: u32,
    /// Maximum undo entries; unbounded when absent.
    pub history_limit: Option<usize>,
    /// Grid spacing at startup.
    pub grid: GridSpacing,
    /// Stroke color at startup.
    pub color: Color,
    /// Brush width at startup.
    pub brush_width: u32,
    /// Font used by the sign tool; the embedded font when absent.
    pub font_path: Option<PathBuf>,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            width: TILE_WIDTH,
            height: TILE_HEIGHT,
            scale: None,
            edge_thickness: EDGE_THICKNESS,
            history_limit: None,
            grid: GridSpacing::default(),
            color: Color::INK,
            brush_width: 6,
            font_path: None,
        }
    }
}

impl TileConfig {
    /// Parse a config from JSON, rejecting sizes the tile cannot use.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Self = serde_json::from_str(json)?;
        config.validate().map_err(serde_json::Error::custom)?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        for (name, side) in [("width", self.width), ("height", self.height)] {
            if !(1..=MAX_TILE_SIDE).contains(&side) {
                return Err(format!("{} must be between 1 and {}, got {}", name, MAX_TILE_SIDE, side));
            }
        }
        if let Some(scale) = self.scale {
            if !(MIN_SCALE..=MAX_SCALE).contains(&scale) {
                return Err(format!("scale must be between {} and {}, got {}", MIN_SCALE, MAX_SCALE, scale));
            }
        }
        let max_thickness = self.width.min(self.height);
        if !(1..=max_thickness).contains(&self.edge_thickness) {
            return Err(format!(
                "edge_thickness must be between 1 and {}, got {}",
                max_thickness, self.edge_thickness
            ));
        }
        Ok(())
    }

    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load a config file if it exists, falling back to defaults.
    ///
    /// A missing file is silent; an unreadable or malformed one is logged.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    /// Backing store scale, 1.0 unless set. Display factors outside the
    /// accepted range are clamped.
    pub fn scale_factor(&self) -> f64 {
        match self.scale {
            Some(scale) if scale.is_finite() => scale.clamp(MIN_SCALE, MAX_SCALE),
            _ => 1.0,
        }
    }

    /// Brush derived from the startup color and width.
    pub fn brush(&self) -> Brush {
        Brush::new(self.color, self.brush_width)
    }
}
