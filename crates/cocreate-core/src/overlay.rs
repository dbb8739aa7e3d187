//! Alignment grid drawn above the tile.
//!
//! The grid is a separate layer: it is never composited into the raster and
//! never persisted.

use crate::raster::{TILE_HEIGHT, TILE_WIDTH};
use crate::tools::Color;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grid line color (`#9ca3af`).
pub const GRID_COLOR: Color = Color::rgb(0x9c, 0xa3, 0xaf);

/// Grid line opacity.
pub const GRID_OPACITY: f32 = 0.25;

/// Spacing between grid lines in logical pixels; zero hides the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct GridSpacing(u32);

impl GridSpacing {
    /// Hidden grid.
    pub const OFF: GridSpacing = GridSpacing(0);

    /// Selectable spacings, in menu order.
    pub const OPTIONS: [GridSpacing; 7] = [
        GridSpacing(0),
        GridSpacing(12),
        GridSpacing(16),
        GridSpacing(24),
        GridSpacing(32),
        GridSpacing(48),
        GridSpacing(64),
    ];

    /// Look up a selectable spacing.
    pub fn from_px(px: u32) -> Option<Self> {
        Self::OPTIONS.into_iter().find(|g| g.0 == px)
    }

    /// Spacing in pixels (zero when off).
    pub fn px(self) -> u32 {
        self.0
    }

    /// Check if the grid is shown.
    pub fn is_enabled(self) -> bool {
        self.0 > 0
    }

    /// Menu label.
    pub fn label(self) -> String {
        self.to_string()
    }
}

impl Default for GridSpacing {
    fn default() -> Self {
        GridSpacing(24)
    }
}

impl fmt::Display for GridSpacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_enabled() {
            write!(f, "{}", self.0)
        } else {
            f.write_str("Off")
        }
    }
}

impl TryFrom<u32> for GridSpacing {
    type Error = String;

    fn try_from(px: u32) -> Result<Self, Self::Error> {
        GridSpacing::from_px(px).ok_or_else(|| format!("unsupported grid spacing {}", px))
    }
}

impl From<GridSpacing> for u32 {
    fn from(spacing: GridSpacing) -> Self {
        spacing.0
    }
}

/// A single grid line, positioned on the pixel center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridLine {
    /// Vertical line at the given x.
    Vertical(f64),
    /// Horizontal line at the given y.
    Horizontal(f64),
}

/// Grid lines for a tile of the given size.
///
/// Lines sit at every multiple of the spacing strictly inside the tile.
pub fn grid_lines(spacing: GridSpacing, width: u32, height: u32) -> Vec<GridLine> {
    if !spacing.is_enabled() {
        return Vec::new();
    }
    let step = spacing.px() as usize;
    let vertical = (step..width as usize)
        .step_by(step)
        .map(|x| GridLine::Vertical(x as f64 + 0.5));
    let horizontal = (step..height as usize)
        .step_by(step)
        .map(|y| GridLine::Horizontal(y as f64 + 0.5));
    vertical.chain(horizontal).collect()
}

/// Rasterize the grid into a transparent layer at backing resolution.
pub fn render_layer(spacing: GridSpacing, width: u32, height: u32, scale: f64) -> RgbaImage {
    let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
    let backing_w = ((width as f64 * scale).round() as u32).max(1);
    let backing_h = ((height as f64 * scale).round() as u32).max(1);
    let mut layer = RgbaImage::new(backing_w, backing_h);
    let line = GRID_COLOR.to_rgba((GRID_OPACITY * 255.0).round() as u8);
    let thickness = (scale.round() as u32).max(1);

    for grid_line in grid_lines(spacing, width, height) {
        match grid_line {
            GridLine::Vertical(x) => {
                let start = ((x - 0.5) * scale).round() as u32;
                for px in start..(start + thickness).min(backing_w) {
                    for py in 0..backing_h {
                        layer.put_pixel(px, py, line);
                    }
                }
            }
            GridLine::Horizontal(y) => {
                let start = ((y - 0.5) * scale).round() as u32;
                for py in start..(start + thickness).min(backing_h) {
                    for px in 0..backing_w {
                        layer.put_pixel(px, py, line);
                    }
                }
            }
        }
    }
    layer
}

/// The overlay layer, re-rendered whenever its spacing changes.
#[derive(Debug, Clone)]
pub struct Overlay {
    spacing: GridSpacing,
    width: u32,
    height: u32,
    scale: f64,
    layer: RgbaImage,
    /// Bumped on every re-render so views can tell the layer changed.
    revision: u64,
}

impl Default for Overlay {
    fn default() -> Self {
        Self::new(GridSpacing::default(), TILE_WIDTH, TILE_HEIGHT, 1.0)
    }
}

impl Overlay {
    pub fn new(spacing: GridSpacing, width: u32, height: u32, scale: f64) -> Self {
        Self {
            spacing,
            width,
            height,
            scale,
            layer: render_layer(spacing, width, height, scale),
            revision: 0,
        }
    }

    pub fn spacing(&self) -> GridSpacing {
        self.spacing
    }

    /// Change the spacing and re-render synchronously.
    pub fn set_spacing(&mut self, spacing: GridSpacing) {
        if spacing == self.spacing {
            return;
        }
        self.spacing = spacing;
        self.layer = render_layer(spacing, self.width, self.height, self.scale);
        self.revision += 1;
        log::debug!("Grid spacing set to {}", spacing);
    }

    /// Rendered layer at backing resolution.
    pub fn layer(&self) -> &RgbaImage {
        &self.layer
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}
