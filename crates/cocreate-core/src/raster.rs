//! Pixel buffer for a single tile.
//!
//! Coordinates passed to a [`Raster`] are logical pixels. The backing store is
//! `logical * scale` pixels in each direction so that high-density displays get
//! a sharper tile; every drawing primitive converts into backing pixels itself.

use crate::codec::{self, CodecError};
use crate::tools::{Color, Composite};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use kurbo::Point;
use std::fmt;
use std::sync::Arc;

/// Nominal tile width in logical pixels.
pub const TILE_WIDTH: u32 = 900;
/// Nominal tile height in logical pixels.
pub const TILE_HEIGHT: u32 = 600;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// An immutable copy of raster pixels at a point in time.
#[derive(Clone, PartialEq)]
pub struct Snapshot(Arc<RgbaImage>);

impl Snapshot {
    /// Snapshot pixels in backing resolution.
    pub fn pixels(&self) -> &RgbaImage {
        &self.0
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("width", &self.0.width())
            .field("height", &self.0.height())
            .finish()
    }
}

/// The mutable pixel buffer of a tile (straight, non-premultiplied RGBA).
#[derive(Clone)]
pub struct Raster {
    width: u32,
    height: u32,
    scale: f64,
    pixels: RgbaImage,
}

impl fmt::Debug for Raster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("scale", &self.scale)
            .finish()
    }
}

impl Default for Raster {
    fn default() -> Self {
        Self::new(TILE_WIDTH, TILE_HEIGHT, 1.0)
    }
}

impl Raster {
    /// Create a fully transparent raster.
    ///
    /// Non-finite or non-positive scale factors fall back to 1.
    pub fn new(width: u32, height: u32, scale: f64) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let backing_w = scaled(width, scale);
        let backing_h = scaled(height, scale);
        Self {
            width,
            height,
            scale,
            pixels: RgbaImage::new(backing_w, backing_h),
        }
    }

    /// Logical width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Logical height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Device scale factor baked into the backing store.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Backing-store pixels.
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Whether every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.pixels.pixels().all(|p| p[3] == 0)
    }

    /// Erase every pixel to fully transparent.
    pub fn clear(&mut self) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = TRANSPARENT;
        }
    }

    /// Copy the current pixels into a snapshot.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(Arc::new(self.pixels.clone()))
    }

    /// Repaint from a snapshot.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.replace_pixels(snapshot.pixels().clone());
    }

    /// Replace the whole backing store, resampling images of another size.
    pub fn replace_pixels(&mut self, image: RgbaImage) {
        self.pixels = if image.dimensions() == self.pixels.dimensions() {
            image
        } else {
            imageops::resize(&image, self.pixels.width(), self.pixels.height(), FilterType::Triangle)
        };
    }

    /// Encode the backing store as a PNG data URL.
    pub fn encode(&self) -> Result<String, CodecError> {
        codec::encode_data_url(&self.pixels)
    }

    /// Rasterize a straight segment with round caps.
    ///
    /// Consecutive segments of a stroke overlap in their caps, which gives
    /// round joins.
    pub fn stroke_segment(
        &mut self,
        from: Point,
        to: Point,
        width: f64,
        color: Color,
        composite: Composite,
    ) {
        let a = Point::new(from.x * self.scale, from.y * self.scale);
        let b = Point::new(to.x * self.scale, to.y * self.scale);
        let radius = (width * self.scale / 2.0).max(0.5);

        let min_x = (a.x.min(b.x) - radius - 1.0).floor().max(0.0) as i64;
        let min_y = (a.y.min(b.y) - radius - 1.0).floor().max(0.0) as i64;
        let max_x = ((a.x.max(b.x) + radius + 1.0).ceil() as i64).min(self.pixels.width() as i64 - 1);
        let max_y = ((a.y.max(b.y) + radius + 1.0).ceil() as i64).min(self.pixels.height() as i64 - 1);

        let src = color.to_rgba(255);
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let coverage = (radius + 0.5 - distance_to_segment(center, a, b)).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(x, y, src, coverage as f32, composite);
                }
            }
        }
    }

    /// Composite an image at a logical position with the given opacity.
    ///
    /// The image is in logical resolution and is scaled to the backing store.
    pub fn draw_image(&mut self, image: &RgbaImage, x: i64, y: i64, opacity: f32) {
        let scaled_image;
        let source = if self.scale == 1.0 {
            image
        } else {
            scaled_image = imageops::resize(
                image,
                scaled(image.width(), self.scale),
                scaled(image.height(), self.scale),
                FilterType::Nearest,
            );
            &scaled_image
        };
        let origin_x = (x as f64 * self.scale).round() as i64;
        let origin_y = (y as f64 * self.scale).round() as i64;

        for (sx, sy, pixel) in source.enumerate_pixels() {
            if pixel[3] == 0 {
                continue;
            }
            self.blend(origin_x + sx as i64, origin_y + sy as i64, *pixel, opacity, Composite::SourceOver);
        }
    }

    /// Copy a logical rectangle out of the raster at nominal resolution.
    ///
    /// The rectangle is clamped to the raster bounds.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> RgbaImage {
        let x = x.min(self.width);
        let y = y.min(self.height);
        let width = width.min(self.width - x);
        let height = height.min(self.height - y);

        let region = imageops::crop_imm(
            &self.pixels,
            scaled_floor(x, self.scale),
            scaled_floor(y, self.scale),
            scaled(width, self.scale),
            scaled(height, self.scale),
        )
        .to_image();

        if region.dimensions() == (width, height) {
            region
        } else {
            imageops::resize(&region, width, height, FilterType::Nearest)
        }
    }

    /// Blend one source pixel into the backing store. Out-of-bounds writes are dropped.
    pub(crate) fn blend(&mut self, x: i64, y: i64, src: Rgba<u8>, coverage: f32, composite: Composite) {
        if x < 0 || y < 0 || x >= self.pixels.width() as i64 || y >= self.pixels.height() as i64 {
            return;
        }
        let dst = self.pixels.get_pixel_mut(x as u32, y as u32);
        *dst = composite_pixel(*dst, src, coverage, composite);
    }
}

fn scaled(value: u32, scale: f64) -> u32 {
    ((value as f64 * scale).round() as u32).max(1)
}

fn scaled_floor(value: u32, scale: f64) -> u32 {
    (value as f64 * scale).floor() as u32
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.hypot2();
    if len_sq == 0.0 {
        return (p - a).hypot();
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).hypot()
}

/// Porter-Duff compositing on straight-alpha pixels.
fn composite_pixel(dst: Rgba<u8>, src: Rgba<u8>, coverage: f32, composite: Composite) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0 * coverage.clamp(0.0, 1.0);
    let da = dst[3] as f32 / 255.0;

    match composite {
        Composite::SourceOver => {
            let out_a = sa + da * (1.0 - sa);
            if out_a <= 0.0 {
                return TRANSPARENT;
            }
            let channel = |i: usize| {
                let value = (src[i] as f32 * sa + dst[i] as f32 * da * (1.0 - sa)) / out_a;
                value.round().clamp(0.0, 255.0) as u8
            };
            Rgba([channel(0), channel(1), channel(2), to_u8(out_a)])
        }
        Composite::DestinationOut => {
            let out_a = da * (1.0 - sa);
            let alpha = to_u8(out_a);
            if alpha == 0 {
                TRANSPARENT
            } else {
                Rgba([dst[0], dst[1], dst[2], alpha])
            }
        }
    }
}

fn to_u8(unit: f32) -> u8 {
    (unit * 255.0).round().clamp(0.0, 255.0) as u8
}
