//! Text rasterization for the sign tool.

use ab_glyph::{Font, FontArc, ScaleFont, point};
use chrono::{DateTime, Local};
use std::path::Path;
use thiserror::Error;

/// Errors loading a font.
#[derive(Debug, Error)]
pub enum TextError {
    #[error("Failed to read font {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid font data: {0}")]
    InvalidFont(#[from] ab_glyph::InvalidFont),
}

/// Embedded DejaVu Sans, the default signature font.
static DEJAVU_SANS: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Turns text into per-pixel coverage.
///
/// `origin` is the left end of the alphabetic baseline in backing pixels.
/// `plot` receives backing-pixel coordinates and a coverage in `0.0..=1.0`.
pub trait TextRasterizer: Send + Sync {
    fn rasterize(&self, text: &str, size: f32, origin: (f32, f32), plot: &mut dyn FnMut(i64, i64, f32));
}

/// Outline font rendering via `ab_glyph`.
pub struct FontRasterizer {
    font: FontArc,
}

impl FontRasterizer {
    pub fn new(font: FontArc) -> Self {
        Self { font }
    }

    /// Load a TrueType/OpenType font file.
    pub fn from_file(path: &Path) -> Result<Self, TextError> {
        let bytes = std::fs::read(path).map_err(|source| TextError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::new(FontArc::try_from_vec(bytes)?))
    }

    /// The font bundled with the crate.
    pub fn embedded() -> Result<Self, TextError> {
        Ok(Self::new(FontArc::try_from_slice(DEJAVU_SANS)?))
    }
}

/// Pick the rasterizer for signatures.
///
/// A configured font file wins; otherwise the embedded font is used. Block
/// glyphs are the last resort when no font can be parsed.
pub fn load_rasterizer(font_path: Option<&Path>) -> Box<dyn TextRasterizer> {
    if let Some(path) = font_path {
        match FontRasterizer::from_file(path) {
            Ok(font) => return Box::new(font),
            Err(e) => log::warn!("{}; using the embedded font", e),
        }
    }
    match FontRasterizer::embedded() {
        Ok(font) => Box::new(font),
        Err(e) => {
            log::error!("Embedded font unreadable: {}", e);
            Box::new(BlockRasterizer)
        }
    }
}

impl TextRasterizer for FontRasterizer {
    fn rasterize(&self, text: &str, size: f32, origin: (f32, f32), plot: &mut dyn FnMut(i64, i64, f32)) {
        let scaled = self.font.as_scaled(size);
        let mut caret = origin.0;
        let mut previous = None;

        for ch in text.chars() {
            let id = self.font.glyph_id(ch);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(size, point(caret, origin.1));
            caret += scaled.h_advance(id);
            previous = Some(id);

            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|x, y, coverage| {
                    plot(
                        bounds.min.x as i64 + x as i64,
                        bounds.min.y as i64 + y as i64,
                        coverage,
                    );
                });
            }
        }
    }
}

/// Font-less fallback that draws one solid box per visible character.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockRasterizer;

impl TextRasterizer for BlockRasterizer {
    fn rasterize(&self, text: &str, size: f32, origin: (f32, f32), plot: &mut dyn FnMut(i64, i64, f32)) {
        let advance = size * 0.6;
        let glyph_w = (size * 0.45).round().max(1.0) as i64;
        let glyph_h = (size * 0.7).round().max(1.0) as i64;
        let baseline = origin.1.round() as i64;

        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let left = (origin.0 + i as f32 * advance).round() as i64;
            for y in (baseline - glyph_h)..baseline {
                for x in left..left + glyph_w {
                    plot(x, y, 1.0);
                }
            }
        }
    }
}

/// Format a timestamp the way the signature shows it, e.g. `1/2/2026, 3:04:05 PM`.
pub fn format_local_time(time: &DateTime<Local>) -> String {
    time.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

/// Text the sign tool stamps for the given signature.
pub fn signature_label(signature: &str, time: &DateTime<Local>) -> String {
    let signature = signature.trim();
    let name = if signature.is_empty() { "Signed" } else { signature };
    format!("{} — {}", name, format_local_time(time))
}
