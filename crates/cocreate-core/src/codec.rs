//! PNG data-URL encoding for rasters and edge strips.

use base64::{Engine, engine::general_purpose::STANDARD};
use image::RgbaImage;
use thiserror::Error;

/// Prefix shared by every encoded image string.
pub const DATA_URL_PREFIX: &str = "data:image";

/// Prefix of the PNG data URLs this crate produces.
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Errors raised while encoding or decoding image strings.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Not an image data URL")]
    NotDataUrl,
    #[error("Data URL is not base64 encoded")]
    NotBase64,
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] png::EncodingError),
    #[error("Image decoding failed: {0}")]
    Decode(#[from] image::ImageError),
}

/// Encode RGBA pixels as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, CodecError> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, image.width(), image.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(image.as_raw())?;
        writer.finish()?;
    }
    Ok(png_data)
}

/// Encode RGBA pixels as a `data:image/png;base64,...` string.
pub fn encode_data_url(image: &RgbaImage) -> Result<String, CodecError> {
    let bytes = encode_png(image)?;
    Ok(format!("{}{}", PNG_DATA_URL_PREFIX, STANDARD.encode(bytes)))
}

/// Decode any `data:image/*;base64,...` string into RGBA pixels.
pub fn decode_data_url(url: &str) -> Result<RgbaImage, CodecError> {
    let url = url.trim();
    if !url.starts_with(DATA_URL_PREFIX) {
        return Err(CodecError::NotDataUrl);
    }
    let (header, payload) = url.split_once(',').ok_or(CodecError::NotDataUrl)?;
    if !header.ends_with(";base64") {
        return Err(CodecError::NotBase64);
    }
    let bytes = STANDARD.decode(payload)?;
    decode_bytes(&bytes)
}

/// Decode raw image bytes (PNG, JPEG or WebP) into RGBA pixels.
pub fn decode_bytes(bytes: &[u8]) -> Result<RgbaImage, CodecError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}
